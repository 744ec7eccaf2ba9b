//! stemrender CLI - render math in JSON document trees

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use stemrender::equation::normalize::normalize;
use stemrender::render::{from_json, to_json};
use stemrender::{
    CommandEngine, Dialect, Document, InlineScanner, JsonFormat, OutputFormat, ProcessOptions,
    StemRender,
};

#[derive(Parser)]
#[command(name = "stemrender")]
#[command(version)]
#[command(about = "Render math in document trees to images and markup", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the math in a JSON document tree
    Process {
        /// Input JSON tree ("-" for stdin)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Raster resolution
        #[arg(long)]
        ppi: Option<f64>,

        /// Embed rendered markup instead of referencing files
        #[arg(long)]
        inline: bool,

        /// Images directory
        #[arg(long, value_name = "DIR")]
        imagesdir: Option<PathBuf>,

        /// Images output directory
        #[arg(long, value_name = "DIR")]
        imagesoutdir: Option<PathBuf>,

        /// Output root
        #[arg(long, value_name = "DIR")]
        outdir: Option<PathBuf>,

        /// Engine program (reads LaTeX on stdin, writes the artifact to stdout)
        #[arg(long, env = "STEMRENDER_ENGINE", value_name = "PROGRAM")]
        engine: Option<String>,

        /// Engine argument; {format} and {ppi} are expanded
        #[arg(long = "engine-arg", value_name = "ARG", allow_hyphen_values = true)]
        engine_args: Vec<String>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// List the inline macros in a text
    Scan {
        /// Text to scan ("-" for stdin)
        #[arg(value_name = "TEXT")]
        text: String,

        /// Dialect of the generic stem macro
        #[arg(long, value_enum, default_value = "asciimath")]
        stem: DialectArg,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved configuration for a tree
    Info {
        /// Input JSON tree ("-" for stdin)
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Raster images
    Png,
    /// Vector images
    Svg,
    /// Embedded markup
    Mathml,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Svg => OutputFormat::Svg,
            FormatArg::Mathml => OutputFormat::MathMl,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum DialectArg {
    /// LaTeX
    Latexmath,
    /// AsciiMath
    Asciimath,
}

impl From<DialectArg> for Dialect {
    fn from(dialect: DialectArg) -> Self {
        match dialect {
            DialectArg::Latexmath => Dialect::Latex,
            DialectArg::Asciimath => Dialect::AsciiMath,
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process {
            input,
            output,
            format,
            ppi,
            inline,
            imagesdir,
            imagesoutdir,
            outdir,
            engine,
            engine_args,
            compact,
        } => {
            let mut builder = StemRender::new();
            if let Some(format) = format {
                builder = builder.with_format(format.into());
            }
            if let Some(ppi) = ppi {
                builder = builder.with_ppi(ppi);
            }
            if inline {
                builder = builder.with_inline(true);
            }
            if let Some(dir) = imagesdir {
                builder = builder.with_imagesdir(dir);
            }
            if let Some(dir) = imagesoutdir {
                builder = builder.with_imagesoutdir(dir);
            }
            if let Some(dir) = outdir {
                builder = builder.with_outdir(dir);
            }
            cmd_process(
                &input,
                output.as_deref(),
                builder,
                engine,
                engine_args,
                compact,
            )
        }
        Commands::Scan { text, stem, json } => cmd_scan(&text, stem.into(), json),
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn read_input(input: &Path) -> io::Result<String> {
    if input.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(input)
    }
}

fn read_document(input: &Path) -> Result<Document, Box<dyn std::error::Error>> {
    let json = read_input(input)?;
    Ok(from_json(&json)?)
}

fn cmd_process(
    input: &Path,
    output: Option<&Path>,
    builder: StemRender,
    engine: Option<String>,
    engine_args: Vec<String>,
    compact: bool,
) -> CliResult {
    let program = engine.ok_or("no engine given; use --engine or STEMRENDER_ENGINE")?;
    let engine = CommandEngine::new(program).args(engine_args);

    let mut doc = read_document(input)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Rendering equations...");

    let report = builder.run(&mut doc, &engine)?;
    pb.finish_and_clear();

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = to_json(&doc, format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        eprintln!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    eprintln!("{} {}", "Done:".green().bold(), report);
    if report.has_failures() {
        for failure in &report.failures {
            eprintln!("  {} {}", "✗".red(), failure);
        }
        return Err(stemrender::Error::EquationsFailed(report.failures).into());
    }

    Ok(())
}

fn cmd_scan(text: &str, dialect: Dialect, json: bool) -> CliResult {
    let text = if text == "-" {
        read_input(Path::new("-"))?
    } else {
        text.to_string()
    };

    let scanner = InlineScanner::new(dialect);
    let found = scanner.scan(&text);

    if json {
        let entries: Vec<serde_json::Value> = found
            .iter()
            .map(|expr| {
                let latex = (!expr.escaped && !expr.is_blank())
                    .then(|| normalize(&expr.payload, expr.dialect, true).input);
                serde_json::json!({
                    "macro": expr.kind,
                    "dialect": expr.dialect,
                    "payload": expr.payload,
                    "subs": expr.subs,
                    "escaped": expr.escaped,
                    "start": expr.span.start,
                    "end": expr.span.end,
                    "latex": latex,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if found.is_empty() {
        println!("{}", "No inline math found".yellow());
        return Ok(());
    }

    for expr in &found {
        let location = format!("{}..{}", expr.span.start, expr.span.end).dimmed();
        if expr.escaped {
            println!("{} {} {}", location, "escaped".yellow(), expr.payload);
        } else if expr.is_blank() {
            println!("{} {}", location, "empty".yellow());
        } else {
            let equation = normalize(&expr.payload, expr.dialect, true);
            println!(
                "{} {} {}",
                location,
                expr.dialect.name().cyan(),
                equation.input
            );
        }
    }

    Ok(())
}

fn cmd_info(input: &Path) -> CliResult {
    let doc = read_document(input)?;
    let options = ProcessOptions::from_document(&doc);
    let location = options.location()?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Blocks".bold(), doc.total_blocks());
    println!("{}: {}", "Candidate nodes".bold(), stemrender::process::collect(&doc).len());

    println!();
    println!("{}", "Configuration".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Dialect".bold(), options.default_dialect.name());
    println!("{}: {}", "Format".bold(), options.format);
    println!("{}: {}", "PPI".bold(), options.effective_ppi());
    println!(
        "{}: {}",
        "Inline".bold(),
        if options.inline { "Yes" } else { "No" }
    );
    println!("{}: {}", "Output dir".bold(), location.output_dir.display());
    println!("{}: {}", "Target prefix".bold(), location.target_prefix);

    for warning in options.warnings() {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "stemrender".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Math rendering for document trees");
    println!();
    println!("License: MIT");
}
