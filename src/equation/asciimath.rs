//! AsciiMath to LaTeX translation.
//!
//! A tokenizer with longest-match symbol lookup feeds a recursive-descent parser
//! over the AsciiMath grammar:
//!
//! ```text
//! E ::= I E | I / I          expression
//! I ::= S | S_S | S^S | S_S^S
//! S ::= v | l E r | u S | b S S | "text"
//! ```
//!
//! LaTeX output braces script and fraction arguments only when they render to more
//! than one character, so `x^2` stays `x^2` and `x^10` becomes `x^{10}`.

/// Translate an AsciiMath expression to LaTeX.
///
/// Translation never fails: unknown characters are copied through (escaped where
/// LaTeX requires it) and unbalanced brackets are closed with `\right.`.
///
/// # Example
///
/// ```
/// use stemrender::equation::asciimath::to_latex;
///
/// assert_eq!(to_latex("x^2"), "x^2");
/// assert_eq!(to_latex("sum_(i=1)^n"), "\\sum_{i=1}^n");
/// assert_eq!(to_latex("(a+b)/c"), "\\frac{a+b}{c}");
/// ```
pub fn to_latex(input: &str) -> String {
    let mut parser = Parser::new(input);
    let nodes = parser.parse_list(false);
    let mut out = LatexWriter::default();
    for node in &nodes {
        emit(node, &mut out);
    }
    out.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Const,
    LeftBracket,
    RightBracket,
    /// `\cmd{x}`
    Unary,
    /// `\left<open> x \right<close>`
    Wrap(&'static str, &'static str),
    /// `\text{raw}`
    TextCommand,
    /// `\cmd{a}{b}`
    Binary,
    /// `\sqrt[a]{b}`
    Root,
    /// `{\color{a}b}`
    Color,
    Sub,
    Sup,
    Divide,
}

#[derive(Debug)]
struct Symbol {
    input: &'static str,
    latex: &'static str,
    kind: Kind,
}

const fn sym(input: &'static str, latex: &'static str, kind: Kind) -> Symbol {
    Symbol { input, latex, kind }
}

const fn c(input: &'static str, latex: &'static str) -> Symbol {
    sym(input, latex, Kind::Const)
}

static SYMBOLS: &[Symbol] = &[
    // greek
    c("alpha", "\\alpha"),
    c("beta", "\\beta"),
    c("gamma", "\\gamma"),
    c("Gamma", "\\Gamma"),
    c("delta", "\\delta"),
    c("Delta", "\\Delta"),
    c("epsilon", "\\epsilon"),
    c("varepsilon", "\\varepsilon"),
    c("zeta", "\\zeta"),
    c("eta", "\\eta"),
    c("theta", "\\theta"),
    c("Theta", "\\Theta"),
    c("vartheta", "\\vartheta"),
    c("iota", "\\iota"),
    c("kappa", "\\kappa"),
    c("lambda", "\\lambda"),
    c("Lambda", "\\Lambda"),
    c("mu", "\\mu"),
    c("nu", "\\nu"),
    c("xi", "\\xi"),
    c("Xi", "\\Xi"),
    c("pi", "\\pi"),
    c("Pi", "\\Pi"),
    c("rho", "\\rho"),
    c("sigma", "\\sigma"),
    c("Sigma", "\\Sigma"),
    c("tau", "\\tau"),
    c("upsilon", "\\upsilon"),
    c("phi", "\\phi"),
    c("Phi", "\\Phi"),
    c("varphi", "\\varphi"),
    c("chi", "\\chi"),
    c("psi", "\\psi"),
    c("Psi", "\\Psi"),
    c("omega", "\\omega"),
    c("Omega", "\\Omega"),
    // operators
    c("+", "+"),
    c("-", "-"),
    c("*", "\\cdot"),
    c("**", "\\ast"),
    c("***", "\\star"),
    c("//", "/"),
    c("\\\\", "\\backslash"),
    c("\\", "\\backslash"),
    c("\\ ", "\\ "),
    c("setminus", "\\setminus"),
    c("xx", "\\times"),
    c("|><", "\\ltimes"),
    c("><|", "\\rtimes"),
    c("|><|", "\\bowtie"),
    c("-:", "\\div"),
    c("divide", "\\div"),
    c("@", "\\circ"),
    c("o+", "\\oplus"),
    c("ox", "\\otimes"),
    c("o.", "\\odot"),
    c("sum", "\\sum"),
    c("prod", "\\prod"),
    c("^^", "\\wedge"),
    c("^^^", "\\bigwedge"),
    c("vv", "\\vee"),
    c("vvv", "\\bigvee"),
    c("nn", "\\cap"),
    c("nnn", "\\bigcap"),
    c("uu", "\\cup"),
    c("uuu", "\\bigcup"),
    // relations
    c("=", "="),
    c("!=", "\\ne"),
    c(":=", ":="),
    c("<", "<"),
    c("lt", "<"),
    c(">", ">"),
    c("gt", ">"),
    c("<=", "\\le"),
    c("le", "\\le"),
    c(">=", "\\ge"),
    c("ge", "\\ge"),
    c("mlt", "\\ll"),
    c("mgt", "\\gg"),
    c("-<", "\\prec"),
    c("-<=", "\\preceq"),
    c(">-", "\\succ"),
    c(">-=", "\\succeq"),
    c("in", "\\in"),
    c("!in", "\\notin"),
    c("sub", "\\subset"),
    c("sup", "\\supset"),
    c("sube", "\\subseteq"),
    c("supe", "\\supseteq"),
    c("-=", "\\equiv"),
    c("~=", "\\cong"),
    c("~~", "\\approx"),
    c("~", "\\sim"),
    c("prop", "\\propto"),
    // logic
    c("and", "\\text{ and }"),
    c("or", "\\text{ or }"),
    c("not", "\\neg"),
    c("=>", "\\Rightarrow"),
    c("if", "\\text{ if }"),
    c("<=>", "\\Leftrightarrow"),
    c("AA", "\\forall"),
    c("EE", "\\exists"),
    c("_|_", "\\bot"),
    c("TT", "\\top"),
    c("|--", "\\vdash"),
    c("|==", "\\models"),
    // miscellaneous
    c("int", "\\int"),
    c("oint", "\\oint"),
    c("del", "\\partial"),
    c("grad", "\\nabla"),
    c("+-", "\\pm"),
    c("-+", "\\mp"),
    c("O/", "\\emptyset"),
    c("oo", "\\infty"),
    c("aleph", "\\aleph"),
    c("...", "\\ldots"),
    c(":.", "\\therefore"),
    c(":'", "\\because"),
    c("/_", "\\angle"),
    c("/_\\", "\\triangle"),
    c("'", "'"),
    c("quad", "\\quad"),
    c("qquad", "\\qquad"),
    c("cdots", "\\cdots"),
    c("vdots", "\\vdots"),
    c("ddots", "\\ddots"),
    c("diamond", "\\diamond"),
    c("square", "\\square"),
    c("|__", "\\lfloor"),
    c("__|", "\\rfloor"),
    c("|~", "\\lceil"),
    c("~|", "\\rceil"),
    c("CC", "\\mathbb{C}"),
    c("NN", "\\mathbb{N}"),
    c("QQ", "\\mathbb{Q}"),
    c("RR", "\\mathbb{R}"),
    c("ZZ", "\\mathbb{Z}"),
    c("%", "\\%"),
    c("#", "\\#"),
    c("&", "\\&"),
    c("$", "\\$"),
    // functions
    c("sin", "\\sin"),
    c("cos", "\\cos"),
    c("tan", "\\tan"),
    c("sec", "\\sec"),
    c("csc", "\\csc"),
    c("cot", "\\cot"),
    c("arcsin", "\\arcsin"),
    c("arccos", "\\arccos"),
    c("arctan", "\\arctan"),
    c("sinh", "\\sinh"),
    c("cosh", "\\cosh"),
    c("tanh", "\\tanh"),
    c("sech", "\\operatorname{sech}"),
    c("csch", "\\operatorname{csch}"),
    c("coth", "\\coth"),
    c("exp", "\\exp"),
    c("log", "\\log"),
    c("ln", "\\ln"),
    c("det", "\\det"),
    c("dim", "\\dim"),
    c("mod", "\\operatorname{mod}"),
    c("gcd", "\\gcd"),
    c("lcm", "\\operatorname{lcm}"),
    c("lub", "\\operatorname{lub}"),
    c("glb", "\\operatorname{glb}"),
    c("min", "\\min"),
    c("max", "\\max"),
    c("lim", "\\lim"),
    c("Lim", "\\operatorname{Lim}"),
    // arrows
    c("uarr", "\\uparrow"),
    c("darr", "\\downarrow"),
    c("rarr", "\\rightarrow"),
    c("->", "\\to"),
    c(">->", "\\rightarrowtail"),
    c("->>", "\\twoheadrightarrow"),
    c(">->>", "\\twoheadrightarrowtail"),
    c("|->", "\\mapsto"),
    c("larr", "\\leftarrow"),
    c("harr", "\\leftrightarrow"),
    c("rArr", "\\Rightarrow"),
    c("lArr", "\\Leftarrow"),
    c("hArr", "\\Leftrightarrow"),
    // brackets
    sym("(", "(", Kind::LeftBracket),
    sym("[", "[", Kind::LeftBracket),
    sym("{", "\\{", Kind::LeftBracket),
    sym("(:", "\\langle", Kind::LeftBracket),
    sym("<<", "\\langle", Kind::LeftBracket),
    sym("{:", "", Kind::LeftBracket),
    sym(")", ")", Kind::RightBracket),
    sym("]", "]", Kind::RightBracket),
    sym("}", "\\}", Kind::RightBracket),
    sym(":)", "\\rangle", Kind::RightBracket),
    sym(">>", "\\rangle", Kind::RightBracket),
    sym(":}", "", Kind::RightBracket),
    // unary
    sym("sqrt", "\\sqrt", Kind::Unary),
    sym("hat", "\\hat", Kind::Unary),
    sym("bar", "\\overline", Kind::Unary),
    sym("overline", "\\overline", Kind::Unary),
    sym("ul", "\\underline", Kind::Unary),
    sym("underline", "\\underline", Kind::Unary),
    sym("vec", "\\vec", Kind::Unary),
    sym("dot", "\\dot", Kind::Unary),
    sym("ddot", "\\ddot", Kind::Unary),
    sym("tilde", "\\tilde", Kind::Unary),
    sym("ubrace", "\\underbrace", Kind::Unary),
    sym("obrace", "\\overbrace", Kind::Unary),
    sym("cancel", "\\cancel", Kind::Unary),
    sym("bb", "\\mathbf", Kind::Unary),
    sym("bbb", "\\mathbb", Kind::Unary),
    sym("cc", "\\mathcal", Kind::Unary),
    sym("tt", "\\mathtt", Kind::Unary),
    sym("fr", "\\mathfrak", Kind::Unary),
    sym("sf", "\\mathsf", Kind::Unary),
    sym("abs", "", Kind::Wrap("|", "|")),
    sym("norm", "", Kind::Wrap("\\|", "\\|")),
    sym("floor", "", Kind::Wrap("\\lfloor", "\\rfloor")),
    sym("ceil", "", Kind::Wrap("\\lceil", "\\rceil")),
    sym("text", "\\text", Kind::TextCommand),
    sym("mbox", "\\text", Kind::TextCommand),
    // binary
    sym("frac", "\\frac", Kind::Binary),
    sym("stackrel", "\\stackrel", Kind::Binary),
    sym("overset", "\\overset", Kind::Binary),
    sym("underset", "\\underset", Kind::Binary),
    sym("root", "\\sqrt", Kind::Root),
    sym("color", "\\color", Kind::Color),
    // scripts
    sym("_", "\\_", Kind::Sub),
    sym("^", "\\hat{}", Kind::Sup),
    sym("/", "/", Kind::Divide),
];

fn lookup(rest: &str) -> Option<&'static Symbol> {
    SYMBOLS
        .iter()
        .filter(|s| rest.starts_with(s.input))
        .max_by_key(|s| s.input.len())
}

#[derive(Debug, Clone, Copy)]
enum Token<'a> {
    Symbol(&'static Symbol),
    Number(&'a str),
    Letter(&'a str),
    Text(&'a str),
    Other(&'a str),
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn skip_whitespace(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Consume the rest of the source unparsed.
    fn take_rest(&mut self) -> &'a str {
        let rest = self.src[self.pos..].trim();
        self.pos = self.src.len();
        rest
    }

    fn peek(&mut self) -> Option<Token<'a>> {
        let saved = self.pos;
        let token = self.next_token();
        self.pos = saved;
        token
    }

    fn next_token(&mut self) -> Option<Token<'a>> {
        self.skip_whitespace();
        let rest = &self.src[self.pos..];
        let first = rest.chars().next()?;

        if first == '"' {
            let body = &rest[1..];
            let len = body.find('"').unwrap_or(body.len());
            self.pos += 1 + len + usize::from(len < body.len());
            return Some(Token::Text(&body[..len]));
        }

        if first.is_ascii_digit() {
            let len = number_len(rest);
            self.pos += len;
            return Some(Token::Number(&rest[..len]));
        }

        if let Some(symbol) = lookup(rest) {
            self.pos += symbol.input.len();
            return Some(Token::Symbol(symbol));
        }

        let len = first.len_utf8();
        self.pos += len;
        if first.is_alphabetic() {
            Some(Token::Letter(&rest[..len]))
        } else {
            Some(Token::Other(&rest[..len]))
        }
    }

    /// Take the raw source of a parenthesized group, e.g. the argument of `text(...)`.
    fn raw_group(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let rest = &self.src[self.pos..];
        if !rest.starts_with('(') {
            return None;
        }
        let mut depth = 0usize;
        for (i, ch) in rest.char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += i + 1;
                        return Some(&rest[1..i]);
                    }
                }
                _ => {}
            }
        }
        self.pos = self.src.len();
        Some(&rest[1..])
    }
}

fn number_len(s: &str) -> usize {
    let digits = |s: &str| s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let int_len = digits(s);
    let rest = &s[int_len..];
    if rest.starts_with('.') {
        let frac_len = digits(&rest[1..]);
        if frac_len > 0 {
            return int_len + 1 + frac_len;
        }
    }
    int_len
}

#[derive(Debug, Clone)]
enum Node<'a> {
    Atom(&'a str),
    Text(&'a str),
    Group {
        open: &'static str,
        close: Option<&'static str>,
        body: Vec<Node<'a>>,
    },
    Matrix {
        open: &'static str,
        close: &'static str,
        rows: Vec<Vec<Vec<Node<'a>>>>,
    },
    Unary {
        symbol: &'static Symbol,
        arg: Box<Node<'a>>,
    },
    Binary {
        symbol: &'static Symbol,
        first: Box<Node<'a>>,
        second: Box<Node<'a>>,
    },
    Script {
        base: Box<Node<'a>>,
        sub: Option<Box<Node<'a>>>,
        sup: Option<Box<Node<'a>>>,
    },
    Fraction {
        num: Box<Node<'a>>,
        den: Box<Node<'a>>,
    },
}

impl Node<'_> {
    fn is_comma(&self) -> bool {
        matches!(self, Node::Atom(","))
    }
}

/// Deepest nesting the parser descends into; anything below is kept as written.
const MAX_DEPTH: usize = 128;

struct Parser<'a> {
    lexer: Lexer<'a>,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            lexer: Lexer { src, pos: 0 },
            depth: 0,
        }
    }

    /// E ::= I E | I / I
    fn parse_list(&mut self, in_group: bool) -> Vec<Node<'a>> {
        let mut nodes = Vec::new();
        while let Some(token) = self.lexer.peek() {
            if let Token::Symbol(s) = token {
                if s.kind == Kind::RightBracket {
                    if in_group {
                        break;
                    }
                    self.lexer.next_token();
                    nodes.push(Node::Atom(s.latex));
                    continue;
                }
            }

            let mut node = self.parse_intermediate();
            if let Some(Token::Symbol(s)) = self.lexer.peek() {
                if s.kind == Kind::Divide {
                    self.lexer.next_token();
                    let den = self.parse_intermediate();
                    node = Node::Fraction {
                        num: Box::new(node),
                        den: Box::new(den),
                    };
                }
            }
            nodes.push(node);
        }
        nodes
    }

    /// I ::= S | S_S | S^S | S_S^S
    fn parse_intermediate(&mut self) -> Node<'a> {
        let base = self.parse_simple();
        let mut sub = None;
        let mut sup = None;

        if self.next_is(Kind::Sub) {
            self.lexer.next_token();
            sub = Some(Box::new(self.parse_simple()));
        }
        if self.next_is(Kind::Sup) {
            self.lexer.next_token();
            sup = Some(Box::new(self.parse_simple()));
        }
        if sup.is_some() && sub.is_none() && self.next_is(Kind::Sub) {
            self.lexer.next_token();
            sub = Some(Box::new(self.parse_simple()));
        }

        if sub.is_none() && sup.is_none() {
            base
        } else {
            Node::Script {
                base: Box::new(base),
                sub,
                sup,
            }
        }
    }

    fn next_is(&mut self, kind: Kind) -> bool {
        matches!(self.lexer.peek(), Some(Token::Symbol(s)) if s.kind == kind)
    }

    /// S ::= v | l E r | u S | b S S | "text"
    fn parse_simple(&mut self) -> Node<'a> {
        if self.depth >= MAX_DEPTH {
            return Node::Atom(self.lexer.take_rest());
        }
        self.depth += 1;
        let node = self.parse_token();
        self.depth -= 1;
        node
    }

    fn parse_token(&mut self) -> Node<'a> {
        let Some(token) = self.lexer.next_token() else {
            return Node::Atom("");
        };

        match token {
            Token::Number(n) | Token::Letter(n) => Node::Atom(n),
            Token::Other(o) => Node::Atom(o),
            Token::Text(t) => Node::Text(t),
            Token::Symbol(symbol) => match symbol.kind {
                Kind::LeftBracket => self.parse_group(symbol),
                Kind::TextCommand => match self.lexer.raw_group() {
                    Some(raw) => Node::Unary {
                        symbol,
                        arg: Box::new(Node::Text(raw)),
                    },
                    None => Node::Unary {
                        symbol,
                        arg: Box::new(self.parse_simple()),
                    },
                },
                Kind::Unary | Kind::Wrap(..) => Node::Unary {
                    symbol,
                    arg: Box::new(self.parse_simple()),
                },
                Kind::Binary | Kind::Root | Kind::Color => {
                    let first = self.parse_simple();
                    let second = self.parse_simple();
                    Node::Binary {
                        symbol,
                        first: Box::new(first),
                        second: Box::new(second),
                    }
                }
                Kind::Const | Kind::RightBracket | Kind::Sub | Kind::Sup | Kind::Divide => {
                    Node::Atom(symbol.latex)
                }
            },
        }
    }

    fn parse_group(&mut self, open: &'static Symbol) -> Node<'a> {
        let body = self.parse_list(true);
        let close = match self.lexer.next_token() {
            Some(Token::Symbol(s)) if s.kind == Kind::RightBracket => Some(s.latex),
            _ => None,
        };

        if let Some(close) = close {
            if let Some(rows) = matrix_rows(&body) {
                return Node::Matrix {
                    open: open.latex,
                    close,
                    rows,
                };
            }
        }

        Node::Group {
            open: open.latex,
            close,
            body,
        }
    }
}

/// Recognize `[(a,b),(c,d)]`: two or more bracketed rows separated by commas,
/// each with the same number of comma-separated cells.
fn matrix_rows<'a>(body: &[Node<'a>]) -> Option<Vec<Vec<Vec<Node<'a>>>>> {
    let mut rows = Vec::new();
    for (i, node) in body.iter().enumerate() {
        if i % 2 == 1 {
            if !node.is_comma() {
                return None;
            }
            continue;
        }
        match node {
            Node::Group {
                open,
                close: Some(_),
                body: row,
            } if *open == "(" || *open == "[" => {
                let cells: Vec<Vec<Node<'a>>> = row
                    .split(|n| n.is_comma())
                    .map(|cell| cell.to_vec())
                    .collect();
                rows.push(cells);
            }
            _ => return None,
        }
    }

    let columns = rows.first()?.len();
    if rows.len() < 2 || body.len() % 2 == 0 || rows.iter().any(|r| r.len() != columns) {
        return None;
    }
    Some(rows)
}

/// Accumulates LaTeX, separating a control word from a following letter.
#[derive(Default)]
struct LatexWriter {
    out: String,
}

impl LatexWriter {
    fn push(&mut self, piece: &str) {
        if piece.is_empty() {
            return;
        }
        let starts_with_letter = piece.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        if starts_with_letter && ends_with_control_word(&self.out) {
            self.out.push(' ');
        }
        self.out.push_str(piece);
    }

    fn finish(self) -> String {
        self.out
    }
}

fn ends_with_control_word(s: &str) -> bool {
    let trimmed = s.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    trimmed.len() < s.len() && trimmed.ends_with('\\') && !trimmed.ends_with("\\\\")
}

fn render(node: &Node<'_>) -> String {
    let mut out = LatexWriter::default();
    emit(node, &mut out);
    out.finish()
}

/// Render an argument, dropping one level of enclosing brackets.
fn render_arg(node: &Node<'_>) -> String {
    match node {
        Node::Group {
            open,
            close: Some(_),
            body,
        } if matches!(*open, "(" | "[" | "\\{") => {
            let mut out = LatexWriter::default();
            for child in body {
                emit(child, &mut out);
            }
            out.finish()
        }
        other => render(other),
    }
}

fn script_arg(node: &Node<'_>) -> String {
    let arg = render_arg(node);
    if arg.chars().count() == 1 {
        arg
    } else {
        format!("{{{}}}", arg)
    }
}

fn emit(node: &Node<'_>, out: &mut LatexWriter) {
    match node {
        Node::Atom(a) => out.push(a),
        Node::Text(t) => out.push(&format!("\\text{{{}}}", t)),
        Node::Group { open, close, body } => {
            let visible = !open.is_empty() || close.is_some_and(|c| !c.is_empty());
            if visible {
                out.push(&format!("\\left{}", delimiter(open)));
            }
            for child in body {
                emit(child, out);
            }
            if visible {
                out.push(&format!("\\right{}", delimiter(close.unwrap_or(""))));
            }
        }
        Node::Matrix { open, close, rows } => {
            let body = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| {
                            let mut w = LatexWriter::default();
                            for n in cell {
                                emit(n, &mut w);
                            }
                            w.finish()
                        })
                        .collect::<Vec<_>>()
                        .join(" & ")
                })
                .collect::<Vec<_>>()
                .join(" \\\\ ");
            match (*open, *close) {
                ("(", ")") => out.push(&format!("\\begin{{pmatrix}} {} \\end{{pmatrix}}", body)),
                ("[", "]") => out.push(&format!("\\begin{{bmatrix}} {} \\end{{bmatrix}}", body)),
                _ => out.push(&format!(
                    "\\left{}\\begin{{matrix}} {} \\end{{matrix}}\\right{}",
                    delimiter(open),
                    body,
                    delimiter(close)
                )),
            }
        }
        Node::Unary { symbol, arg } => match symbol.kind {
            Kind::Wrap(open, close) => {
                out.push(&format!("\\left{}{}\\right{}", open, render_arg(arg), close))
            }
            Kind::TextCommand => {
                let text = match arg.as_ref() {
                    Node::Text(raw) => raw.to_string(),
                    other => render_arg(other),
                };
                out.push(&format!("{}{{{}}}", symbol.latex, text));
            }
            _ => out.push(&format!("{}{{{}}}", symbol.latex, render_arg(arg))),
        },
        Node::Binary {
            symbol,
            first,
            second,
        } => match symbol.kind {
            Kind::Root => out.push(&format!(
                "\\sqrt[{}]{{{}}}",
                render_arg(first),
                render_arg(second)
            )),
            Kind::Color => out.push(&format!(
                "{{\\color{{{}}}{}}}",
                render_arg(first),
                render_arg(second)
            )),
            _ => out.push(&format!(
                "{}{{{}}}{{{}}}",
                symbol.latex,
                render_arg(first),
                render_arg(second)
            )),
        },
        Node::Script { base, sub, sup } => {
            emit(base, out);
            if let Some(sub) = sub {
                out.push(&format!("_{}", script_arg(sub)));
            }
            if let Some(sup) = sup {
                out.push(&format!("^{}", script_arg(sup)));
            }
        }
        Node::Fraction { num, den } => out.push(&format!(
            "\\frac{{{}}}{{{}}}",
            render_arg(num),
            render_arg(den)
        )),
    }
}

fn delimiter(latex: &str) -> &str {
    if latex.is_empty() {
        "."
    } else {
        latex
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_superscript() {
        assert_eq!(to_latex("x^2"), "x^2");
        assert_eq!(to_latex("x^10"), "x^{10}");
        assert_eq!(to_latex("x^(a+b)"), "x^{a+b}");
    }

    #[test]
    fn test_sub_and_sup() {
        assert_eq!(to_latex("x_i^2"), "x_i^2");
        assert_eq!(to_latex("x^2_i"), "x_i^2");
        assert_eq!(to_latex("a_(n+1)"), "a_{n+1}");
    }

    #[test]
    fn test_greek_and_spacing() {
        assert_eq!(to_latex("alpha x"), "\\alpha x");
        assert_eq!(to_latex("2pi r"), "2\\pi r");
        assert_eq!(to_latex("alpha+beta"), "\\alpha+\\beta");
    }

    #[test]
    fn test_fractions() {
        assert_eq!(to_latex("1/2"), "\\frac{1}{2}");
        assert_eq!(to_latex("(a+b)/(c-d)"), "\\frac{a+b}{c-d}");
        assert_eq!(to_latex("frac a b"), "\\frac{a}{b}");
    }

    #[test]
    fn test_unary_and_binary() {
        assert_eq!(to_latex("sqrt x"), "\\sqrt{x}");
        assert_eq!(to_latex("sqrt(x+1)"), "\\sqrt{x+1}");
        assert_eq!(to_latex("root(3)(x)"), "\\sqrt[3]{x}");
        assert_eq!(to_latex("hat x"), "\\hat{x}");
        assert_eq!(to_latex("bb R"), "\\mathbf{R}");
        assert_eq!(to_latex("abs(x)"), "\\left|x\\right|");
        assert_eq!(to_latex("color(red)(x)"), "{\\color{red}x}");
    }

    #[test]
    fn test_text() {
        assert_eq!(to_latex("text(if and only if)"), "\\text{if and only if}");
        assert_eq!(to_latex("x \"for all\" y"), "x\\text{for all}y");
    }

    #[test]
    fn test_brackets() {
        assert_eq!(to_latex("(x)"), "\\left(x\\right)");
        assert_eq!(to_latex("{:x:}"), "x");
        assert_eq!(to_latex("(:a,b:)"), "\\left\\langle a,b\\right\\rangle");
        assert_eq!(to_latex("(x"), "\\left(x\\right.");
        assert_eq!(to_latex("x)"), "x)");
    }

    #[test]
    fn test_symbols_longest_match() {
        assert_eq!(to_latex("a <= b"), "a\\le b");
        assert_eq!(to_latex("p <=> q"), "p\\Leftrightarrow q");
        assert_eq!(to_latex("f: A -> B"), "f:A\\to B");
        assert_eq!(to_latex("x |-> y"), "x\\mapsto y");
        assert_eq!(to_latex("int_0^oo"), "\\int_0^{\\infty}");
    }

    #[test]
    fn test_big_operators() {
        assert_eq!(to_latex("sum_(i=1)^n i^3"), "\\sum_{i=1}^ni^3");
        assert_eq!(to_latex("lim_(x->oo) 1/x"), "\\lim_{x\\to\\infty}\\frac{1}{x}");
    }

    #[test]
    fn test_matrix() {
        assert_eq!(
            to_latex("[(a,b),(c,d)]"),
            "\\begin{bmatrix} a & b \\\\ c & d \\end{bmatrix}"
        );
        assert_eq!(
            to_latex("((1,0),(0,1))"),
            "\\begin{pmatrix} 1 & 0 \\\\ 0 & 1 \\end{pmatrix}"
        );
        // a single row is just a bracketed list
        assert_eq!(to_latex("[(a,b)]"), "\\left[\\left(a,b\\right)\\right]");
    }

    #[test]
    fn test_escaped_characters() {
        assert_eq!(to_latex("50%"), "50\\%");
        assert_eq!(to_latex("x ~ y"), "x\\sim y");
    }

    #[test]
    fn test_decimal_numbers() {
        assert_eq!(to_latex("3.14"), "3.14");
        assert_eq!(to_latex("x^1.5"), "x^{1.5}");
    }

    #[test]
    fn test_deep_nesting_kept_literal() {
        let input = "(".repeat(10_000);
        let latex = to_latex(&input);
        assert_eq!(latex.matches("\\left(").count(), MAX_DEPTH);
        assert!(latex.contains(&"(".repeat(10_000 - MAX_DEPTH)));

        let latex = to_latex(&format!("{}x", "sqrt ".repeat(5_000)));
        assert!(latex.starts_with("\\sqrt{"));
        assert!(latex.contains("sqrt sqrt"));
    }

    #[test]
    fn test_empty() {
        assert_eq!(to_latex(""), "");
        assert_eq!(to_latex("   "), "");
    }
}
