//! Output directory and embedding prefix resolution.
//!
//! Rendered artifacts are written under one directory and referenced from the
//! document through a prefix relative to the images directory. Both are computed
//! once per document.

use std::path::{Component, Path, PathBuf};

/// Where artifacts are written and how the document refers to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLocation {
    /// Directory artifacts are written to
    pub output_dir: PathBuf,

    /// Prefix joined with artifact file names in image references
    pub target_prefix: String,
}

impl OutputLocation {
    /// Resolve the location from directory configuration.
    ///
    /// - With `imagesoutdir`, artifacts go there (resolved against `base` when
    ///   relative). The prefix is the path from `imagesdir` to `imagesoutdir`, or
    ///   `imagesoutdir` itself when no images directory is set.
    /// - Otherwise artifacts go to `imagesdir` (or `base`) and the prefix is `.`,
    ///   since the converter already prefixes the images directory.
    ///
    /// # Example
    /// ```
    /// use std::path::Path;
    /// use stemrender::path::OutputLocation;
    ///
    /// let location = OutputLocation::resolve(
    ///     Some(Path::new("build/img")),
    ///     Some(Path::new("assets/img")),
    ///     Path::new("/doc"),
    /// );
    /// assert_eq!(location.output_dir, Path::new("/doc/build/img"));
    /// assert_eq!(location.target_prefix, "../../build/img");
    /// ```
    pub fn resolve(imagesoutdir: Option<&Path>, imagesdir: Option<&Path>, base: &Path) -> Self {
        let imagesdir = imagesdir.filter(|p| !p.as_os_str().is_empty());
        let imagesoutdir = imagesoutdir.filter(|p| !p.as_os_str().is_empty());

        match imagesoutdir {
            Some(out) => {
                let output_dir = resolve_against(out, base);
                let target_prefix = match imagesdir {
                    Some(images) => {
                        let images = resolve_against(images, base);
                        to_slash(&relative_path(&images, &output_dir))
                    }
                    None => to_slash(out),
                };
                Self {
                    output_dir,
                    target_prefix,
                }
            }
            None => Self {
                output_dir: imagesdir
                    .map(|images| resolve_against(images, base))
                    .unwrap_or_else(|| normalize_lexically(base)),
                target_prefix: ".".to_string(),
            },
        }
    }

    /// Reference target for an artifact file name.
    pub fn target_for(&self, file_name: &str) -> String {
        if self.target_prefix.is_empty() || self.target_prefix == "." {
            file_name.to_string()
        } else {
            format!("{}/{}", self.target_prefix.trim_end_matches('/'), file_name)
        }
    }

    /// Path an artifact file name is written to.
    pub fn file_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

/// Resolve `path` against `base` unless it is absolute, normalizing `.` and `..`.
pub fn resolve_against(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_lexically(path)
    } else {
        normalize_lexically(&base.join(path))
    }
}

/// Relative path from directory `from` to `to`.
///
/// Both paths are normalized lexically first; no filesystem access is made. Returns
/// `.` when they are the same directory.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from = normalize_lexically(from);
    let to = normalize_lexically(to);

    let from_parts: Vec<Component<'_>> = from.components().collect();
    let to_parts: Vec<Component<'_>> = to.components().collect();
    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in &from_parts[common..] {
        result.push("..");
    }
    for part in &to_parts[common..] {
        result.push(part.as_os_str());
    }

    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}

/// Remove `.` components and fold `..` into preceding components.
///
/// Leading `..` in relative paths are kept; `..` above the root is dropped.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().map(|c| c.as_os_str()).collect()
}

fn to_slash(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| match c {
            Component::RootDir => String::new(),
            other => other.as_os_str().to_string_lossy().into_owned(),
        })
        .collect();
    match parts.as_slice() {
        [only] if only.is_empty() => "/".to_string(),
        _ => parts.join("/"),
    }
}
