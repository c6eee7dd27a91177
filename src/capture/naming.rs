use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Longest stem allowed with Windows-compatible names
const WINDOWS_MAX_STEM: usize = 255;

/// Characters kept from each end of an over-long stem
const WINDOWS_KEEP: usize = 50;

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9.]").expect("static regex"))
}

/// Kind of artifact produced for a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Screenshot,
    Pdf,
    Source,
}

impl ArtifactKind {
    /// Sub-directory of the level directory holding this kind
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Screenshot => "screenshots",
            Self::Pdf => "pdf",
            Self::Source => "html_source",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Screenshot => "png",
            Self::Pdf => "pdf",
            Self::Source => "html",
        }
    }
}

/// Derives a filesystem-safe stem from a URL
///
/// The scheme is dropped and every character outside `[A-Za-z0-9.]` becomes
/// `.-`. With `windows_filenames`, stems longer than 255 characters keep only
/// their first and last 50 characters.
///
/// # Examples
///
/// ```
/// use deepshot::capture::artifact_stem;
///
/// assert_eq!(artifact_stem("https://example.com/a?b=1", false), "example.com.-a.-b.-1");
/// ```
pub fn artifact_stem(url: &str, windows_filenames: bool) -> String {
    let without_https = url.rsplit("https://").next().unwrap_or(url);
    let without_scheme = without_https.rsplit("http://").next().unwrap_or(without_https);
    let stem = unsafe_chars().replace_all(without_scheme, ".-").into_owned();

    if windows_filenames && stem.len() > WINDOWS_MAX_STEM {
        // Stem is pure ASCII after the replacement, so byte slicing is safe
        return format!(
            "{}__{}",
            &stem[..WINDOWS_KEEP],
            &stem[stem.len() - WINDOWS_KEEP..]
        );
    }
    stem
}

/// Full path of an artifact: `<output>/<level>/<kind dir>/<stem>_<seq>.<ext>`
pub fn artifact_path(output_dir: &Path, level: u32, kind: ArtifactKind, stem: &str, seq: u64) -> PathBuf {
    output_dir
        .join(level.to_string())
        .join(kind.dir_name())
        .join(format!("{}_{}.{}", stem, seq, kind.extension()))
}

/// Appends a random suffix to a file name, keeping its extension
///
/// Used when a file of the same name already exists at a destination.
pub fn unique_file_name(file_name: &str) -> String {
    let suffix = uuid::Uuid::new_v4();
    match file_name.rsplit_once('.') {
        Some((base, ext)) if !ext.is_empty() => format!("{}_{}.{}", base, suffix, ext),
        Some((base, _)) => format!("{}_{}", base, suffix),
        None => format!("{}_{}", file_name, suffix),
    }
}
