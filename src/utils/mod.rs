use regex::Regex;
use std::sync::LazyLock;

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9]").expect("static filename pattern compiles")
});

/// Derive the saved document name from a book title: everything outside
/// ASCII letters and digits becomes `_`, the result is lower-cased and
/// given a `.docx` extension.
pub fn download_filename(title: &str) -> String {
    let stem = UNSAFE_FILENAME_CHARS.replace_all(title, "_");
    format!("{}.docx", stem.to_lowercase())
}

pub fn normalize_base_url(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_string()
}
