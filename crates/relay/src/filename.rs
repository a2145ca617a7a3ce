//! Download filename sanitization.

/// Characters never allowed in a download filename.
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const MAX_STEM_LENGTH: usize = 150;

/// Turn a media title into a safe `<stem>.<extension>` attachment filename.
///
/// Control characters and reserved characters become `_`, whitespace runs
/// collapse to a single `_`, leading/trailing `.`/`_` are stripped and the
/// stem is capped at 150 characters. A title that sanitizes to nothing
/// becomes `download`.
pub fn sanitize_filename(title: &str, extension: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if (c as u32) < 32 || INVALID_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(['.', '_']);
    let mut stem = trimmed.replace(' ', "_");

    if stem.is_empty() {
        stem = "download".to_string();
    }

    let stem: String = stem.chars().take(MAX_STEM_LENGTH).collect();

    format!("{stem}.{extension}")
}
