//! Landing page route.

use axum::response::Html;

/// Embedded at compile time; the page is a single static form.
const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_TEMPLATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_contains_the_download_form() {
        assert!(INDEX_TEMPLATE.contains("<form"));
        assert!(INDEX_TEMPLATE.contains("Dreamy Downloader"));
    }
}
