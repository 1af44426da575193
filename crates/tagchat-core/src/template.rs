//! Prompt template rendering.
//!
//! Templates are plain text with two optional placeholders:
//!
//! - `{{title}}`: the document name without its `.md` extension
//! - `{{context}}`: the document body, cut to [`MAX_CONTEXT_CHARS`]
//!
//! Each placeholder is substituted at its first occurrence only. Rendering
//! is deterministic for a given (template, title, body).

pub const TITLE_PLACEHOLDER: &str = "{{title}}";
pub const CONTEXT_PLACEHOLDER: &str = "{{context}}";

/// Maximum number of characters of document body sent as context.
pub const MAX_CONTEXT_CHARS: usize = 5000;

/// Extension of documents that can carry a session.
pub const DOCUMENT_EXTENSION: &str = ".md";

/// Returns true when rendering `template` needs the document body.
pub fn requests_context(template: &str) -> bool {
    template.contains(CONTEXT_PLACEHOLDER)
}

/// Returns the document name with its trailing `.md` removed.
pub fn display_title(document_name: &str) -> &str {
    document_name
        .strip_suffix(DOCUMENT_EXTENSION)
        .unwrap_or(document_name)
}

/// Returns the first `max_chars` characters of `text`.
///
/// The cut is a hard prefix cut; it never splits a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Renders `template` for a document.
///
/// `body` is only consulted when the template contains the context
/// placeholder; pass `None` when it was not read.
pub fn render(template: &str, document_name: &str, body: Option<&str>) -> String {
    render_with_limit(template, document_name, body, MAX_CONTEXT_CHARS)
}

/// Same as [`render`] with an explicit context limit.
pub fn render_with_limit(
    template: &str,
    document_name: &str,
    body: Option<&str>,
    max_context_chars: usize,
) -> String {
    let rendered = template.replacen(TITLE_PLACEHOLDER, display_title(document_name), 1);

    if !requests_context(&rendered) {
        return rendered;
    }

    let context = truncate_chars(body.unwrap_or_default(), max_context_chars);
    rendered.replacen(CONTEXT_PLACEHOLDER, context, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_strips_extension() {
        assert_eq!(render("Summarize {{title}}", "Notes.md", None), "Summarize Notes");
    }

    #[test]
    fn test_title_without_extension_is_kept() {
        assert_eq!(display_title("README"), "README");
        assert_eq!(display_title("a.md.md"), "a.md");
    }

    #[test]
    fn test_template_without_context_ignores_body() {
        let rendered = render("About {{title}}", "x.md", Some("body text"));
        assert_eq!(rendered, "About x");
    }

    #[test]
    fn test_context_is_truncated_to_limit() {
        let body = "a".repeat(MAX_CONTEXT_CHARS + 100);
        let rendered = render("{{context}}", "x.md", Some(&body));
        assert_eq!(rendered.chars().count(), MAX_CONTEXT_CHARS);
    }

    #[test]
    fn test_short_context_is_inserted_whole() {
        let rendered = render("{{title}}: {{context}}", "Log.md", Some("line one\nline two"));
        assert_eq!(rendered, "Log: line one\nline two");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("ab", 5), "ab");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_only_first_occurrence_is_replaced() {
        let rendered = render("{{title}} and {{title}}", "A.md", None);
        assert_eq!(rendered, "A and {{title}}");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let body = "lorem ipsum ".repeat(1000);
        let first = render("{{title}}\n{{context}}", "Doc.md", Some(&body));
        let second = render("{{title}}\n{{context}}", "Doc.md", Some(&body));
        assert_eq!(first, second);
    }
}
