//! Tag to template bindings.

use serde::{Deserialize, Serialize};

/// Pairs a tag with the template used to seed sessions for documents
/// carrying it.
///
/// Bindings are positional: the Nth configured tag binds to the Nth
/// configured template path. A tag configured without a template path keeps
/// `template_path = None`, which the dispatcher treats as a missing template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagBinding {
    pub tag: String,
    pub template_path: Option<String>,
}

impl TagBinding {
    pub fn new(tag: impl Into<String>, template_path: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            template_path: Some(template_path.into()),
        }
    }

    /// Zips tags and template paths positionally.
    pub fn zip(tags: &[String], template_paths: &[String]) -> Vec<TagBinding> {
        tags.iter()
            .enumerate()
            .map(|(index, tag)| TagBinding {
                tag: tag.clone(),
                template_path: template_paths.get(index).cloned(),
            })
            .collect()
    }

    /// Returns true when `document_tag` names this binding's tag.
    ///
    /// A leading `#` is ignored on both sides.
    pub fn matches(&self, document_tag: &str) -> bool {
        normalize_tag(&self.tag) == normalize_tag(document_tag)
    }
}

/// Strips surrounding whitespace and a single leading `#`.
pub fn normalize_tag(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix('#').unwrap_or(tag)
}

/// Splits a comma separated settings value, trimming entries and dropping
/// empty ones.
pub fn parse_csv_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
