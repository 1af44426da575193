//! Filesystem DocumentHost implementation.
//!
//! Treats a directory of markdown notes as the document environment:
//! documents are files addressed by their vault relative path, tags come
//! from YAML front matter and inline `#tag` tokens, and templates are notes
//! resolved relative to the vault root.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tagchat_core::host::{Document, DocumentHost};
use tagchat_core::template::DOCUMENT_EXTENSION;
use tagchat_core::{Result, TagchatError};

static INLINE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)#([\w/-]+)").expect("inline tag pattern is valid")
});

/// A vault rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct FsVaultHost {
    root: PathBuf,
}

impl FsVaultHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Returns the template candidates for `path`: as given, then with the
    /// document extension appended.
    fn template_candidates(&self, path: &str) -> Vec<PathBuf> {
        let path = path.trim();
        let mut candidates = vec![self.resolve(path)];
        if !path.ends_with(DOCUMENT_EXTENSION) {
            candidates.push(self.resolve(&format!("{path}{DOCUMENT_EXTENSION}")));
        }
        candidates
    }
}

#[async_trait]
impl DocumentHost for FsVaultHost {
    async fn tags_for_document(&self, doc: &Document) -> Option<BTreeSet<String>> {
        let path = self.resolve(&doc.path);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Some(extract_tags(&text)),
            Err(e) => {
                tracing::debug!("No tag index for {:?}: {}", path, e);
                None
            }
        }
    }

    async fn load_template(&self, path: &str) -> Option<String> {
        if path.trim().is_empty() {
            return None;
        }
        for candidate in self.template_candidates(path) {
            if let Ok(text) = tokio::fs::read_to_string(&candidate).await {
                return Some(text);
            }
        }
        None
    }

    async fn read_document_text(&self, doc: &Document) -> Result<String> {
        let path = self.resolve(&doc.path);
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            TagchatError::io(format!("Failed to read document {}: {}", path.display(), e))
        })
    }
}

/// Collects the tags of a markdown note, each prefixed with `#`.
///
/// Front matter tags come from a `tags:` key written inline
/// (`tags: [a, b]`, `tags: a, b`) or as a list of `- item` lines. Inline
/// tags are `#word` tokens outside fenced code blocks; purely numeric
/// tokens are not tags.
pub fn extract_tags(text: &str) -> BTreeSet<String> {
    let (front_matter, body) = split_front_matter(text);

    let mut tags = BTreeSet::new();
    if let Some(front_matter) = front_matter {
        tags.extend(front_matter_tags(front_matter));
    }

    let mut in_fence = false;
    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        for capture in INLINE_TAG.captures_iter(line) {
            let tag = &capture[1];
            if !tag.chars().all(|c| c.is_ascii_digit()) {
                tags.insert(format!("#{tag}"));
            }
        }
    }

    tags
}

fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, text)
}

fn front_matter_tags(front_matter: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut in_tag_list = false;

    for line in front_matter.lines() {
        let trimmed = line.trim();
        if in_tag_list {
            if let Some(item) = trimmed.strip_prefix("- ") {
                push_tag(&mut tags, item);
                continue;
            }
            in_tag_list = false;
        }

        let Some(value) = trimmed
            .strip_prefix("tags:")
            .or_else(|| trimmed.strip_prefix("tag:"))
        else {
            continue;
        };

        let value = value.trim();
        if value.is_empty() {
            in_tag_list = true;
            continue;
        }

        let value = value.trim_start_matches('[').trim_end_matches(']');
        for item in value.split(|c: char| c == ',' || c == ' ') {
            push_tag(&mut tags, item);
        }
    }

    tags
}

fn push_tag(tags: &mut Vec<String>, raw: &str) {
    let tag = raw.trim().trim_matches(|c: char| c == '"' || c == '\'');
    let tag = tag.strip_prefix('#').unwrap_or(tag);
    if !tag.is_empty() {
        tags.push(format!("#{tag}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_inline_tags() {
        let text = "# Heading\nSome text #research and #to-do/later.\nIssue #42 is not a tag";
        assert_eq!(extract_tags(text), set(&["#research", "#to-do/later"]));
    }

    #[test]
    fn test_tags_in_code_fences_are_ignored() {
        let text = "```\n#include <stdio.h>\n```\n#real";
        assert_eq!(extract_tags(text), set(&["#real"]));
    }

    #[test]
    fn test_front_matter_inline_and_list() {
        let text = "---\ntitle: x\ntags: [research, \"book\"]\n---\nbody";
        assert_eq!(extract_tags(text), set(&["#book", "#research"]));

        let text = "---\ntags:\n  - research\n  - '#idea'\nauthor: me\n---\nbody #inline";
        assert_eq!(extract_tags(text), set(&["#idea", "#inline", "#research"]));
    }

    #[test]
    fn test_unterminated_front_matter_is_body() {
        let text = "---\ntags: research\n";
        assert!(extract_tags(text).is_empty());
    }

    #[tokio::test]
    async fn test_host_reads_documents_and_templates() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("templates")).unwrap();
        std::fs::write(dir.path().join("Notes.md"), "Reading list #research").unwrap();
        std::fs::write(
            dir.path().join("templates/research.md"),
            "Summarize {{title}}",
        )
        .unwrap();

        let host = FsVaultHost::new(dir.path());
        let doc = Document::from_path("Notes.md");

        assert_eq!(host.tags_for_document(&doc).await, Some(set(&["#research"])));
        assert_eq!(
            host.read_document_text(&doc).await.unwrap(),
            "Reading list #research"
        );
        assert_eq!(
            host.load_template("templates/research").await.as_deref(),
            Some("Summarize {{title}}")
        );
        assert_eq!(
            host.load_template("templates/research.md").await.as_deref(),
            Some("Summarize {{title}}")
        );
        assert!(host.load_template("missing.md").await.is_none());
        assert!(host.load_template("").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_document_has_no_tags() {
        let dir = TempDir::new().unwrap();
        let host = FsVaultHost::new(dir.path());
        let doc = Document::from_path("Missing.md");

        assert!(host.tags_for_document(&doc).await.is_none());
        assert!(host.read_document_text(&doc).await.is_err());
    }
}
