//! Capabilities consumed from the hosting document environment.

use crate::notice::Notice;
use crate::session::Session;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// A reference to an opened document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Document {
    /// File name including extension; also the session key.
    pub name: String,
    /// Host specific location (vault relative path for the filesystem host).
    pub path: String,
}

impl Document {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Builds a document from a path, using its last segment as the name.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(path.as_str())
            .to_string();
        Self { name, path }
    }

    /// The session key of this document.
    pub fn key(&self) -> &str {
        &self.name
    }
}

/// Document-management capabilities of the host.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// Returns the tags of `doc`, or `None` when the host has no index entry.
    async fn tags_for_document(&self, doc: &Document) -> Option<BTreeSet<String>>;

    /// Returns the text of the template at `path`, or `None` when it cannot
    /// be resolved.
    async fn load_template(&self, path: &str) -> Option<String>;

    /// Returns the full text of `doc`.
    async fn read_document_text(&self, doc: &Document) -> crate::Result<String>;
}

/// Receives session state pushes for display.
pub trait SessionObserver: Send + Sync {
    /// Called with the current state of a session after every change the
    /// user should see.
    fn session_changed(&self, session: &Session);

    /// Called when the user must be told about a condition.
    fn notice(&self, notice: &Notice);
}

/// An observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SessionObserver for NullObserver {
    fn session_changed(&self, _session: &Session) {}

    fn notice(&self, _notice: &Notice) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_from_path_uses_last_segment() {
        let doc = Document::from_path("projects/ideas/Notes.md");
        assert_eq!(doc.name, "Notes.md");
        assert_eq!(doc.path, "projects/ideas/Notes.md");
        assert_eq!(doc.key(), "Notes.md");
    }

    #[test]
    fn test_document_from_bare_name() {
        let doc = Document::from_path("Notes.md");
        assert_eq!(doc.name, "Notes.md");
    }
}
