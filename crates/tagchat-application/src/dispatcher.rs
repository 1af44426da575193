//! Tag dispatcher.
//!
//! Reacts to document-open signals: reuses the stored session of a known
//! document, or seeds a new one from the first tag binding the document
//! matches and drives it through one completion round trip.

use crate::conversation_service::ConversationService;
use crate::settings_service::SettingsService;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tagchat_core::chat::ChatError;
use tagchat_core::config::TagBinding;
use tagchat_core::host::{Document, DocumentHost};
use tagchat_core::session::Session;
use tagchat_core::template::{self, DOCUMENT_EXTENSION};

/// Why an open signal had no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The signal carried no document.
    NoDocument,
    /// The document is not a markdown note.
    NotMarkdown,
    /// The dispatcher is switched off.
    Inactive,
    /// The host has no tags for the document.
    NoTags,
    /// None of the configured tags is on the document.
    NoMatchingBinding,
    /// The matched binding's template could not be resolved.
    TemplateMissing { tag: String, path: Option<String> },
    /// The template needs the body but the document could not be read.
    DocumentUnreadable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoDocument => f.write_str("no document"),
            SkipReason::NotMarkdown => f.write_str("not a markdown document"),
            SkipReason::Inactive => f.write_str("dispatcher inactive"),
            SkipReason::NoTags => f.write_str("document has no tags"),
            SkipReason::NoMatchingBinding => f.write_str("no configured tag matched"),
            SkipReason::TemplateMissing { tag, path: Some(path) } => {
                write!(f, "template '{path}' for tag '{tag}' not found")
            }
            SkipReason::TemplateMissing { tag, path: None } => {
                write!(f, "no template configured for tag '{tag}'")
            }
            SkipReason::DocumentUnreadable => f.write_str("document could not be read"),
        }
    }
}

/// Result of one document-open dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Skipped(SkipReason),
    /// The document already had a session; nothing was rendered or sent.
    CacheHit(Session),
    /// A new session was created. `failure` is set when the first
    /// completion failed; the session then ends with the user turn.
    Created {
        session: Session,
        failure: Option<ChatError>,
    },
}

impl DispatchOutcome {
    pub fn session(&self) -> Option<&Session> {
        match self {
            DispatchOutcome::Skipped(_) => None,
            DispatchOutcome::CacheHit(session) => Some(session),
            DispatchOutcome::Created { session, .. } => Some(session),
        }
    }
}

pub struct TagDispatcher {
    host: Arc<dyn DocumentHost>,
    settings: Arc<SettingsService>,
    conversation: Arc<ConversationService>,
    active: AtomicBool,
}

impl TagDispatcher {
    pub fn new(
        host: Arc<dyn DocumentHost>,
        settings: Arc<SettingsService>,
        conversation: Arc<ConversationService>,
    ) -> Self {
        Self {
            host,
            settings,
            conversation,
            active: AtomicBool::new(true),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
        tracing::info!("Tag dispatcher {}", if active { "activated" } else { "deactivated" });
    }

    /// Flips the active flag and returns the new state.
    pub fn toggle(&self) -> bool {
        let active = !self.active.fetch_xor(true, Ordering::SeqCst);
        tracing::info!("Tag dispatcher {}", if active { "activated" } else { "deactivated" });
        active
    }

    /// Handles one document-open signal.
    pub async fn dispatch(&self, doc: Option<&Document>) -> DispatchOutcome {
        let Some(doc) = doc else {
            return DispatchOutcome::Skipped(SkipReason::NoDocument);
        };
        if !doc.name.ends_with(DOCUMENT_EXTENSION) {
            return self.skip(doc, SkipReason::NotMarkdown);
        }
        if !self.is_active() {
            return self.skip(doc, SkipReason::Inactive);
        }

        let key = doc.key();
        let store = self.conversation.store();
        let _guard = self.conversation.locks().lock(key).await;

        if let Some(session) = store.get(key).await {
            tracing::debug!("Reusing session for '{}'", key);
            self.conversation.observer().session_changed(&session);
            return DispatchOutcome::CacheHit(session);
        }

        let tags = match self.host.tags_for_document(doc).await {
            Some(tags) if !tags.is_empty() => tags,
            _ => return self.skip(doc, SkipReason::NoTags),
        };

        let settings = self.settings.settings();
        let bindings = settings.tag_bindings();
        let Some(binding) = first_matching_binding(&bindings, &tags) else {
            return self.skip(doc, SkipReason::NoMatchingBinding);
        };

        let template_text = match binding.template_path.as_deref() {
            Some(path) => self.host.load_template(path).await,
            None => None,
        };
        let Some(template_text) = template_text else {
            let reason = SkipReason::TemplateMissing {
                tag: binding.tag.clone(),
                path: binding.template_path.clone(),
            };
            tracing::warn!("Not starting a session for '{}': {}", key, reason);
            return DispatchOutcome::Skipped(reason);
        };

        let body = if template::requests_context(&template_text) {
            match self.host.read_document_text(doc).await {
                Ok(body) => Some(body),
                Err(err) => {
                    tracing::warn!("Failed to read '{}': {}", doc.path, err);
                    return DispatchOutcome::Skipped(SkipReason::DocumentUnreadable);
                }
            }
        } else {
            None
        };

        let mut session = Session::new(key, settings.system_behavior.as_str());
        session.push_user(template::render(&template_text, &doc.name, body.as_deref()));

        store.put(key, session.clone()).await;
        tracing::info!("Created session for '{}' from tag '{}'", key, binding.tag);
        self.conversation.observer().session_changed(&session);

        let (session, failure) = self.conversation.complete(session, true).await;
        DispatchOutcome::Created { session, failure }
    }

    fn skip(&self, doc: &Document, reason: SkipReason) -> DispatchOutcome {
        tracing::debug!("Skipping '{}': {}", doc.name, reason);
        DispatchOutcome::Skipped(reason)
    }
}

/// Returns the first binding, in configured order, whose tag is on the
/// document. Later bindings never fire, even when they also match.
fn first_matching_binding<'a>(
    bindings: &'a [TagBinding],
    document_tags: &BTreeSet<String>,
) -> Option<&'a TagBinding> {
    bindings
        .iter()
        .find(|binding| document_tags.iter().any(|tag| binding.matches(tag)))
}
