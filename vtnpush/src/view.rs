//! View-model types consumed by the UI projection layer
//!
//! The reconciler never touches presentation state directly: it hands out
//! immutable [`StateSnapshot`]s after every state change, and the UI sends
//! back typed [`Intent`]s instead of wiring callbacks. Rendering itself
//! (DOM, toasts, modals) lives outside this crate.

use crate::models::{Preferences, Topic};
use crate::session::SessionPhase;
use serde::{Deserialize, Serialize};

/// Per-view degradation flags set when an activation read fails
///
/// A degraded view renders its default (unchecked control, empty list)
/// and its remote-dependent actions stay disabled; the other views are
/// unaffected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedViews {
    /// The "song" preference read failed
    pub song: bool,
    /// The "info" preference read failed
    pub info: bool,
    /// The registered-topics read failed
    pub registered: bool,
    /// The catalog read failed
    pub catalog: bool,
}

impl DegradedViews {
    /// All views degraded (token acquisition failed)
    pub fn all() -> Self {
        Self {
            song: true,
            info: true,
            registered: true,
            catalog: true,
        }
    }

    /// True if at least one view is degraded
    pub fn any(&self) -> bool {
        self.song || self.info || self.registered || self.catalog
    }
}

/// Immutable view of the reconciled session state
///
/// Cheap to clone; a fresh snapshot is produced after activation and after
/// every mutation, and is the only thing the rendering layer consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    /// Session lifecycle phase
    pub phase: SessionPhase,
    /// Last known preference flags (server-confirmed, or mirror fast-paint)
    pub preferences: Preferences,
    /// Registered topics, in insertion order (display stability)
    pub registered: Vec<Topic>,
    /// Full catalog of topics available for registration
    pub catalog: Vec<Topic>,
    /// Views whose activation read failed
    pub degraded: DegradedViews,
    /// A mutation is currently in flight (global loading indicator)
    pub busy: bool,
    /// Client-side admission limit gating the "add topic" affordance
    pub max_topics: usize,
}

impl StateSnapshot {
    /// Whether the "add topic" affordance should be offered
    pub fn can_add_topic(&self) -> bool {
        matches!(self.phase, SessionPhase::Ready | SessionPhase::Degraded)
            && !self.degraded.registered
            && self.registered.len() < self.max_topics
    }

    /// Catalog entries not yet registered, for the "add topic" modal
    pub fn catalog_available(&self) -> Vec<&Topic> {
        self.catalog
            .iter()
            .filter(|t| !self.registered.iter().any(|r| r.id == t.id))
            .collect()
    }
}

/// Typed user intents, dispatched to the reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Register the current token on a topic from the catalog
    RegisterTopic(String),
    /// Remove one topic registration
    UnregisterTopic(String),
    /// Set a preference flag
    SetPreference(crate::models::PreferenceKind, bool),
    /// Revoke the token and every subscription (best-effort)
    RevokeAll,
}

/// User-facing notification emitted by a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Transient success confirmation
    Toast(String),
    /// Blocking failure report
    Alert(String),
}

impl Notice {
    /// True for [`Notice::Alert`]
    pub fn is_alert(&self) -> bool {
        matches!(self, Notice::Alert(_))
    }
}

/// Result of dispatching one intent: the fresh snapshot plus the notices
/// the UI should present
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// State after the mutation (unchanged when the mutation failed)
    pub snapshot: StateSnapshot,
    /// Toasts and alerts to present
    pub notices: Vec<Notice>,
}

impl DispatchOutcome {
    /// True when no alert was raised
    pub fn succeeded(&self) -> bool {
        !self.notices.iter().any(Notice::is_alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Topic;

    fn snapshot_with(registered: Vec<Topic>, catalog: Vec<Topic>, max_topics: usize) -> StateSnapshot {
        StateSnapshot {
            phase: SessionPhase::Ready,
            preferences: Preferences::default(),
            registered,
            catalog,
            degraded: DegradedViews::default(),
            busy: false,
            max_topics,
        }
    }

    #[test]
    fn test_can_add_topic_under_limit() {
        let registered = vec![Topic::new("t1", "anime")];
        let snapshot = snapshot_with(registered, vec![], 5);
        assert!(snapshot.can_add_topic());
    }

    #[test]
    fn test_cannot_add_topic_at_limit() {
        let registered = (0..5).map(|i| Topic::new(format!("t{i}"), "x")).collect();
        let snapshot = snapshot_with(registered, vec![], 5);
        assert!(!snapshot.can_add_topic());
    }

    #[test]
    fn test_cannot_add_topic_when_blocked() {
        let mut snapshot = snapshot_with(vec![], vec![], 5);
        snapshot.phase = SessionPhase::PermissionBlocked;
        assert!(!snapshot.can_add_topic());
    }

    #[test]
    fn test_catalog_available_filters_registered() {
        let registered = vec![Topic::new("t1", "anime")];
        let catalog = vec![Topic::new("t1", "anime"), Topic::new("t2", "game")];
        let snapshot = snapshot_with(registered, catalog, 5);

        let available = snapshot.catalog_available();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, "t2");
    }

    #[test]
    fn test_degraded_views_any() {
        assert!(!DegradedViews::default().any());
        assert!(DegradedViews::all().any());
        let one = DegradedViews {
            catalog: true,
            ..Default::default()
        };
        assert!(one.any());
    }
}
