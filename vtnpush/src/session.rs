//! Subscription session: the reconciliation core
//!
//! A [`Session`] merges three sources of truth into one consistent view:
//! the push provider's token, the remote server's stored preferences and
//! topic registrations, and the local UI state. It is constructed with
//! injected dependencies (token provider, API client, configuration) and
//! activated explicitly, so every collaborator can be replaced by a test
//! double.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized -> Activating -> Ready
//!                            \-> PermissionBlocked   (terminal, no remote calls)
//!                            \-> Degraded            (some reads failed)
//! ```
//!
//! # Concurrency
//!
//! All remote operations are async and suspend at the network boundary.
//! Mutations are serialized by a session-wide busy flag, matching the
//! single global loading indicator of the original UI: a second mutation
//! while one is in flight is rejected with [`PushError::Busy`]. The token
//! is shared by all remote calls of a session and only refreshed at
//! activation and at explicit revocation.

use crate::api::SubscriptionApi;
use crate::config_ext::{SubscriptionConfigExt, DEFAULT_MAX_TOPICS};
use crate::error::{PushError, Result};
use crate::models::{PreferenceKind, Preferences, Topic};
use crate::view::{DegradedViews, DispatchOutcome, Intent, Notice, StateSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};
use vtnconfig::Config;
use vtntoken::{PushTokenProvider, Token};

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Created, not yet activated
    Uninitialized,
    /// Activation in progress
    Activating,
    /// Activation completed, all views populated
    Ready,
    /// Permission is not granted; terminal, no remote calls are attempted
    PermissionBlocked,
    /// One or more activation reads failed; the healthy views still work
    Degraded,
}

/// Outcome of a best-effort revocation
///
/// Both steps are always attempted; each failure is reported
/// independently so the user can retry without being locked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevocationReport {
    /// The provider deleted its token registration
    pub provider_revoked: bool,
    /// The server cleared preferences and topic registrations
    pub server_revoked: bool,
}

impl RevocationReport {
    /// True when both the provider and the server confirmed revocation
    pub fn fully_revoked(&self) -> bool {
        self.provider_revoked && self.server_revoked
    }
}

/// Mutable session state behind the lock
struct SessionState {
    phase: SessionPhase,
    token: Option<Token>,
    preferences: Preferences,
    registered: Vec<Topic>,
    catalog: Vec<Topic>,
    degraded: DegradedViews,
}

/// Releases the busy flag when the mutation completes or fails
struct MutationGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Subscription session reconciling provider, server, and local state
///
/// Thread-safe (`Send + Sync`); methods take `&self` so a session can be
/// shared behind an `Arc` with the UI layer.
pub struct Session {
    /// Push-token provider (injected)
    provider: Arc<dyn PushTokenProvider>,
    /// Low-level API client
    api: SubscriptionApi,
    /// Configuration handle (admission limit, preference mirror)
    config: Arc<Config>,
    /// Reconciled state
    state: Mutex<SessionState>,
    /// At-most-one-in-flight mutation guard
    busy: AtomicBool,
}

impl Session {
    /// Create a session from explicit dependencies
    pub fn new(
        provider: Arc<dyn PushTokenProvider>,
        api: SubscriptionApi,
        config: Arc<Config>,
    ) -> Self {
        Self {
            provider,
            api,
            config,
            state: Mutex::new(SessionState {
                phase: SessionPhase::Uninitialized,
                token: None,
                preferences: Preferences::default(),
                registered: Vec::new(),
                catalog: Vec::new(),
                degraded: DegradedViews::default(),
            }),
            busy: AtomicBool::new(false),
        }
    }

    /// Create a session whose API client is built from the configuration
    /// (base URL and request timeout)
    pub fn with_config(provider: Arc<dyn PushTokenProvider>, config: Arc<Config>) -> Result<Self> {
        let timeout = config.get_request_timeout_secs()?;
        let api =
            SubscriptionApi::with_timeout(config.get_api_base_url(), Duration::from_secs(timeout))?;
        Ok(Self::new(provider, api, config))
    }

    /// Create a session using the global configuration
    pub fn from_config(provider: Arc<dyn PushTokenProvider>) -> Result<Self> {
        Self::with_config(provider, vtnconfig::get_config())
    }

    /// The configuration handle
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SessionPhase {
        self.state.lock().unwrap().phase
    }

    /// Immutable view of the current state
    pub fn snapshot(&self) -> StateSnapshot {
        let max_topics = self.config.get_max_topics().unwrap_or(DEFAULT_MAX_TOPICS);
        let state = self.state.lock().unwrap();
        StateSnapshot {
            phase: state.phase,
            preferences: state.preferences,
            registered: state.registered.clone(),
            catalog: state.catalog.clone(),
            degraded: state.degraded,
            busy: self.busy.load(Ordering::Acquire),
            max_topics,
        }
    }

    // ========================================================================
    // Activation
    // ========================================================================

    /// Activate the session
    ///
    /// Runs the activation state machine: permission check, token
    /// acquisition, then the four reads (two preferences, registered
    /// topics, catalog). Activation never fails as a whole; individual
    /// read failures degrade only their own view. The returned snapshot
    /// is what the UI projection should render.
    ///
    /// A degraded preference view keeps the mirrored fast-paint value,
    /// whether the token acquisition or only that read failed; the
    /// degraded flag is what disables the control, not the flag value.
    pub async fn activate(&self) -> StateSnapshot {
        info!("Activating subscription session");

        {
            let mut state = self.state.lock().unwrap();
            state.phase = SessionPhase::Activating;
            state.degraded = DegradedViews::default();

            // Fast paint: mirror values from the last session, shown
            // before any network traffic. Non-authoritative.
            for kind in PreferenceKind::ALL {
                match self.config.get_mirrored_preference(kind) {
                    Ok(Some(value)) => state.preferences.set(kind, value),
                    Ok(None) => {}
                    Err(e) => warn!("Failed to read preference mirror: {}", e),
                }
            }
        }

        let permission = self.provider.permission_state();
        if !permission.is_granted() {
            info!(%permission, "Notification permission not granted, session blocked");
            self.state.lock().unwrap().phase = SessionPhase::PermissionBlocked;
            return self.snapshot();
        }

        let token = match self.provider.acquire_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Token acquisition failed: {}", e);
                {
                    let mut state = self.state.lock().unwrap();
                    state.phase = SessionPhase::Degraded;
                    state.degraded = DegradedViews::all();
                }
                return self.snapshot();
            }
        };
        self.api.set_token(token.clone());
        self.state.lock().unwrap().token = Some(token);

        // The four reads are fault-isolated: a failure degrades its own
        // view and never blocks the following reads.
        for kind in PreferenceKind::ALL {
            match self.api.read_preference(kind).await {
                Ok(value) => {
                    self.state.lock().unwrap().preferences.set(kind, value);
                    if let Err(e) = self.config.set_mirrored_preference(kind, value) {
                        warn!("Failed to update preference mirror: {}", e);
                    }
                }
                Err(e) => {
                    debug!("{} preference read failed: {}", kind, e);
                    let mut state = self.state.lock().unwrap();
                    match kind {
                        PreferenceKind::Song => state.degraded.song = true,
                        PreferenceKind::Info => state.degraded.info = true,
                    }
                }
            }
        }

        match self.api.list_registered().await {
            Ok(topics) => self.state.lock().unwrap().registered = topics,
            Err(e) => {
                debug!("Registered-topics read failed: {}", e);
                let mut state = self.state.lock().unwrap();
                state.degraded.registered = true;
                state.registered.clear();
            }
        }

        match self.api.list_catalog().await {
            Ok(topics) => self.state.lock().unwrap().catalog = topics,
            Err(e) => {
                debug!("Catalog read failed: {}", e);
                let mut state = self.state.lock().unwrap();
                state.degraded.catalog = true;
                state.catalog.clear();
            }
        }

        {
            let mut state = self.state.lock().unwrap();
            state.phase = if state.degraded.any() {
                SessionPhase::Degraded
            } else {
                SessionPhase::Ready
            };
            info!(phase = ?state.phase, registered = state.registered.len(), "Session activated");
        }

        self.snapshot()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Dispatch a typed user intent
    ///
    /// Runs the matching mutation and returns the fresh snapshot together
    /// with the notices the UI should present: toasts for confirmations,
    /// alerts for failures. Mutation failures are never silent.
    pub async fn dispatch(&self, intent: Intent) -> DispatchOutcome {
        let mut notices = Vec::new();

        match intent {
            Intent::RegisterTopic(id) => match self.register_topic(&id).await {
                Ok(()) => notices.push(Notice::Toast("Topic registered".to_string())),
                Err(e) => notices.push(Notice::Alert(e.to_string())),
            },
            Intent::UnregisterTopic(id) => match self.unregister_topic(&id).await {
                Ok(()) => notices.push(Notice::Toast("Topic removed".to_string())),
                Err(e) => notices.push(Notice::Alert(e.to_string())),
            },
            Intent::SetPreference(kind, value) => match self.set_preference(kind, value).await {
                Ok(()) => notices.push(Notice::Toast(format!(
                    "{} notifications {}",
                    kind,
                    if value { "enabled" } else { "disabled" }
                ))),
                Err(e) => notices.push(Notice::Alert(e.to_string())),
            },
            Intent::RevokeAll => match self.revoke_all().await {
                Ok(report) => {
                    if !report.provider_revoked {
                        notices.push(Notice::Alert(
                            "The push token could not be deleted".to_string(),
                        ));
                    }
                    if !report.server_revoked {
                        notices.push(Notice::Alert(
                            "Server-side unsubscription failed".to_string(),
                        ));
                    }
                    if report.fully_revoked() {
                        notices.push(Notice::Toast("Unsubscribed".to_string()));
                    }
                }
                Err(e) => notices.push(Notice::Alert(e.to_string())),
            },
        }

        DispatchOutcome {
            snapshot: self.snapshot(),
            notices,
        }
    }

    /// Register the current token on a topic
    ///
    /// The admission limit is checked before any network call; an id
    /// already in the local set is a no-op success, so the rendered list
    /// can never hold the same topic twice.
    pub async fn register_topic(&self, topic_id: &str) -> Result<()> {
        let _guard = self.begin_mutation()?;
        self.ensure_active()?;

        let limit = self.config.get_max_topics()?;
        let topic = {
            let state = self.state.lock().unwrap();
            if state.registered.iter().any(|t| t.id == topic_id) {
                debug!("Topic {} already registered locally, no-op", topic_id);
                return Ok(());
            }
            if state.registered.len() >= limit {
                return Err(PushError::LimitExceeded { limit });
            }
            state
                .catalog
                .iter()
                .find(|t| t.id == topic_id)
                .cloned()
                .ok_or_else(|| {
                    PushError::NotFound(format!("Topic {} is not in the catalog", topic_id))
                })?
        };

        match self.api.register_topic(topic_id).await {
            Ok(()) => {}
            // The server already holds this registration; absorb it so the
            // set semantics hold
            Err(PushError::Conflict(msg)) => {
                debug!("Topic {} already registered server-side: {}", topic_id, msg);
            }
            Err(e) => return Err(e),
        }

        let mut state = self.state.lock().unwrap();
        if !state.registered.iter().any(|t| t.id == topic.id) {
            state.registered.push(topic);
        }
        Ok(())
    }

    /// Remove one topic registration
    pub async fn unregister_topic(&self, topic_id: &str) -> Result<()> {
        let _guard = self.begin_mutation()?;
        self.ensure_active()?;

        self.api.unregister_topic(topic_id).await?;

        let mut state = self.state.lock().unwrap();
        state.registered.retain(|t| t.id != topic_id);
        Ok(())
    }

    /// Set a preference flag on the server
    ///
    /// The local flag and the persisted mirror are updated only after the
    /// server confirmed the write.
    pub async fn set_preference(&self, kind: PreferenceKind, value: bool) -> Result<()> {
        let _guard = self.begin_mutation()?;
        self.ensure_active()?;

        self.api.write_preference(kind, value).await?;

        self.state.lock().unwrap().preferences.set(kind, value);
        if let Err(e) = self.config.set_mirrored_preference(kind, value) {
            warn!("Failed to update preference mirror: {}", e);
        }
        Ok(())
    }

    /// Revoke the token and all subscriptions, best-effort
    ///
    /// Both the provider-side token deletion and the server-side
    /// revocation are attempted unconditionally, so a failure of one can
    /// never leave the user unable to re-subscribe; each outcome is
    /// reported independently. Local state is cleared only when the
    /// server confirmed.
    pub async fn revoke_all(&self) -> Result<RevocationReport> {
        let _guard = self.begin_mutation()?;
        self.ensure_active()?;

        // Refresh the token before revoking, as at activation; fall back
        // to the session token when the provider refuses.
        let token = match self.provider.acquire_token().await {
            Ok(token) => {
                self.api.set_token(token.clone());
                self.state.lock().unwrap().token = Some(token.clone());
                token
            }
            Err(e) => {
                warn!("Token refresh before revocation failed: {}", e);
                match self.state.lock().unwrap().token.clone() {
                    Some(token) => token,
                    None => return Err(e.into()),
                }
            }
        };

        let provider_revoked = match self.provider.revoke_token(&token).await {
            Ok(revoked) => revoked,
            Err(e) => {
                warn!("Provider token revocation failed: {}", e);
                false
            }
        };

        let server_revoked = match self.api.revoke_all().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Server-side revocation failed: {}", e);
                false
            }
        };

        if server_revoked {
            {
                let mut state = self.state.lock().unwrap();
                state.registered.clear();
                state.preferences = Preferences::default();
            }
            if let Err(e) = self.config.reset_preference_mirror() {
                warn!("Failed to reset preference mirror: {}", e);
            }
        }

        info!(provider_revoked, server_revoked, "Revocation finished");
        Ok(RevocationReport {
            provider_revoked,
            server_revoked,
        })
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    /// Acquire the session-wide busy flag
    fn begin_mutation(&self) -> Result<MutationGuard<'_>> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(PushError::Busy);
        }
        Ok(MutationGuard { busy: &self.busy })
    }

    /// Mutations require an activated, non-blocked session
    fn ensure_active(&self) -> Result<()> {
        match self.phase() {
            SessionPhase::Ready | SessionPhase::Degraded => Ok(()),
            SessionPhase::PermissionBlocked => Err(PushError::PermissionBlocked),
            _ => Err(PushError::Other("Session is not activated".to_string())),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("Session")
            .field("phase", &state.phase)
            .field("registered", &state.registered.len())
            .field("catalog", &state.catalog.len())
            .field("busy", &self.busy.load(Ordering::Acquire))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vtntoken::{MemoryTokenProvider, PermissionState};

    fn test_session(permission: PermissionState) -> (TempDir, Session) {
        let dir = TempDir::new().unwrap();
        let config = Arc::new(Config::load_config(dir.path().to_str().unwrap()).unwrap());
        let provider = Arc::new(MemoryTokenProvider::new(permission));
        // Unroutable port: every remote call fails, which these tests
        // never reach anyway
        let api = SubscriptionApi::new("http://127.0.0.1:9").unwrap();
        (dir, Session::new(provider, api, config))
    }

    #[test]
    fn test_fresh_session_is_uninitialized() {
        let (_dir, session) = test_session(PermissionState::Granted);
        assert_eq!(session.phase(), SessionPhase::Uninitialized);
        assert!(!session.snapshot().busy);
    }

    #[tokio::test]
    async fn test_mutation_before_activation_is_rejected() {
        let (_dir, session) = test_session(PermissionState::Granted);
        assert!(matches!(
            session.register_topic("t1").await,
            Err(PushError::Other(_))
        ));
    }

    #[tokio::test]
    async fn test_permission_blocked_rejects_mutations() {
        let (_dir, session) = test_session(PermissionState::Denied);
        session.activate().await;
        assert_eq!(session.phase(), SessionPhase::PermissionBlocked);

        assert!(matches!(
            session.unregister_topic("t1").await,
            Err(PushError::PermissionBlocked)
        ));
    }

    #[tokio::test]
    async fn test_unsupported_environment_blocks_session() {
        let (_dir, session) = test_session(PermissionState::Unsupported);
        let snapshot = session.activate().await;
        assert_eq!(snapshot.phase, SessionPhase::PermissionBlocked);
        assert!(!snapshot.can_add_topic());
    }

    #[test]
    fn test_revocation_report() {
        let full = RevocationReport {
            provider_revoked: true,
            server_revoked: true,
        };
        assert!(full.fully_revoked());

        let partial = RevocationReport {
            provider_revoked: false,
            server_revoked: true,
        };
        assert!(!partial.fully_revoked());
    }

    #[test]
    fn test_busy_guard_releases_on_drop() {
        let (_dir, session) = test_session(PermissionState::Granted);

        let guard = session.begin_mutation().unwrap();
        assert!(matches!(session.begin_mutation(), Err(PushError::Busy)));

        drop(guard);
        assert!(session.begin_mutation().is_ok());
    }
}
