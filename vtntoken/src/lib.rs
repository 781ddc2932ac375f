//! # VTNToken
//!
//! Push-token provider abstraction for VTNotify.
//!
//! This crate defines the contract between the subscription client and the
//! platform push-messaging capability: obtaining a device token, revoking
//! it, and reporting the notification permission state. Concrete providers
//! (FCM, a browser bridge, a test double) implement [`PushTokenProvider`];
//! the reconciliation layer in `vtnpush` only ever sees the trait.
//!
//! ## Design
//!
//! - **No retries**: a provider call either succeeds or fails once; retry
//!   policy belongs to callers, and the subscription client deliberately
//!   has none.
//! - **Send + Sync**: providers are shared behind `Arc<dyn PushTokenProvider>`
//!   across async tasks.
//! - **Tokens are session-scoped**: a [`Token`] is re-derived on every
//!   activation and never persisted.
//!
//! ## Usage
//!
//! ```rust
//! use vtntoken::{MemoryTokenProvider, PermissionState, PushTokenProvider};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> vtntoken::Result<()> {
//!     let provider = MemoryTokenProvider::new(PermissionState::Granted);
//!     let token = provider.acquire_token().await?;
//!     assert!(provider.revoke_token(&token).await?);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

pub use async_trait::async_trait;

/// Result type for token provider operations
pub type Result<T> = std::result::Result<T, TokenError>;

/// Errors a push-token provider can report
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Notification permission is denied; no token can be issued
    #[error("Notification permission denied")]
    PermissionDenied,

    /// The host environment has no push-notification capability
    #[error("Push notifications are not supported in this environment")]
    Unsupported,

    /// Provider-side failure (registration table, transport, rotation)
    #[error("Provider error: {0}")]
    Provider(String),
}

impl TokenError {
    /// Create a provider error from a message
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }
}

/// Notification permission state as reported by the host environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// The user granted notification permission
    Granted,
    /// The user explicitly blocked notifications
    Denied,
    /// Permission has not been requested yet
    Default,
    /// The environment has no notification capability at all
    Unsupported,
}

impl PermissionState {
    /// True only for [`PermissionState::Granted`]
    pub fn is_granted(self) -> bool {
        matches!(self, PermissionState::Granted)
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
            PermissionState::Default => "default",
            PermissionState::Unsupported => "unsupported",
        };
        f.write_str(s)
    }
}

/// Opaque push-messaging registration identifier for a device/app instance
///
/// The inner string is meaningful only to the push provider and the remote
/// API; this client treats it as a bearer credential for the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token(String);

impl Token {
    /// Wrap a raw provider token
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw token string, as sent on the wire
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Token {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Contract between the subscription client and the push-messaging platform
///
/// Implementations wrap the actual provider SDK. They perform no retries
/// and no server-side cleanup: revoking a token only touches the provider's
/// registration table, and the caller is responsible for the matching
/// server-side revocation call.
#[async_trait]
pub trait PushTokenProvider: Send + Sync {
    /// Current notification permission state
    fn permission_state(&self) -> PermissionState;

    /// Issue (or refresh) the device token
    ///
    /// Must only be called when [`permission_state`](Self::permission_state)
    /// is `Granted`; implementations return [`TokenError::PermissionDenied`]
    /// otherwise. Permission prompting itself is out of scope here and is
    /// assumed resolved before activation.
    async fn acquire_token(&self) -> Result<Token>;

    /// Delete the token from the provider's registration table
    ///
    /// Returns `false` when the provider had no matching registration.
    /// Either way the server-side subscription is untouched; callers must
    /// issue the separate server revocation.
    async fn revoke_token(&self, token: &Token) -> Result<bool>;
}

/// Deterministic in-memory provider
///
/// Reference implementation used by examples and tests: issues
/// monotonically numbered tokens, keeps a registration table for
/// revocation, and exposes failure switches so callers can exercise
/// degraded paths.
pub struct MemoryTokenProvider {
    permission: Mutex<PermissionState>,
    counter: AtomicU64,
    issued: Mutex<HashSet<Token>>,
    fail_acquire: AtomicBool,
    fail_revoke: AtomicBool,
}

impl MemoryTokenProvider {
    /// Create a provider reporting the given permission state
    pub fn new(permission: PermissionState) -> Self {
        Self {
            permission: Mutex::new(permission),
            counter: AtomicU64::new(0),
            issued: Mutex::new(HashSet::new()),
            fail_acquire: AtomicBool::new(false),
            fail_revoke: AtomicBool::new(false),
        }
    }

    /// Change the reported permission state
    pub fn set_permission(&self, permission: PermissionState) {
        *self.permission.lock().unwrap() = permission;
    }

    /// Make the next `acquire_token` calls fail with a provider error
    pub fn set_fail_acquire(&self, fail: bool) {
        self.fail_acquire.store(fail, Ordering::SeqCst);
    }

    /// Make the next `revoke_token` calls fail with a provider error
    pub fn set_fail_revoke(&self, fail: bool) {
        self.fail_revoke.store(fail, Ordering::SeqCst);
    }

    /// Number of tokens currently registered with the provider
    pub fn registered_count(&self) -> usize {
        self.issued.lock().unwrap().len()
    }
}

impl Default for MemoryTokenProvider {
    fn default() -> Self {
        Self::new(PermissionState::Granted)
    }
}

#[async_trait]
impl PushTokenProvider for MemoryTokenProvider {
    fn permission_state(&self) -> PermissionState {
        *self.permission.lock().unwrap()
    }

    async fn acquire_token(&self) -> Result<Token> {
        match self.permission_state() {
            PermissionState::Granted => {}
            PermissionState::Unsupported => return Err(TokenError::Unsupported),
            _ => return Err(TokenError::PermissionDenied),
        }

        if self.fail_acquire.load(Ordering::SeqCst) {
            return Err(TokenError::provider("simulated acquisition failure"));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let token = Token::new(format!("mem-token-{n}"));
        self.issued.lock().unwrap().insert(token.clone());
        debug!(token = %token, "Issued in-memory token");
        Ok(token)
    }

    async fn revoke_token(&self, token: &Token) -> Result<bool> {
        if self.fail_revoke.load(Ordering::SeqCst) {
            return Err(TokenError::provider("simulated revocation failure"));
        }

        let removed = self.issued.lock().unwrap().remove(token);
        debug!(token = %token, removed, "Revoked in-memory token");
        Ok(removed)
    }
}
