//! Gestion des erreurs pour le client de souscription

use thiserror::Error;
use vtntoken::TokenError;

/// Type Result personnalisé pour vtnpush
pub type Result<T> = std::result::Result<T, PushError>;

/// Erreurs possibles lors de l'utilisation du client de souscription
#[derive(Error, Debug)]
pub enum PushError {
    /// La permission de notification n'est pas accordée (état terminal,
    /// aucun appel distant n'est tenté)
    #[error("Notification permission is not granted")]
    PermissionBlocked,

    /// Erreur du provider de tokens (acquisition ou suppression)
    #[error("Push provider error: {0}")]
    Provider(String),

    /// Token invalide ou absent (401/403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Ressource non trouvée (préférence jamais enregistrée, topic inconnu)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Enregistrement déjà existant côté serveur (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Erreur HTTP
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Erreur de parsing JSON
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Erreur de configuration (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Erreur de l'API de souscription
    #[error("Subscription API error (code {code}): {message}")]
    ApiError { code: u16, message: String },

    /// Limite d'admission côté client atteinte (vérifiée avant tout appel réseau)
    #[error("Topic limit exceeded: at most {limit} topics can be registered")]
    LimitExceeded { limit: usize },

    /// Une mutation est déjà en cours pour cette session
    #[error("Another operation is already in flight")]
    Busy,

    /// Erreur générique
    #[error("Subscription error: {0}")]
    Other(String),
}

impl PushError {
    /// Crée une erreur API depuis un code de statut HTTP et un message
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 | 403 => Self::Unauthorized(message.into()),
            404 => Self::NotFound(message.into()),
            409 => Self::Conflict(message.into()),
            _ => Self::ApiError {
                code,
                message: message.into(),
            },
        }
    }

    /// Vérifie si l'erreur est une erreur de credentials (401/403)
    pub fn is_auth_error(&self) -> bool {
        matches!(self, PushError::Unauthorized(_))
    }

    /// Vérifie si l'erreur vient de la limite d'admission côté client
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, PushError::LimitExceeded { .. })
    }
}

impl From<TokenError> for PushError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::PermissionDenied | TokenError::Unsupported => Self::PermissionBlocked,
            TokenError::Provider(msg) => Self::Provider(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_code() {
        assert!(matches!(
            PushError::from_status_code(401, "bad token"),
            PushError::Unauthorized(_)
        ));
        assert!(matches!(
            PushError::from_status_code(403, "forbidden"),
            PushError::Unauthorized(_)
        ));
        assert!(matches!(
            PushError::from_status_code(404, "no subscription"),
            PushError::NotFound(_)
        ));
        assert!(matches!(
            PushError::from_status_code(409, "already registered"),
            PushError::Conflict(_)
        ));
        assert!(matches!(
            PushError::from_status_code(500, "boom"),
            PushError::ApiError { code: 500, .. }
        ));
    }

    #[test]
    fn test_is_auth_error() {
        assert!(PushError::from_status_code(401, "x").is_auth_error());
        assert!(!PushError::from_status_code(404, "x").is_auth_error());
    }

    #[test]
    fn test_token_error_mapping() {
        assert!(matches!(
            PushError::from(TokenError::PermissionDenied),
            PushError::PermissionBlocked
        ));
        assert!(matches!(
            PushError::from(TokenError::Unsupported),
            PushError::PermissionBlocked
        ));
        assert!(matches!(
            PushError::from(TokenError::provider("down")),
            PushError::Provider(_)
        ));
    }
}
