//! Couche d'accès à l'API REST de souscription
//!
//! Ce module fournit une interface bas-niveau pour communiquer avec le
//! serveur de souscription. Chaque requête est authentifiée par le token
//! push courant ; aucune tentative de retry n'est faite, la politique de
//! retry appartient aux couches supérieures (qui n'en ont pas non plus).

pub mod preferences;
pub mod topics;

use crate::error::{PushError, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, warn};
use vtntoken::Token;

/// Timeout par défaut des requêtes HTTP (secondes)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client API bas-niveau pour communiquer avec le serveur de souscription
///
/// Le token courant est partagé par tous les appels distants d'une session ;
/// il n'est jamais rafraîchi en cours de session (uniquement à l'activation
/// et lors d'une révocation explicite).
pub struct SubscriptionApi {
    /// Client HTTP
    client: Client,
    /// URL de base de l'API
    base_url: String,
    /// Token push courant, credential bearer de toutes les requêtes
    token: RwLock<Option<Token>>,
}

impl SubscriptionApi {
    /// Crée une nouvelle instance de l'API avec le timeout par défaut
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Crée une instance avec un timeout personnalisé
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: RwLock::new(None),
        })
    }

    /// Retourne l'URL de base
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Définit le token push courant
    pub fn set_token(&self, token: Token) {
        *self.token.write().unwrap() = Some(token);
    }

    /// Oublie le token courant
    pub fn clear_token(&self) {
        *self.token.write().unwrap() = None;
    }

    /// Retourne le token courant si disponible
    pub fn token(&self) -> Option<Token> {
        self.token.read().unwrap().clone()
    }

    /// Vérifie qu'un token est disponible
    pub(crate) fn ensure_token(&self) -> Result<Token> {
        self.token()
            .ok_or_else(|| PushError::Unauthorized("No push token for this session".to_string()))
    }

    /// Effectue une requête GET et désérialise la réponse JSON
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let response = self.request(Method::GET, endpoint, None).await?;
        let text = Self::success_text(response).await?;

        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse response from {}: {}", endpoint, e);
            PushError::JsonParse(e)
        })
    }

    /// Effectue une requête de mutation ; seul le statut HTTP compte
    ///
    /// Le serveur répond en texte brut sur les mutations, le corps de la
    /// réponse est donc ignoré.
    pub(crate) async fn send_command(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<()> {
        let response = self.request(method, endpoint, body).await?;
        Self::success_text(response).await?;
        Ok(())
    }

    /// Construit et envoie une requête authentifiée
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        let token = self.ensure_token()?;

        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);

        // Le préfixe contient bien un ':' après "Bearer" : le serveur
        // d'origine découpe sur l'espace, le préfixe exact est conservé
        // pour compatibilité wire.
        request = request.header(AUTHORIZATION, format!("Bearer: {}", token.as_str()));

        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        Ok(request.send().await?)
    }

    /// Traite la réponse HTTP : non-2xx devient une erreur typée
    async fn success_text(response: Response) -> Result<String> {
        let status = response.status();
        let status_code = status.as_u16();

        debug!("Response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("API error ({}): {}", status_code, error_text);
            return Err(PushError::from_status_code(status_code, error_text));
        }

        Ok(response.text().await?)
    }
}

impl std::fmt::Debug for SubscriptionApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionApi")
            .field("base_url", &self.base_url)
            .field("has_token", &self.token().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_creation() {
        let api = SubscriptionApi::new("http://localhost:8080").unwrap();
        assert_eq!(api.base_url(), "http://localhost:8080");
        assert!(api.token().is_none());
    }

    #[test]
    fn test_set_and_clear_token() {
        let api = SubscriptionApi::new("http://localhost:8080").unwrap();
        api.set_token(Token::new("tok-1"));
        assert_eq!(api.token().unwrap().as_str(), "tok-1");

        api.clear_token();
        assert!(api.token().is_none());
    }

    #[test]
    fn test_ensure_token_without_token() {
        let api = SubscriptionApi::new("http://localhost:8080").unwrap();
        assert!(matches!(
            api.ensure_token(),
            Err(PushError::Unauthorized(_))
        ));
    }
}
