//! Lecture et écriture des drapeaux de préférence (`song`, `info`)

use super::SubscriptionApi;
use crate::error::Result;
use crate::models::{PreferenceKind, StatusResponse};
use reqwest::Method;
use serde_json::json;
use tracing::debug;

impl SubscriptionApi {
    /// Lit le drapeau d'une catégorie de notification
    ///
    /// L'absence de souscription préalable est signalée par le serveur avec
    /// un 404 explicite, remonté tel quel (`PushError::NotFound`) pour que
    /// l'UI puisse désactiver le contrôle plutôt que planter.
    pub async fn read_preference(&self, kind: PreferenceKind) -> Result<bool> {
        debug!("Reading {} preference", kind);
        let response: StatusResponse = self.get_json(kind.endpoint()).await?;
        Ok(response.status)
    }

    /// Écrit le drapeau d'une catégorie de notification
    ///
    /// Le serveur fait un upsert sur (token, catégorie) ; l'appel est donc
    /// idempotent côté client.
    pub async fn write_preference(&self, kind: PreferenceKind, status: bool) -> Result<()> {
        debug!("Writing {} preference: {}", kind, status);
        self.send_command(Method::POST, kind.endpoint(), Some(json!({ "status": status })))
            .await
    }
}
