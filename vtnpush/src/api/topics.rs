//! Enregistrements de topics et révocation globale

use super::SubscriptionApi;
use crate::error::{PushError, Result};
use crate::models::{Topic, TopicIdBody};
use reqwest::Method;
use tracing::debug;

impl SubscriptionApi {
    /// Récupère les topics enregistrés pour le token courant
    ///
    /// Le serveur répond 404 quand l'abonné n'a encore aucun
    /// enregistrement ; ce cas est normalisé en liste vide.
    pub async fn list_registered(&self) -> Result<Vec<Topic>> {
        debug!("Listing registered topics");
        match self.get_json::<Vec<Topic>>("/api/topic").await {
            Ok(topics) => Ok(topics),
            Err(PushError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Récupère le catalogue complet des topics disponibles
    pub async fn list_catalog(&self) -> Result<Vec<Topic>> {
        debug!("Listing topic catalog");
        self.get_json("/api/topic/list").await
    }

    /// Enregistre le token courant sur un topic
    ///
    /// Un non-2xx est un échec réel : l'appelant ne doit rien appliquer
    /// localement dans ce cas.
    pub async fn register_topic(&self, topic_id: &str) -> Result<()> {
        debug!("Registering topic {}", topic_id);
        let body = serde_json::to_value(TopicIdBody { topic_id })?;
        self.send_command(Method::POST, "/api/topic", Some(body))
            .await
    }

    /// Supprime un enregistrement de topic
    pub async fn unregister_topic(&self, topic_id: &str) -> Result<()> {
        debug!("Unregistering topic {}", topic_id);
        let body = serde_json::to_value(TopicIdBody { topic_id })?;
        self.send_command(Method::DELETE, "/api/topic", Some(body))
            .await
    }

    /// Révocation côté serveur : efface préférences et enregistrements
    /// pour le token courant
    pub async fn revoke_all(&self) -> Result<()> {
        debug!("Revoking all subscriptions server-side");
        self.send_command(Method::POST, "/api/unsubscription", None)
            .await
    }
}
