//! Structures de données échangées avec l'API de souscription

use serde::{Deserialize, Deserializer, Serialize};

/// Désérialiseur flexible pour les IDs qui peuvent être des strings ou des integers
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(Error::custom("ID must be a string or number")),
    }
}

/// Un topic : filtre par mot-clé auquel un abonné peut s'enregistrer
///
/// Le catalogue complet des topics est détenu par le serveur et en lecture
/// seule pour ce client. Les noms de champs sur le wire (`ID`, `Name`)
/// suivent le serveur d'origine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    /// Identifiant unique du topic
    #[serde(rename = "ID", deserialize_with = "deserialize_id")]
    pub id: String,
    /// Nom affiché du topic
    #[serde(rename = "Name")]
    pub name: String,
}

impl Topic {
    /// Crée un topic (surtout utile pour les tests)
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Catégorie de notification gérée par une préférence booléenne
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceKind {
    /// Notifications pour les nouvelles vidéos de chant
    Song,
    /// Notifications d'information générale
    Info,
}

impl PreferenceKind {
    /// Chemin de l'endpoint HTTP correspondant
    pub fn endpoint(self) -> &'static str {
        match self {
            PreferenceKind::Song => "/api/song",
            PreferenceKind::Info => "/api/info",
        }
    }

    /// Clé du miroir persisté localement (cache d'affichage rapide)
    pub fn mirror_key(self) -> &'static str {
        match self {
            PreferenceKind::Song => "checkbox-song",
            PreferenceKind::Info => "checkbox-info",
        }
    }

    /// Les deux catégories, dans l'ordre d'affichage
    pub const ALL: [PreferenceKind; 2] = [PreferenceKind::Song, PreferenceKind::Info];
}

impl std::fmt::Display for PreferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PreferenceKind::Song => "song",
            PreferenceKind::Info => "info",
        };
        f.write_str(s)
    }
}

/// Les deux drapeaux de préférence d'un abonné
///
/// La copie serveur fait autorité ; la copie locale n'existe que pour
/// l'affichage et le cache de premier rendu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Notifications "chant" activées
    pub song: bool,
    /// Notifications "info" activées
    pub info: bool,
}

impl Preferences {
    /// Lit le drapeau d'une catégorie
    pub fn get(&self, kind: PreferenceKind) -> bool {
        match kind {
            PreferenceKind::Song => self.song,
            PreferenceKind::Info => self.info,
        }
    }

    /// Écrit le drapeau d'une catégorie
    pub fn set(&mut self, kind: PreferenceKind, value: bool) {
        match kind {
            PreferenceKind::Song => self.song = value,
            PreferenceKind::Info => self.info = value,
        }
    }
}

/// Réponse des endpoints de préférence (`{"status": bool}`)
#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    pub status: bool,
}

/// Corps des requêtes d'enregistrement/désenregistrement de topic
#[derive(Debug, Serialize)]
pub(crate) struct TopicIdBody<'a> {
    pub topic_id: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_wire_field_names() {
        let topic: Topic = serde_json::from_str(r#"{"ID":"t1","Name":"anime"}"#).unwrap();
        assert_eq!(topic, Topic::new("t1", "anime"));

        let json = serde_json::to_string(&topic).unwrap();
        assert!(json.contains(r#""ID":"t1""#));
        assert!(json.contains(r#""Name":"anime""#));
    }

    #[test]
    fn test_topic_numeric_id() {
        let topic: Topic = serde_json::from_str(r#"{"ID":42,"Name":"game"}"#).unwrap();
        assert_eq!(topic.id, "42");
    }

    #[test]
    fn test_preference_endpoints() {
        assert_eq!(PreferenceKind::Song.endpoint(), "/api/song");
        assert_eq!(PreferenceKind::Info.endpoint(), "/api/info");
        assert_eq!(PreferenceKind::Song.mirror_key(), "checkbox-song");
        assert_eq!(PreferenceKind::Info.mirror_key(), "checkbox-info");
    }

    #[test]
    fn test_preferences_get_set() {
        let mut prefs = Preferences::default();
        assert!(!prefs.get(PreferenceKind::Song));

        prefs.set(PreferenceKind::Song, true);
        assert!(prefs.song);
        assert!(!prefs.info);

        prefs.set(PreferenceKind::Info, true);
        assert!(prefs.get(PreferenceKind::Info));
    }

    #[test]
    fn test_status_response() {
        let r: StatusResponse = serde_json::from_str(r#"{"status":true}"#).unwrap();
        assert!(r.status);
    }

    #[test]
    fn test_topic_id_body() {
        let body = serde_json::to_string(&TopicIdBody { topic_id: "t9" }).unwrap();
        assert_eq!(body, r#"{"topic_id":"t9"}"#);
    }
}
