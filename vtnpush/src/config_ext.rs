//! Extension pour intégrer la souscription push dans vtnconfig
//!
//! Ce module fournit le trait `SubscriptionConfigExt` qui ajoute à
//! `vtnconfig::Config` les clés propres à la gestion de souscription :
//!
//! - la limite d'admission des topics (contrôle côté client, défaut 5)
//! - le miroir persisté des deux préférences (`checkbox-song`,
//!   `checkbox-info`), cache non-autoritatif de premier rendu
//!
//! Les valeurs miroir sont stockées en booléens encodés en chaîne
//! (`"true"`/`"false"`), pour rester compatibles avec le cache
//! localStorage du client d'origine.
//!
//! # Exemple
//!
//! ```no_run
//! use vtnconfig::get_config;
//! use vtnpush::SubscriptionConfigExt;
//! use vtnpush::PreferenceKind;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = get_config();
//!
//! let limit = config.get_max_topics()?;
//! println!("At most {} topics can be registered", limit);
//!
//! if let Some(song) = config.get_mirrored_preference(PreferenceKind::Song)? {
//!     println!("Last known song preference: {}", song);
//! }
//! # Ok(())
//! # }
//! ```

use crate::models::PreferenceKind;
use anyhow::Result;
use serde_yaml::Value;
use vtnconfig::Config;

/// Limite d'admission par défaut pour les enregistrements de topics
pub const DEFAULT_MAX_TOPICS: usize = 5;

/// Trait d'extension pour gérer la configuration de souscription
///
/// # Auto-persist des valeurs par défaut
///
/// `get_max_topics` persiste automatiquement la valeur par défaut dans la
/// configuration si elle n'existe pas encore.
pub trait SubscriptionConfigExt {
    /// Nombre maximum de topics enregistrables (défaut 5)
    ///
    /// C'est une limite d'admission côté client, vérifiée avant tout appel
    /// réseau ; elle n'est pas imposée par le serveur.
    fn get_max_topics(&self) -> Result<usize>;

    /// Définit la limite d'admission des topics
    fn set_max_topics(&self, limit: usize) -> Result<()>;

    /// Lit la valeur miroir d'une préférence
    ///
    /// `None` si aucune valeur n'a encore été mise en cache ou si la
    /// valeur stockée n'est pas un booléen encodé en chaîne.
    fn get_mirrored_preference(&self, kind: PreferenceKind) -> Result<Option<bool>>;

    /// Met en cache la valeur d'une préférence confirmée par le serveur
    fn set_mirrored_preference(&self, kind: PreferenceKind, value: bool) -> Result<()>;

    /// Réinitialise le miroir des deux préférences à `false`
    /// (appelé après une révocation globale réussie)
    fn reset_preference_mirror(&self) -> Result<()>;
}

impl SubscriptionConfigExt for Config {
    fn get_max_topics(&self) -> Result<usize> {
        match self.get_value(&["subscription", "max_topics"]) {
            Ok(Value::Number(n)) if n.as_u64().is_some() => Ok(n.as_u64().unwrap() as usize),
            _ => {
                // Non configuré ou invalide : persister le défaut
                self.set_max_topics(DEFAULT_MAX_TOPICS)?;
                Ok(DEFAULT_MAX_TOPICS)
            }
        }
    }

    fn set_max_topics(&self, limit: usize) -> Result<()> {
        self.set_value(
            &["subscription", "max_topics"],
            Value::Number(serde_yaml::Number::from(limit as u64)),
        )
    }

    fn get_mirrored_preference(&self, kind: PreferenceKind) -> Result<Option<bool>> {
        match self.get_value(&["subscription", kind.mirror_key()]) {
            Ok(Value::String(s)) => Ok(match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            }),
            _ => Ok(None),
        }
    }

    fn set_mirrored_preference(&self, kind: PreferenceKind, value: bool) -> Result<()> {
        self.set_value(
            &["subscription", kind.mirror_key()],
            Value::String(value.to_string()),
        )
    }

    fn reset_preference_mirror(&self) -> Result<()> {
        for kind in PreferenceKind::ALL {
            self.set_mirrored_preference(kind, false)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        (dir, config)
    }

    #[test]
    fn test_max_topics_default() {
        let (_dir, config) = temp_config();
        assert_eq!(config.get_max_topics().unwrap(), DEFAULT_MAX_TOPICS);
    }

    #[test]
    fn test_max_topics_roundtrip() {
        let (_dir, config) = temp_config();
        config.set_max_topics(3).unwrap();
        assert_eq!(config.get_max_topics().unwrap(), 3);
    }

    #[test]
    fn test_mirror_is_empty_by_default() {
        let (_dir, config) = temp_config();
        assert_eq!(
            config.get_mirrored_preference(PreferenceKind::Song).unwrap(),
            None
        );
    }

    #[test]
    fn test_mirror_roundtrip_string_encoded() {
        let (_dir, config) = temp_config();
        config
            .set_mirrored_preference(PreferenceKind::Song, true)
            .unwrap();

        // Stocké en chaîne pour compatibilité avec le cache d'origine
        let raw = config.get_value(&["subscription", "checkbox-song"]).unwrap();
        assert_eq!(raw, Value::String("true".to_string()));

        assert_eq!(
            config.get_mirrored_preference(PreferenceKind::Song).unwrap(),
            Some(true)
        );
    }

    #[test]
    fn test_reset_preference_mirror() {
        let (_dir, config) = temp_config();
        config
            .set_mirrored_preference(PreferenceKind::Song, true)
            .unwrap();
        config
            .set_mirrored_preference(PreferenceKind::Info, true)
            .unwrap();

        config.reset_preference_mirror().unwrap();

        assert_eq!(
            config.get_mirrored_preference(PreferenceKind::Song).unwrap(),
            Some(false)
        );
        assert_eq!(
            config.get_mirrored_preference(PreferenceKind::Info).unwrap(),
            Some(false)
        );
    }
}
