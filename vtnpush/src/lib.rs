//! # VTNotify - Client d'abonnement aux notifications push
//!
//! Cette bibliothèque fournit un client complet pour le service de
//! notifications VTNotify : cycle de vie du jeton push, préférences de
//! notification (chansons et annonces), et inscriptions aux sujets avec
//! limite d'admission.
//!
//! ## Architecture
//!
//! Le crate est organisé autour d'une session avec état qui réconcilie
//! trois sources de vérité : le fournisseur de jetons, le serveur
//! distant, et l'état local affiché.
//!
//! ```text
//! vtnpush
//! ├── api            - Client HTTP bas niveau (reqwest)
//! │   ├── preferences - Lecture/écriture des préférences
//! │   └── topics      - Catalogue, inscriptions, révocation
//! ├── session        - Session réconciliatrice (activation, mutations)
//! ├── view           - Instantanés d'état et intentions utilisateur
//! ├── models         - Types de données partagés
//! ├── config_ext     - Extension de configuration (limite, miroir)
//! └── error          - Types d'erreur du crate
//! ```
//!
//! ## Exemple
//!
//! ```no_run
//! use std::sync::Arc;
//! use vtnpush::{Session, Intent, PreferenceKind};
//! use vtntoken::{MemoryTokenProvider, PermissionState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = Arc::new(MemoryTokenProvider::new(PermissionState::Granted));
//!     let session = Session::from_config(provider)?;
//!
//!     let snapshot = session.activate().await;
//!     println!("Phase: {:?}", snapshot.phase);
//!
//!     let outcome = session
//!         .dispatch(Intent::SetPreference(PreferenceKind::Song, true))
//!         .await;
//!     for notice in &outcome.notices {
//!         println!("{:?}", notice);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config_ext;
pub mod error;
pub mod models;
pub mod session;
pub mod view;

pub use api::SubscriptionApi;
pub use config_ext::{SubscriptionConfigExt, DEFAULT_MAX_TOPICS};
pub use error::{PushError, Result};
pub use models::{PreferenceKind, Preferences, Topic};
pub use session::{RevocationReport, Session, SessionPhase};
pub use view::{DegradedViews, DispatchOutcome, Intent, Notice, StateSnapshot};
