//! vocalis-spk: Voice discovery and speech control for host TTS engines
//!
//! Provides:
//! - A `SpeechHost` trait over the platform's speech service
//! - Native (espeak-ng / say) and in-memory host backends
//! - A voice catalog with language filtering and selection state
//! - A speech controller with an explicit initialization lifecycle
//! - A session type tying the two together for one UI session

pub mod error;
pub mod config;
pub mod locale;
pub mod voice;
pub mod engines;
pub mod catalog;
pub mod controller;
pub mod session;

pub use error::SpeechError;
pub use config::{SpeechConfig, CatalogConfig, PresentationConfig};
pub use locale::LocaleTag;
pub use voice::{EngineInfo, Voice, VoiceQuality, VoiceTag};
pub use engines::{SpeechHost, LanguageSupport, LocaleProbe, QueueMode};
pub use catalog::{CatalogSnapshot, EngineVoices, LanguageGroup, SelectionState, VoiceCatalog};
pub use controller::{ControllerState, SpeechController};
pub use session::VoiceSession;
