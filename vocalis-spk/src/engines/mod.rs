//! Host speech service backends

pub mod native;
pub mod memory;

use crate::error::SpeechError;
use crate::locale::LocaleTag;
use crate::voice::{EngineInfo, Voice};
use async_trait::async_trait;

/// How a new utterance interacts with speech already queued on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMode {
    /// Discard in-progress and queued speech, speak immediately
    Flush,
    /// Append after queued speech
    Add,
}

/// Host answer to "can this locale be spoken?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageSupport {
    Available,
    CountryAvailable,
    CountryVariantAvailable,
    MissingData,
    NotSupported,
}

impl LanguageSupport {
    pub fn is_usable(&self) -> bool {
        !matches!(self, LanguageSupport::MissingData | LanguageSupport::NotSupported)
    }
}

/// Result of probing one locale on one engine
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleProbe {
    pub support: LanguageSupport,
    /// Voices the engine exposes for the locale
    pub voices: Vec<Voice>,
}

impl LocaleProbe {
    pub fn unsupported() -> Self {
        Self { support: LanguageSupport::NotSupported, voices: Vec::new() }
    }
}

/// Trait for host speech-synthesis services.
///
/// Implementations talk to whatever the platform provides. Callers only use
/// these operations and their return values.
#[async_trait]
pub trait SpeechHost: Send + Sync {
    /// Prepare the synthesis backend, optionally pinned to a named engine
    async fn initialize(&self, engine: Option<&str>) -> Result<(), SpeechError>;

    /// Installed engines
    async fn engines(&self) -> Result<Vec<EngineInfo>, SpeechError>;

    /// Identifier of the default/active engine
    async fn default_engine(&self) -> Result<String, SpeechError>;

    /// Voices exposed by an engine
    async fn voices(&self, engine_id: &str) -> Result<Vec<Voice>, SpeechError>;

    /// Ask an engine about a locale without changing the active language
    async fn probe_locale(&self, engine_id: &str, locale: &LocaleTag) -> Result<LocaleProbe, SpeechError>;

    /// The engine's own default voice, if it has one
    async fn default_voice(&self, engine_id: &str) -> Result<Option<Voice>, SpeechError>;

    /// Switch the active engine
    async fn set_engine(&self, engine_id: &str) -> Result<(), SpeechError>;

    /// Switch the active language
    async fn set_language(&self, locale: &LocaleTag) -> Result<LanguageSupport, SpeechError>;

    /// Switch the active voice
    async fn set_voice(&self, voice: &Voice) -> Result<(), SpeechError>;

    /// Queue text for playback; returns once the request is accepted
    async fn speak(&self, text: &str, mode: QueueMode) -> Result<(), SpeechError>;

    /// Stop playback; no-op if nothing is playing
    async fn stop(&self) -> Result<(), SpeechError>;

    /// Release the host connection
    async fn shutdown(&self) -> Result<(), SpeechError>;

    /// Whether an utterance is still playing
    fn is_speaking(&self) -> bool;

    /// Get host name
    fn name(&self) -> &str;
}
