//! One UI session: a controller and a catalog over the same host

use crate::catalog::{group_by_language, CatalogSnapshot, LanguageGroup, SelectionState, VoiceCatalog};
use crate::config::{PresentationConfig, SpeechConfig};
use crate::controller::{ControllerState, SpeechController};
use crate::engines::SpeechHost;
use crate::error::SpeechError;
use crate::locale::LocaleTag;
use crate::voice::Voice;
use std::sync::Arc;
use tracing::{info, warn};

/// Owns the speech controller and voice catalog for one session.
///
/// All user intents go through here. Selection changes are pure catalog
/// operations first; the host is then told about the new engine/voice on a
/// best-effort basis.
pub struct VoiceSession {
    controller: SpeechController,
    catalog: VoiceCatalog,
    presentation: PresentationConfig,
    preferred_locales: Vec<LocaleTag>,
}

impl VoiceSession {
    /// Initialize the host, discover voices and apply the initial language.
    ///
    /// If any step fails the controller is disposed before the error returns.
    pub async fn start(host: Arc<dyn SpeechHost>, config: SpeechConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Config)?;

        let mut controller = SpeechController::new(Arc::clone(&host));
        controller.initialize(config.catalog.preferred_engine.as_deref()).await?;

        let preferred_locales = config.catalog.preferred_locale_tags();
        let mut catalog = VoiceCatalog::new(host, config.catalog);
        if let Err(e) = catalog.refresh(&preferred_locales).await {
            if let Err(dispose_err) = controller.dispose().await {
                warn!("Dispose after failed discovery failed: {}", dispose_err);
            }
            return Err(e);
        }

        let mut session = Self {
            controller,
            catalog,
            presentation: config.presentation,
            preferred_locales,
        };

        if let Some(language) = session.presentation.initial_language.clone() {
            let applied = session.catalog.select_language(&language).map(|_| ());
            if let Err(e) = applied {
                return Err(session.abort(e).await);
            }
        }
        session.push_selection().await;

        info!("Voice session started: {}", session.presentation.title);
        Ok(session)
    }

    async fn abort(self, error: SpeechError) -> SpeechError {
        if let Err(dispose_err) = self.controller.dispose().await {
            warn!("Dispose after failed session start failed: {}", dispose_err);
        }
        error
    }

    pub fn presentation(&self) -> &PresentationConfig {
        &self.presentation
    }

    pub fn controller_state(&self) -> &ControllerState {
        self.controller.state()
    }

    pub fn snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
        self.catalog.snapshot()
    }

    pub fn selection(&self) -> &SelectionState {
        self.catalog.selection()
    }

    /// Languages for the language filter, limited by the presentation profile
    pub fn languages(&self) -> Vec<String> {
        self.snapshot()
            .map(|s| s.list_languages(self.presentation.allowed_languages.as_deref()))
            .unwrap_or_default()
    }

    /// Voices of the active engine, narrowed by the language filter
    pub fn voices(&self) -> Vec<Voice> {
        self.catalog.available_voices()
    }

    pub fn grouped_voices(&self) -> Vec<LanguageGroup> {
        group_by_language(&self.voices())
    }

    /// Whether an engine picker is worth showing
    pub fn show_engine_picker(&self) -> bool {
        self.presentation.show_engine_picker
            && self.snapshot().map_or(false, |s| s.engines.len() > 1)
    }

    /// Sample paragraph for the current language filter (or the voice's language)
    pub fn sample_text(&self) -> &str {
        let selection = self.catalog.selection();
        let language = selection.language().or_else(|| selection.voice().map(|v| v.language()));
        self.presentation.sample_text(language)
    }

    /// Rediscover voices, keeping the selection where possible
    pub async fn refresh(&mut self) -> Result<Arc<CatalogSnapshot>, SpeechError> {
        let snapshot = self.catalog.refresh(&self.preferred_locales).await?;
        self.push_selection().await;
        Ok(snapshot)
    }

    pub async fn select_engine(&mut self, engine_id: &str) -> Result<&SelectionState, SpeechError> {
        self.catalog.select_engine(engine_id)?;
        self.push_selection().await;
        Ok(self.catalog.selection())
    }

    pub async fn select_voice(&mut self, voice_id: &str) -> Result<&SelectionState, SpeechError> {
        self.catalog.select_voice(voice_id)?;
        self.push_selection().await;
        Ok(self.catalog.selection())
    }

    pub async fn select_language(&mut self, language: &str) -> Result<&SelectionState, SpeechError> {
        self.catalog.select_language(language)?;
        self.push_selection().await;
        Ok(self.catalog.selection())
    }

    /// Speak with the selected voice, interrupting current playback
    pub async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        self.controller.speak(text, self.catalog.selection().voice()).await
    }

    /// Speak the presentation profile's sample for the current language
    pub async fn speak_sample(&self) -> Result<(), SpeechError> {
        self.speak(self.sample_text()).await
    }

    pub fn is_speaking(&self) -> bool {
        self.controller.is_speaking()
    }

    pub async fn stop(&self) -> Result<(), SpeechError> {
        self.controller.stop().await
    }

    /// End the session and release the host
    pub async fn close(self) -> Result<(), SpeechError> {
        self.controller.dispose().await
    }

    /// Tell the host about the current engine and voice; failures are logged
    async fn push_selection(&self) {
        if !self.controller.is_ready() {
            return;
        }
        let host = self.controller.host();
        let selection = self.catalog.selection();

        if let Some(engine_id) = selection.engine_id() {
            if let Err(e) = host.set_engine(engine_id).await {
                warn!("Host rejected engine {}: {}", engine_id, e);
            }
        }
        if let Some(voice) = selection.voice() {
            if let Err(e) = host.set_voice(voice).await {
                warn!("Host rejected voice {}: {}", voice.id, e);
            }
        }
    }
}
