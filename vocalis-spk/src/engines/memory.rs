//! In-memory host.
//!
//! Engines, voices and per-locale answers are supplied up front; every call
//! is recorded. Failures can be injected per engine, per locale, or at
//! initialization.

use crate::engines::{LanguageSupport, LocaleProbe, QueueMode, SpeechHost};
use crate::error::SpeechError;
use crate::locale::LocaleTag;
use crate::voice::{EngineInfo, Voice, VoiceQuality, FEATURE_FEMALE_VOICE, FEATURE_MALE_VOICE};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// How `initialize` resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Ready,
    Failed(i32),
    VoiceDataMissing,
}

/// A call made against the host, in order
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Initialize(Option<String>),
    Engines,
    DefaultEngine,
    Voices(String),
    ProbeLocale(String, LocaleTag),
    DefaultVoice(String),
    SetEngine(String),
    SetLanguage(LocaleTag),
    SetVoice(String),
    Speak(String, QueueMode),
    Stop,
    Shutdown,
}

#[derive(Default)]
struct MemoryState {
    engines: Vec<EngineInfo>,
    default_engine: Option<String>,
    voices: HashMap<String, Vec<Voice>>,
    locale_probes: HashMap<(String, LocaleTag), LocaleProbe>,
    failing_engines: HashSet<String>,
    failing_locales: HashSet<LocaleTag>,
    default_voice: Option<Voice>,
    init_outcome: Option<InitOutcome>,
    latency: Option<Duration>,

    initialized: bool,
    shut_down: bool,
    active_engine: Option<String>,
    active_language: Option<LocaleTag>,
    active_voice: Option<String>,
    speaking: Option<String>,
    queued: Vec<String>,
    calls: Vec<HostCall>,
}

/// Data-driven `SpeechHost`
pub struct InMemoryHost {
    name: String,
    state: RwLock<MemoryState>,
}

impl InMemoryHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(MemoryState::default()),
        }
    }

    /// Register an engine and the voices its primary query returns.
    ///
    /// Voice `engine_id`s are rewritten to the engine's id.
    pub fn with_engine(self, engine: EngineInfo, voices: Vec<Voice>) -> Self {
        {
            let mut state = self.state.write();
            let voices = voices
                .into_iter()
                .map(|mut v| {
                    v.engine_id = engine.id.clone();
                    v
                })
                .collect();
            state.voices.insert(engine.id.clone(), voices);
            if state.default_engine.is_none() {
                state.default_engine = Some(engine.id.clone());
            }
            state.engines.push(engine);
        }
        self
    }

    pub fn with_default_engine(self, engine_id: impl Into<String>) -> Self {
        self.state.write().default_engine = Some(engine_id.into());
        self
    }

    /// Answer for `probe_locale(engine_id, locale)`; unknown pairs are `NotSupported`
    pub fn with_locale_probe(
        self,
        engine_id: &str,
        locale: LocaleTag,
        support: LanguageSupport,
        voices: Vec<Voice>,
    ) -> Self {
        let voices = voices
            .into_iter()
            .map(|mut v| {
                v.engine_id = engine_id.to_string();
                v
            })
            .collect();
        self.state
            .write()
            .locale_probes
            .insert((engine_id.to_string(), locale), LocaleProbe { support, voices });
        self
    }

    /// `voices(engine_id)` fails for this engine
    pub fn with_failing_engine(self, engine_id: impl Into<String>) -> Self {
        self.state.write().failing_engines.insert(engine_id.into());
        self
    }

    /// `probe_locale` and `set_language` fail for this locale
    pub fn with_failing_locale(self, locale: LocaleTag) -> Self {
        self.state.write().failing_locales.insert(locale);
        self
    }

    pub fn with_default_voice(self, voice: Voice) -> Self {
        self.state.write().default_voice = Some(voice);
        self
    }

    pub fn with_init_outcome(self, outcome: InitOutcome) -> Self {
        self.state.write().init_outcome = Some(outcome);
        self
    }

    /// Delay applied to every discovery query
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state.write().latency = Some(latency);
        self
    }

    /// A host preloaded with a few engines, for demos
    pub fn demo() -> Self {
        let google = EngineInfo::new("com.google.android.tts", "Speech Services by Google");
        let samsung = EngineInfo::new("com.samsung.SMT", "Samsung text-to-speech engine");
        let silent = EngineInfo::new("org.example.silent", "Silent engine");

        let g = |id: &str, tag: &str, quality: VoiceQuality| {
            let locale = LocaleTag::parse(tag).unwrap_or_else(|| LocaleTag::language("en"));
            Voice::new(id, locale, google.id.clone()).with_quality(quality)
        };

        let google_voices = vec![
            g("en-us-x-sfg-local", "en-US", VoiceQuality::VeryHigh).with_feature(FEATURE_FEMALE_VOICE),
            g("en-us-x-iom-local", "en-US", VoiceQuality::High).with_feature(FEATURE_MALE_VOICE),
            g("en-gb-x-gbb-network", "en-GB", VoiceQuality::Normal),
            g("es-es-x-eea-local", "es-ES", VoiceQuality::High),
            g("fr-fr-x-frd-local", "fr-FR", VoiceQuality::High).with_feature(FEATURE_MALE_VOICE),
            g("de-de-x-deb-local", "de-DE", VoiceQuality::Normal),
            g("it-it-x-itb-local", "it-IT", VoiceQuality::Normal),
            g("pt-br-x-afs-local", "pt-BR", VoiceQuality::Low),
            g("ja-jp-x-htm-local", "ja-JP", VoiceQuality::VeryLow),
        ];

        let samsung_voices = vec![
            Voice::new("SMTl01-female", LocaleTag::new("en", Some("US")), samsung.id.clone())
                .with_quality(VoiceQuality::High),
            Voice::new("SMTm01-male", LocaleTag::new("ko", Some("KR")), samsung.id.clone())
                .with_quality(VoiceQuality::from_level(450)),
        ];

        Self::new("demo")
            .with_engine(google, google_voices)
            .with_engine(samsung, samsung_voices)
            .with_engine(silent, Vec::new())
    }

    /// Recorded calls, oldest first
    pub fn calls(&self) -> Vec<HostCall> {
        self.state.read().calls.clone()
    }

    pub fn active_engine(&self) -> Option<String> {
        self.state.read().active_engine.clone()
    }

    pub fn active_language(&self) -> Option<LocaleTag> {
        self.state.read().active_language.clone()
    }

    pub fn active_voice(&self) -> Option<String> {
        self.state.read().active_voice.clone()
    }

    /// Utterance currently playing
    pub fn speaking(&self) -> Option<String> {
        self.state.read().speaking.clone()
    }

    /// Utterances queued behind the current one
    pub fn queued(&self) -> Vec<String> {
        self.state.read().queued.clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.state.read().shut_down
    }

    fn record(&self, call: HostCall) {
        self.state.write().calls.push(call);
    }

    async fn delay(&self) {
        let latency = self.state.read().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn ensure_connected(&self) -> Result<(), SpeechError> {
        let state = self.state.read();
        if state.shut_down {
            return Err(SpeechError::Engine(format!("{} host is shut down", self.name)));
        }
        if !state.initialized {
            return Err(SpeechError::Engine(format!("{} host is not initialized", self.name)));
        }
        Ok(())
    }
}

#[async_trait]
impl SpeechHost for InMemoryHost {
    async fn initialize(&self, engine: Option<&str>) -> Result<(), SpeechError> {
        self.record(HostCall::Initialize(engine.map(str::to_string)));
        self.delay().await;

        let mut state = self.state.write();
        match state.init_outcome.unwrap_or(InitOutcome::Ready) {
            InitOutcome::Ready => {}
            InitOutcome::Failed(code) => return Err(SpeechError::InitializationFailed(code)),
            InitOutcome::VoiceDataMissing => return Err(SpeechError::VoiceDataMissing),
        }

        if let Some(engine) = engine {
            if !state.engines.iter().any(|e| e.id == engine) {
                return Err(SpeechError::InitializationFailed(-1));
            }
            state.default_engine = Some(engine.to_string());
        }
        state.active_engine = state.default_engine.clone();
        state.initialized = true;
        Ok(())
    }

    async fn engines(&self) -> Result<Vec<EngineInfo>, SpeechError> {
        self.record(HostCall::Engines);
        self.delay().await;
        Ok(self.state.read().engines.clone())
    }

    async fn default_engine(&self) -> Result<String, SpeechError> {
        self.record(HostCall::DefaultEngine);
        self.state
            .read()
            .default_engine
            .clone()
            .ok_or_else(|| SpeechError::Engine("No default engine".to_string()))
    }

    async fn voices(&self, engine_id: &str) -> Result<Vec<Voice>, SpeechError> {
        self.record(HostCall::Voices(engine_id.to_string()));
        self.delay().await;

        let state = self.state.read();
        if state.failing_engines.contains(engine_id) {
            return Err(SpeechError::Engine(format!("Engine {} unreachable", engine_id)));
        }
        Ok(state.voices.get(engine_id).cloned().unwrap_or_default())
    }

    async fn probe_locale(&self, engine_id: &str, locale: &LocaleTag) -> Result<LocaleProbe, SpeechError> {
        self.record(HostCall::ProbeLocale(engine_id.to_string(), locale.clone()));
        self.delay().await;

        let state = self.state.read();
        if state.failing_locales.contains(locale) {
            return Err(SpeechError::Engine(format!("Probe for {} failed", locale)));
        }
        Ok(state
            .locale_probes
            .get(&(engine_id.to_string(), locale.clone()))
            .cloned()
            .unwrap_or_else(LocaleProbe::unsupported))
    }

    async fn default_voice(&self, engine_id: &str) -> Result<Option<Voice>, SpeechError> {
        self.record(HostCall::DefaultVoice(engine_id.to_string()));
        Ok(self.state.read().default_voice.clone())
    }

    async fn set_engine(&self, engine_id: &str) -> Result<(), SpeechError> {
        self.record(HostCall::SetEngine(engine_id.to_string()));
        self.ensure_connected()?;

        let mut state = self.state.write();
        if !state.engines.iter().any(|e| e.id == engine_id) {
            return Err(SpeechError::Engine(format!("Unknown engine: {}", engine_id)));
        }
        state.active_engine = Some(engine_id.to_string());
        Ok(())
    }

    async fn set_language(&self, locale: &LocaleTag) -> Result<LanguageSupport, SpeechError> {
        self.record(HostCall::SetLanguage(locale.clone()));
        self.ensure_connected()?;

        let mut state = self.state.write();
        if state.failing_locales.contains(locale) {
            return Err(SpeechError::Engine(format!("Cannot set language {}", locale)));
        }
        let engine = state.active_engine.clone().unwrap_or_default();
        let has_voice = state
            .voices
            .get(&engine)
            .map(|voices| voices.iter().any(|v| v.locale.language == locale.language))
            .unwrap_or(false);
        let support = state
            .locale_probes
            .get(&(engine, locale.clone()))
            .map(|probe| probe.support)
            .unwrap_or(if has_voice { LanguageSupport::Available } else { LanguageSupport::NotSupported });
        if support.is_usable() {
            state.active_language = Some(locale.clone());
        }
        Ok(support)
    }

    async fn set_voice(&self, voice: &Voice) -> Result<(), SpeechError> {
        self.record(HostCall::SetVoice(voice.id.clone()));
        self.ensure_connected()?;

        let mut state = self.state.write();
        state.active_voice = Some(voice.id.clone());
        state.active_language = Some(voice.locale.clone());
        Ok(())
    }

    async fn speak(&self, text: &str, mode: QueueMode) -> Result<(), SpeechError> {
        self.record(HostCall::Speak(text.to_string(), mode));
        self.ensure_connected()?;

        let mut state = self.state.write();
        match mode {
            QueueMode::Flush => {
                state.queued.clear();
                state.speaking = Some(text.to_string());
            }
            QueueMode::Add if state.speaking.is_some() => state.queued.push(text.to_string()),
            QueueMode::Add => state.speaking = Some(text.to_string()),
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), SpeechError> {
        self.record(HostCall::Stop);
        let mut state = self.state.write();
        state.speaking = None;
        state.queued.clear();
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), SpeechError> {
        self.record(HostCall::Shutdown);
        let mut state = self.state.write();
        state.speaking = None;
        state.queued.clear();
        state.initialized = false;
        state.shut_down = true;
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        self.state.read().speaking.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
