//! Native platform speech host
//!
//! Drives the platform's command-line synthesizer: `say` on macOS,
//! `espeak-ng` everywhere else. Playback runs in a child process that is
//! killed on flush, stop and shutdown.

use crate::engines::{LanguageSupport, LocaleProbe, QueueMode, SpeechHost};
use crate::error::SpeechError;
use crate::locale::LocaleTag;
use crate::voice::{EngineInfo, Voice, FEATURE_FEMALE_VOICE, FEATURE_MALE_VOICE};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

const MAX_TEXT_LENGTH: usize = 100_000;
const MAX_VOICES: usize = 1000;

/// Command-line synthesizer used by `NativeHost`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeBackend {
    EspeakNg,
    Say,
}

impl NativeBackend {
    /// Backend for the current platform
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            NativeBackend::Say
        } else {
            NativeBackend::EspeakNg
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            NativeBackend::EspeakNg => "espeak-ng",
            NativeBackend::Say => "say",
        }
    }

    pub fn engine_info(&self) -> EngineInfo {
        match self {
            NativeBackend::EspeakNg => EngineInfo::new("espeak-ng", "eSpeak NG"),
            NativeBackend::Say => EngineInfo::new("say", "macOS Speech"),
        }
    }
}

/// Native speech host (platform-specific)
pub struct NativeHost {
    backend: NativeBackend,
    /// Speech rate in words per minute
    rate: u32,
    initialized: RwLock<bool>,
    language: RwLock<Option<LocaleTag>>,
    voice: RwLock<Option<Voice>>,
    playback: Mutex<Option<Child>>,
}

impl NativeHost {
    pub fn new() -> Self {
        Self::with_backend(NativeBackend::detect(), 175)
    }

    pub fn with_backend(backend: NativeBackend, rate: u32) -> Self {
        Self {
            backend,
            rate: rate.clamp(80, 500),
            initialized: RwLock::new(false),
            language: RwLock::new(None),
            voice: RwLock::new(None),
            playback: Mutex::new(None),
        }
    }

    pub fn backend(&self) -> NativeBackend {
        self.backend
    }

    fn check_engine(&self, engine_id: &str) -> Result<(), SpeechError> {
        if engine_id != self.backend.program() {
            return Err(SpeechError::Engine(format!(
                "Unknown engine {} (this host only provides {})",
                engine_id,
                self.backend.program()
            )));
        }
        Ok(())
    }

    async fn list_voices(&self) -> Result<Vec<Voice>, SpeechError> {
        let mut cmd = Command::new(self.backend.program());
        match self.backend {
            NativeBackend::EspeakNg => cmd.arg("--voices"),
            NativeBackend::Say => cmd.arg("-v").arg("?"),
        };

        let output = cmd
            .output()
            .await
            .map_err(|e| SpeechError::Engine(format!("Failed to list voices: {}", e)))?;

        if !output.status.success() {
            return Err(SpeechError::Engine(format!(
                "{} voice listing failed: {}",
                self.backend.program(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let engine_id = self.backend.program();
        let voices = match self.backend {
            NativeBackend::EspeakNg => parse_espeak_voices(&stdout, engine_id),
            NativeBackend::Say => parse_say_voices(&stdout, engine_id),
        };
        debug!("{} reported {} voices", engine_id, voices.len());
        Ok(voices)
    }

    fn kill_playback(&self) {
        if let Some(mut child) = self.playback.lock().take() {
            if let Err(e) = child.start_kill() {
                // Already exited
                debug!("Playback process not killed: {}", e);
            }
        }
    }

    fn is_playing(&self) -> bool {
        let mut guard = self.playback.lock();
        match guard.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}

impl Default for NativeHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechHost for NativeHost {
    async fn initialize(&self, engine: Option<&str>) -> Result<(), SpeechError> {
        if let Some(engine) = engine {
            if engine != self.backend.program() {
                warn!("Requested engine {} is not available on this platform", engine);
                return Err(SpeechError::InitializationFailed(-1));
            }
        }

        // `say` has no version flag, so probe with the voice listing for both
        let voices = self.list_voices().await.map_err(|e| {
            warn!("Native TTS probe failed: {}", e);
            SpeechError::InitializationFailed(-1)
        })?;

        if voices.is_empty() {
            return Err(SpeechError::VoiceDataMissing);
        }

        *self.initialized.write() = true;
        info!("Native {} host initialized", self.backend.program());
        Ok(())
    }

    async fn engines(&self) -> Result<Vec<EngineInfo>, SpeechError> {
        Ok(vec![self.backend.engine_info()])
    }

    async fn default_engine(&self) -> Result<String, SpeechError> {
        Ok(self.backend.program().to_string())
    }

    async fn voices(&self, engine_id: &str) -> Result<Vec<Voice>, SpeechError> {
        self.check_engine(engine_id)?;
        self.list_voices().await
    }

    async fn probe_locale(&self, engine_id: &str, locale: &LocaleTag) -> Result<LocaleProbe, SpeechError> {
        self.check_engine(engine_id)?;
        let voices: Vec<Voice> = self
            .list_voices()
            .await?
            .into_iter()
            .filter(|v| v.locale.language == locale.language)
            .collect();

        let support = if voices.is_empty() {
            LanguageSupport::NotSupported
        } else if locale.region.is_some() && voices.iter().any(|v| v.locale.region == locale.region) {
            LanguageSupport::CountryAvailable
        } else {
            LanguageSupport::Available
        };
        Ok(LocaleProbe { support, voices })
    }

    async fn default_voice(&self, engine_id: &str) -> Result<Option<Voice>, SpeechError> {
        self.check_engine(engine_id)?;
        let voices = self.list_voices().await?;
        let english = voices.iter().find(|v| v.locale.language == "en").cloned();
        Ok(english.or_else(|| voices.into_iter().next()))
    }

    async fn set_engine(&self, engine_id: &str) -> Result<(), SpeechError> {
        self.check_engine(engine_id)
    }

    async fn set_language(&self, locale: &LocaleTag) -> Result<LanguageSupport, SpeechError> {
        let engine_id = self.backend.program();
        let probe = self.probe_locale(engine_id, locale).await?;
        if probe.support.is_usable() {
            *self.language.write() = Some(locale.clone());
        }
        Ok(probe.support)
    }

    async fn set_voice(&self, voice: &Voice) -> Result<(), SpeechError> {
        self.check_engine(&voice.engine_id)?;
        *self.language.write() = Some(voice.locale.clone());
        *self.voice.write() = Some(voice.clone());
        Ok(())
    }

    async fn speak(&self, text: &str, mode: QueueMode) -> Result<(), SpeechError> {
        if !*self.initialized.read() {
            return Err(SpeechError::Engine("Native host not initialized".to_string()));
        }
        if text.is_empty() {
            return Err(SpeechError::Engine("Text cannot be empty".to_string()));
        }
        if text.len() > MAX_TEXT_LENGTH {
            return Err(SpeechError::Engine("Text too long (max 100KB)".to_string()));
        }

        match mode {
            QueueMode::Flush => self.kill_playback(),
            QueueMode::Add if self.is_playing() => {
                return Err(SpeechError::Engine(
                    "Native host cannot queue speech behind active playback".to_string(),
                ));
            }
            QueueMode::Add => {}
        }

        // Arguments go straight to argv, but a leading '-' would read as a flag
        let mut sanitized: String = text
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect();
        if sanitized.starts_with('-') {
            sanitized.insert(0, ' ');
        }

        let voice_arg = self
            .voice
            .read()
            .as_ref()
            .map(|v| v.id.clone())
            .or_else(|| self.language.read().as_ref().map(|l| l.to_string().to_lowercase()));

        let mut cmd = Command::new(self.backend.program());
        match self.backend {
            NativeBackend::EspeakNg => {
                cmd.arg("-s").arg(self.rate.to_string());
            }
            NativeBackend::Say => {
                cmd.arg("-r").arg(self.rate.to_string());
            }
        }
        if let Some(voice) = voice_arg {
            cmd.arg("-v").arg(voice);
        }
        cmd.arg(&sanitized)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| SpeechError::Engine(format!("Failed to start {}: {}", self.backend.program(), e)))?;
        *self.playback.lock() = Some(child);
        Ok(())
    }

    async fn stop(&self) -> Result<(), SpeechError> {
        self.kill_playback();
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), SpeechError> {
        self.kill_playback();
        *self.initialized.write() = false;
        info!("Native {} host shut down", self.backend.program());
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        self.is_playing()
    }

    fn name(&self) -> &str {
        "native"
    }
}

/// Parse `espeak-ng --voices` output.
///
/// Columns: `Pty Language Age/Gender VoiceName File Other Languages`. The
/// language column doubles as the voice id since `-v` accepts it.
pub fn parse_espeak_voices(output: &str, engine_id: &str) -> Vec<Voice> {
    let mut voices: Vec<Voice> = Vec::new();
    for line in output.lines().skip(1) {
        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.len() < 4 {
            continue;
        }
        let id = columns[1];
        if id.len() > 256 || id.chars().any(|c| c == '\0' || c.is_control()) {
            warn!("Skipping malformed voice entry: {}", line);
            continue;
        }
        let Some(locale) = LocaleTag::parse(id) else {
            continue;
        };
        if voices.iter().any(|v| v.id == id) {
            continue;
        }

        let mut voice = Voice::new(id, locale, engine_id);
        match columns[2].rsplit('/').next() {
            Some("M") => voice.features.push(FEATURE_MALE_VOICE.to_string()),
            Some("F") => voice.features.push(FEATURE_FEMALE_VOICE.to_string()),
            _ => {}
        }
        voices.push(voice);
        if voices.len() >= MAX_VOICES {
            break;
        }
    }
    voices
}

/// Parse `say -v ?` output: `<name>  <locale>  # <sample sentence>`
pub fn parse_say_voices(output: &str, engine_id: &str) -> Vec<Voice> {
    let mut voices: Vec<Voice> = Vec::new();
    for line in output.lines() {
        let entry = line.split('#').next().unwrap_or("").trim_end();
        let Some((name, locale)) = entry.rsplit_once(char::is_whitespace) else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() || name.len() > 256 {
            continue;
        }
        let Some(locale) = LocaleTag::parse(locale) else {
            continue;
        };
        if voices.iter().any(|v| v.id == name) {
            continue;
        }
        voices.push(Voice::new(name, locale, engine_id));
        if voices.len() >= MAX_VOICES {
            break;
        }
    }
    voices
}
