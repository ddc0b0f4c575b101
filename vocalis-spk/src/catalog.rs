//! Voice catalog: discovery snapshots and selection state

use crate::config::CatalogConfig;
use crate::engines::SpeechHost;
use crate::error::SpeechError;
use crate::locale::LocaleTag;
use crate::voice::{EngineInfo, Voice};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Engine id used when the host names no engine at all
pub const DEFAULT_ENGINE_ID: &str = "default";

/// One engine and the voices discovered for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineVoices {
    pub engine: EngineInfo,
    pub voices: Vec<Voice>,
}

impl EngineVoices {
    /// Voices whose language matches exactly, in stored order
    pub fn voices_for_language(&self, language: &str) -> Vec<Voice> {
        self.voices.iter().filter(|v| v.language() == language).cloned().collect()
    }
}

/// Voices sharing a language code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageGroup {
    pub language: String,
    pub voices: Vec<Voice>,
}

/// Immutable result of one discovery pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSnapshot {
    /// Engine the host reported as default
    pub default_engine: String,
    /// Engines in host order, each with its deduplicated voices
    pub engines: Vec<EngineVoices>,
    /// All voices, engine by engine
    pub all_voices: Vec<Voice>,
    /// Distinct language codes, sorted
    pub languages: Vec<String>,
}

impl CatalogSnapshot {
    /// Build a snapshot, enforcing its invariants.
    ///
    /// Duplicate engines keep their first entry; voices are deduplicated by
    /// id within each engine and re-owned by the engine that lists them.
    pub fn new(default_engine: impl Into<String>, engines: Vec<EngineVoices>) -> Self {
        let mut cleaned: Vec<EngineVoices> = Vec::with_capacity(engines.len());
        for entry in engines {
            if cleaned.iter().any(|e| e.engine.id == entry.engine.id) {
                warn!("Duplicate engine {} in discovery results, keeping the first", entry.engine.id);
                continue;
            }
            let engine_id = entry.engine.id.clone();
            let mut voices: Vec<Voice> = Vec::with_capacity(entry.voices.len());
            for mut voice in entry.voices {
                if voices.iter().any(|v| v.id == voice.id) {
                    continue;
                }
                voice.engine_id = engine_id.clone();
                voices.push(voice);
            }
            cleaned.push(EngineVoices { engine: entry.engine, voices });
        }

        let all_voices: Vec<Voice> = cleaned.iter().flat_map(|e| e.voices.iter().cloned()).collect();
        let languages: BTreeSet<String> = all_voices.iter().map(|v| v.language().to_string()).collect();

        Self {
            default_engine: default_engine.into(),
            engines: cleaned,
            all_voices,
            languages: languages.into_iter().collect(),
        }
    }

    /// Query the host and build a snapshot.
    ///
    /// Engines whose voice query fails are left out. When the default engine
    /// reports no voices, `preferred_locales` and then the configured probe
    /// locales are probed on it and the results merged. With nothing found
    /// after that, the engine's default voice becomes the only entry, or
    /// `NoVoicesAvailable` is returned.
    pub async fn discover(
        host: &dyn SpeechHost,
        config: &CatalogConfig,
        preferred_locales: &[LocaleTag],
    ) -> Result<Self, SpeechError> {
        let mut engines = match host.engines().await {
            Ok(engines) => engines,
            Err(e) => {
                warn!("Engine enumeration on {} failed: {}", host.name(), e);
                Vec::new()
            }
        };

        let default_engine = match host.default_engine().await {
            Ok(id) if !id.is_empty() => id,
            other => {
                if let Err(e) = other {
                    warn!("Default engine query on {} failed: {}", host.name(), e);
                }
                engines
                    .first()
                    .map(|e| e.id.clone())
                    .unwrap_or_else(|| DEFAULT_ENGINE_ID.to_string())
            }
        };

        let default_info = match engines.iter().find(|e| e.id == default_engine) {
            Some(engine) => engine.clone(),
            None => {
                let engine = synthetic_engine(&default_engine);
                engines.insert(0, engine.clone());
                engine
            }
        };

        let mut collected: Vec<EngineVoices> = Vec::with_capacity(engines.len());
        for engine in engines {
            match host.voices(&engine.id).await {
                Ok(voices) => {
                    debug!("Engine {} reported {} voices", engine.id, voices.len());
                    collected.push(EngineVoices { engine, voices });
                }
                Err(e) => warn!("Omitting engine {}: {}", engine.id, e),
            }
        }

        // An errored default engine stays omitted; only an empty answer is probed
        let default_is_empty = collected
            .iter()
            .find(|e| e.engine.id == default_engine)
            .map_or(false, |e| e.voices.is_empty());

        if default_is_empty {
            let locales = probe_order(preferred_locales, &config.probe_locale_tags());
            let probed = probe_locales(host, &default_engine, &locales).await;
            if !probed.is_empty() {
                info!("Locale probing found {} voices on {}", probed.len(), default_engine);
                default_entry(&mut collected, &default_info).voices.extend(probed);
            }
        }

        if collected.iter().all(|e| e.voices.is_empty()) {
            match host.default_voice(&default_engine).await {
                Ok(Some(voice)) => {
                    info!("No voices listed, using default voice {}", voice.id);
                    let entry = default_entry(&mut collected, &default_info);
                    entry.voices = vec![voice];
                }
                Ok(None) => return Err(SpeechError::NoVoicesAvailable),
                Err(e) => {
                    warn!("Default voice query on {} failed: {}", default_engine, e);
                    return Err(SpeechError::NoVoicesAvailable);
                }
            }
        }

        Ok(Self::new(default_engine, collected))
    }

    pub fn engine(&self, engine_id: &str) -> Option<&EngineVoices> {
        self.engines.iter().find(|e| e.engine.id == engine_id)
    }

    /// Voices for one engine, empty when the engine is unknown
    pub fn voices_for_engine(&self, engine_id: &str) -> &[Voice] {
        self.engine(engine_id).map(|e| e.voices.as_slice()).unwrap_or(&[])
    }

    /// Engines with their voice counts, for engine pickers
    pub fn engine_summaries(&self) -> Vec<(&EngineInfo, usize)> {
        self.engines.iter().map(|e| (&e.engine, e.voices.len())).collect()
    }

    pub fn voice_count(&self) -> usize {
        self.all_voices.len()
    }

    /// Distinct languages, restricted to `allowed` when given, sorted ascending
    pub fn list_languages(&self, allowed: Option<&[String]>) -> Vec<String> {
        self.languages
            .iter()
            .filter(|lang| allowed.map_or(true, |allowed| allowed.iter().any(|a| a == *lang)))
            .cloned()
            .collect()
    }

    /// Voices whose language code equals `language` (region ignored), in catalog order
    pub fn voices_for_language(&self, language: &str) -> Vec<Voice> {
        self.all_voices.iter().filter(|v| v.language() == language).cloned().collect()
    }

    /// Engine a fresh selection should start on: the default engine if it has
    /// voices, else the first engine with voices, else the first engine
    fn initial_engine(&self) -> Option<&EngineVoices> {
        self.engine(&self.default_engine)
            .filter(|e| !e.voices.is_empty())
            .or_else(|| self.engines.iter().find(|e| !e.voices.is_empty()))
            .or_else(|| self.engines.first())
    }
}

/// Group voices by language code in first-seen order
pub fn group_by_language(voices: &[Voice]) -> Vec<LanguageGroup> {
    let mut groups: Vec<LanguageGroup> = Vec::new();
    for voice in voices {
        match groups.iter_mut().find(|g| g.language == voice.language()) {
            Some(group) => group.voices.push(voice.clone()),
            None => groups.push(LanguageGroup {
                language: voice.language().to_string(),
                voices: vec![voice.clone()],
            }),
        }
    }
    groups
}

fn synthetic_engine(engine_id: &str) -> EngineInfo {
    let label = if engine_id == DEFAULT_ENGINE_ID { "Default" } else { engine_id };
    EngineInfo::new(engine_id, label)
}

fn default_entry<'a>(collected: &'a mut Vec<EngineVoices>, engine: &EngineInfo) -> &'a mut EngineVoices {
    match collected.iter().position(|e| e.engine.id == engine.id) {
        Some(pos) => &mut collected[pos],
        None => {
            collected.insert(0, EngineVoices { engine: engine.clone(), voices: Vec::new() });
            &mut collected[0]
        }
    }
}

fn probe_order(preferred: &[LocaleTag], fallback: &[LocaleTag]) -> Vec<LocaleTag> {
    let mut order: Vec<LocaleTag> = Vec::with_capacity(preferred.len() + fallback.len());
    for locale in preferred.iter().chain(fallback) {
        if !order.contains(locale) {
            order.push(locale.clone());
        }
    }
    order
}

/// Probe each locale on one engine and merge usable voices (dedup by id).
/// A failing probe skips its locale only.
async fn probe_locales(host: &dyn SpeechHost, engine_id: &str, locales: &[LocaleTag]) -> Vec<Voice> {
    let mut found: Vec<Voice> = Vec::new();
    for locale in locales {
        match host.probe_locale(engine_id, locale).await {
            Ok(probe) if probe.support.is_usable() => {
                for voice in probe.voices {
                    if !found.iter().any(|v| v.id == voice.id) {
                        found.push(voice);
                    }
                }
            }
            Ok(probe) => debug!("Locale {} on {}: {:?}", locale, engine_id, probe.support),
            Err(e) => warn!("Probing locale {} on {} failed: {}", locale, engine_id, e),
        }
    }
    found
}

/// The user's current engine, voice and language filter
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionState {
    engine_id: Option<String>,
    voice: Option<Voice>,
    language: Option<String>,
}

impl SelectionState {
    pub fn engine_id(&self) -> Option<&str> {
        self.engine_id.as_deref()
    }

    pub fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    /// Active language filter, if any
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Switch engine and select its first voice, or its first voice matching
    /// the language filter when one is set. The filter is kept.
    pub fn select_engine(&mut self, snapshot: &CatalogSnapshot, engine_id: &str) -> Result<(), SpeechError> {
        let entry = snapshot
            .engine(engine_id)
            .ok_or_else(|| SpeechError::InvalidSelection(format!("Unknown engine: {}", engine_id)))?;
        self.engine_id = Some(entry.engine.id.clone());
        self.voice = first_matching(&entry.voices, self.language.as_deref());
        Ok(())
    }

    /// Select a voice of the active engine
    pub fn select_voice(&mut self, snapshot: &CatalogSnapshot, voice_id: &str) -> Result<(), SpeechError> {
        let engine_id = self
            .engine_id
            .as_deref()
            .ok_or_else(|| SpeechError::InvalidSelection("No active engine".to_string()))?;
        let voice = snapshot
            .voices_for_engine(engine_id)
            .iter()
            .find(|v| v.id == voice_id)
            .ok_or_else(|| {
                SpeechError::InvalidSelection(format!("Voice {} not found on engine {}", voice_id, engine_id))
            })?;
        self.voice = Some(voice.clone());
        Ok(())
    }

    /// Set the language filter and select the active engine's first matching voice
    pub fn select_language(&mut self, snapshot: &CatalogSnapshot, language: &str) -> Result<(), SpeechError> {
        if language.is_empty() {
            return Err(SpeechError::InvalidSelection("Language code cannot be empty".to_string()));
        }
        self.language = Some(language.to_string());
        self.voice = self
            .engine_id
            .as_deref()
            .and_then(|id| snapshot.engine(id))
            .and_then(|e| e.voices.iter().find(|v| v.language() == language).cloned());
        Ok(())
    }

    /// Re-derive a valid selection after a refresh.
    ///
    /// Keeps the engine and voice when they still exist; otherwise falls back
    /// to the first voice matching the language filter (or the first voice
    /// when no filter is set).
    pub fn reconcile(&mut self, snapshot: &CatalogSnapshot) {
        let entry = self
            .engine_id
            .as_deref()
            .and_then(|id| snapshot.engine(id))
            .or_else(|| snapshot.initial_engine());

        let Some(entry) = entry else {
            self.engine_id = None;
            self.voice = None;
            return;
        };

        let kept = self
            .voice
            .as_ref()
            .and_then(|current| entry.voices.iter().find(|v| v.id == current.id));

        self.voice = match kept {
            Some(voice) => Some(voice.clone()),
            None => first_matching(&entry.voices, self.language.as_deref()),
        };
        self.engine_id = Some(entry.engine.id.clone());
    }

    pub fn clear(&mut self) {
        self.engine_id = None;
        self.voice = None;
    }
}

fn first_matching(voices: &[Voice], language: Option<&str>) -> Option<Voice> {
    match language {
        Some(language) => voices.iter().find(|v| v.language() == language).cloned(),
        None => voices.first().cloned(),
    }
}

/// Discovery plus selection over one host
pub struct VoiceCatalog {
    host: Arc<dyn SpeechHost>,
    config: CatalogConfig,
    snapshot: Option<Arc<CatalogSnapshot>>,
    selection: SelectionState,
}

impl VoiceCatalog {
    pub fn new(host: Arc<dyn SpeechHost>, config: CatalogConfig) -> Self {
        Self {
            host,
            config,
            snapshot: None,
            selection: SelectionState::default(),
        }
    }

    /// Rebuild the snapshot and re-derive the selection.
    ///
    /// Nothing is applied until discovery finishes, so dropping the returned
    /// future leaves the previous snapshot and selection untouched. On
    /// `NoVoicesAvailable` the snapshot is cleared along with engine and voice.
    pub async fn refresh(&mut self, preferred_locales: &[LocaleTag]) -> Result<Arc<CatalogSnapshot>, SpeechError> {
        let discovered = CatalogSnapshot::discover(self.host.as_ref(), &self.config, preferred_locales).await;

        match discovered {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.selection.reconcile(&snapshot);
                info!(
                    "Voice catalog refreshed: {} engines, {} voices, {} languages",
                    snapshot.engines.len(),
                    snapshot.voice_count(),
                    snapshot.languages.len()
                );
                self.snapshot = Some(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(e) => {
                warn!("Voice catalog refresh failed: {}", e);
                self.snapshot = None;
                self.selection.clear();
                Err(e)
            }
        }
    }

    pub fn snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
        self.snapshot.clone()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn select_engine(&mut self, engine_id: &str) -> Result<&SelectionState, SpeechError> {
        let snapshot = self.loaded()?;
        self.selection.select_engine(&snapshot, engine_id)?;
        debug!("Selected engine {}", engine_id);
        Ok(&self.selection)
    }

    pub fn select_voice(&mut self, voice_id: &str) -> Result<&SelectionState, SpeechError> {
        let snapshot = self.loaded()?;
        self.selection.select_voice(&snapshot, voice_id)?;
        debug!("Selected voice {}", voice_id);
        Ok(&self.selection)
    }

    pub fn select_language(&mut self, language: &str) -> Result<&SelectionState, SpeechError> {
        let snapshot = self.loaded()?;
        self.selection.select_language(&snapshot, language)?;
        debug!("Selected language {}", language);
        Ok(&self.selection)
    }

    /// Voices of the active engine, narrowed by the language filter when set
    pub fn available_voices(&self) -> Vec<Voice> {
        let (Some(snapshot), Some(engine_id)) = (&self.snapshot, self.selection.engine_id()) else {
            return Vec::new();
        };
        let Some(entry) = snapshot.engine(engine_id) else {
            return Vec::new();
        };
        match self.selection.language() {
            Some(language) => entry.voices_for_language(language),
            None => entry.voices.clone(),
        }
    }

    fn loaded(&self) -> Result<Arc<CatalogSnapshot>, SpeechError> {
        self.snapshot
            .clone()
            .ok_or_else(|| SpeechError::InvalidSelection("Voice catalog not loaded".to_string()))
    }
}
