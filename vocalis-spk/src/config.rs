//! Configuration for voice discovery and presentation

use crate::error::SpeechError;
use crate::locale::LocaleTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Engine discovery settings
    pub catalog: CatalogConfig,

    /// What one session shows and says
    pub presentation: PresentationConfig,
}

/// Engine discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Engine to pin at initialization (host default when unset)
    pub preferred_engine: Option<String>,

    /// Locales probed first when the default engine reports no voices
    pub preferred_locales: Vec<String>,

    /// Locales probed after the preferred ones
    pub probe_locales: Vec<String>,
}

/// Presentation profile for one session.
///
/// Replaces per-screen variants: sample text and visible features are data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Heading shown above the sample text
    pub title: String,

    /// Languages offered in the language filter (all discovered when unset)
    pub allowed_languages: Option<Vec<String>>,

    /// Language filter applied when the session starts
    pub initial_language: Option<String>,

    /// Show the engine picker when more than one engine is installed
    pub show_engine_picker: bool,

    /// Group the voice list by language
    pub group_by_language: bool,

    /// Sample paragraph per language code
    pub sample_texts: BTreeMap<String, String>,

    /// Sample used when the language has no entry
    pub fallback_text: String,
}

/// Locales probed when the default engine reports no voices
pub const DEFAULT_PROBE_LOCALES: [&str; 16] = [
    "en-US", "en-GB", "en-CA", "de-DE", "fr-FR", "it-IT", "ja-JP", "ko-KR",
    "zh-CN", "hi-IN", "es-ES", "ar-SA", "ru-RU", "pt-BR", "id-ID", "th-TH",
];

const MAX_LOCALES: usize = 256;

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            preferred_engine: None,
            preferred_locales: vec!["en-US".to_string()],
            probe_locales: DEFAULT_PROBE_LOCALES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        let sample_texts = [
            ("en", "Life is a journey filled with countless moments, each offering an opportunity to learn, grow, and appreciate the world around us. A kind word can inspire hope, a small action can create change, and a curious mind can open doors to endless possibilities."),
            ("es", "La vida es un viaje lleno de innumerables momentos, cada uno ofreciendo una oportunidad para aprender, crecer y apreciar el mundo que nos rodea. Una palabra amable puede inspirar esperanza, una pequeña acción puede crear cambio, y una mente curiosa puede abrir puertas a posibilidades infinitas."),
            ("fr", "La vie est un voyage rempli d'innombrables moments, chacun offrant une opportunité d'apprendre, de grandir et d'apprécier le monde qui nous entoure. Un mot gentil peut inspirer l'espoir, une petite action peut créer le changement, et un esprit curieux peut ouvrir les portes à des possibilités infinies."),
            ("de", "Das Leben ist eine Reise voller unzähliger Momente, die jeweils eine Gelegenheit bieten zu lernen, zu wachsen und die Welt um uns herum zu schätzen. Ein freundliches Wort kann Hoffnung inspirieren, eine kleine Handlung kann Veränderung bewirken, und ein neugieriger Geist kann Türen zu endlosen Möglichkeiten öffnen."),
            ("it", "La vita è un viaggio pieno di innumerevoli momenti, ognuno dei quali offre un'opportunità per imparare, crescere e apprezzare il mondo che ci circonda. Una parola gentile può ispirare speranza, una piccola azione può creare cambiamento, e una mente curiosa può aprire porte a possibilità infinite."),
            ("pt", "A vida é uma jornada cheia de inúmeros momentos, cada um oferecendo uma oportunidade para aprender, crescer e apreciar o mundo ao nosso redor. Uma palavra gentil pode inspirar esperança, uma pequena ação pode criar mudança, e uma mente curiosa pode abrir portas para possibilidades infinitas."),
        ]
        .into_iter()
        .map(|(lang, text)| (lang.to_string(), text.to_string()))
        .collect();

        Self {
            title: "Text to Speech".to_string(),
            allowed_languages: None,
            initial_language: None,
            show_engine_picker: true,
            group_by_language: true,
            sample_texts,
            fallback_text: "Life is a journey filled with countless moments, each offering an opportunity to learn, grow, and appreciate the world around us.".to_string(),
        }
    }
}

impl CatalogConfig {
    /// Validate catalog configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref engine) = self.preferred_engine {
            if engine.is_empty() {
                return Err("Preferred engine cannot be empty if provided".to_string());
            }
            if engine.len() > 256 {
                return Err("Preferred engine name too long (max 256 chars)".to_string());
            }
            if engine.chars().any(|c| c == '\0' || c.is_control()) {
                return Err("Preferred engine name contains invalid characters".to_string());
            }
        }

        for (field, locales) in [("preferred_locales", &self.preferred_locales), ("probe_locales", &self.probe_locales)] {
            if locales.len() > MAX_LOCALES {
                return Err(format!("Too many {} (max {})", field, MAX_LOCALES));
            }
            if let Some(bad) = locales.iter().find(|tag| LocaleTag::parse(tag).is_none()) {
                return Err(format!("Invalid locale tag in {}: {:?}", field, bad));
            }
        }

        Ok(())
    }

    /// Preferred locales as parsed tags
    pub fn preferred_locale_tags(&self) -> Vec<LocaleTag> {
        self.preferred_locales.iter().filter_map(|t| LocaleTag::parse(t)).collect()
    }

    /// Probe locales as parsed tags
    pub fn probe_locale_tags(&self) -> Vec<LocaleTag> {
        self.probe_locales.iter().filter_map(|t| LocaleTag::parse(t)).collect()
    }
}

impl PresentationConfig {
    /// Validate presentation configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title cannot be empty".to_string());
        }

        let valid_language = |code: &str| {
            (2..=8).contains(&code.len()) && code.chars().all(|c| c.is_ascii_lowercase())
        };

        if let Some(ref allowed) = self.allowed_languages {
            if allowed.is_empty() {
                return Err("Allowed languages cannot be empty if provided".to_string());
            }
            if let Some(bad) = allowed.iter().find(|c| !valid_language(c.as_str())) {
                return Err(format!("Invalid language code in allowed_languages: {:?}", bad));
            }
        }

        if let Some(ref initial) = self.initial_language {
            if !valid_language(initial.as_str()) {
                return Err(format!("Invalid initial language: {:?}", initial));
            }
            if let Some(ref allowed) = self.allowed_languages {
                if !allowed.contains(initial) {
                    return Err("Initial language must be one of the allowed languages".to_string());
                }
            }
        }

        if let Some(bad) = self.sample_texts.keys().find(|c| !valid_language(c.as_str())) {
            return Err(format!("Invalid language code in sample_texts: {:?}", bad));
        }

        Ok(())
    }

    /// Sample paragraph for a language, falling back to `fallback_text`
    pub fn sample_text(&self, language: Option<&str>) -> &str {
        language
            .and_then(|lang| self.sample_texts.get(lang))
            .map(String::as_str)
            .unwrap_or(&self.fallback_text)
    }
}

impl SpeechConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.catalog.validate()?;
        self.presentation.validate()?;
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, SpeechError> {
        let config: SpeechConfig = toml::from_str(source)
            .map_err(|e| SpeechError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate().map_err(SpeechError::Config)?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, SpeechError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Load from the default location, or defaults when no file exists there
    pub fn load_default() -> Result<Self, SpeechError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/vocalis/vocalis.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vocalis").join("vocalis.toml"))
    }
}
