//! Engine and voice descriptors

use crate::locale::LocaleTag;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A named speech synthesis backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineInfo {
    /// Engine identifier (package name, executable name, ...)
    pub id: String,
    /// Display label
    pub label: String,
}

impl EngineInfo {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into() }
    }
}

/// Voice quality tier.
///
/// Levels follow the common host convention: 100 (very low) to 500 (very high),
/// 0 when the engine does not report one. Values compare by level, so
/// `Other(300)` equals `Normal`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum VoiceQuality {
    Unspecified,
    VeryLow,
    Low,
    Normal,
    High,
    VeryHigh,
    /// Vendor value outside the known tiers
    Other(i32),
}

impl VoiceQuality {
    pub fn from_level(level: i32) -> Self {
        match level {
            0 => VoiceQuality::Unspecified,
            100 => VoiceQuality::VeryLow,
            200 => VoiceQuality::Low,
            300 => VoiceQuality::Normal,
            400 => VoiceQuality::High,
            500 => VoiceQuality::VeryHigh,
            other => VoiceQuality::Other(other),
        }
    }

    pub fn level(&self) -> i32 {
        match self {
            VoiceQuality::Unspecified => 0,
            VoiceQuality::VeryLow => 100,
            VoiceQuality::Low => 200,
            VoiceQuality::Normal => 300,
            VoiceQuality::High => 400,
            VoiceQuality::VeryHigh => 500,
            VoiceQuality::Other(level) => *level,
        }
    }

    /// Display label, `None` when no positive quality is reported
    pub fn label(&self) -> Option<String> {
        let label = match Self::from_level(self.level()) {
            VoiceQuality::VeryHigh => "Very High Quality",
            VoiceQuality::High => "High Quality",
            VoiceQuality::Normal => "Normal Quality",
            VoiceQuality::Low => "Low Quality",
            VoiceQuality::VeryLow => "Very Low Quality",
            VoiceQuality::Unspecified => return None,
            VoiceQuality::Other(level) if level <= 0 => return None,
            VoiceQuality::Other(level) => return Some(format!("Quality: {}", level)),
        };
        Some(label.to_string())
    }
}

impl Default for VoiceQuality {
    fn default() -> Self {
        VoiceQuality::Unspecified
    }
}

impl PartialEq for VoiceQuality {
    fn eq(&self, other: &Self) -> bool {
        self.level() == other.level()
    }
}

impl Eq for VoiceQuality {}

impl PartialOrd for VoiceQuality {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VoiceQuality {
    fn cmp(&self, other: &Self) -> Ordering {
        self.level().cmp(&other.level())
    }
}

/// Display tag guessed from vendor voice naming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceTag {
    Male,
    Female,
}

impl fmt::Display for VoiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceTag::Male => write!(f, "Male"),
            VoiceTag::Female => write!(f, "Female"),
        }
    }
}

/// Feature flag some engines set on male voices
pub const FEATURE_MALE_VOICE: &str = "maleVoice";
/// Feature flag some engines set on female voices
pub const FEATURE_FEMALE_VOICE: &str = "femaleVoice";

/// A synthetic voice, scoped to one engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Voice identifier, unique within its engine
    pub id: String,
    pub locale: LocaleTag,
    #[serde(default)]
    pub quality: VoiceQuality,
    /// Owning engine identifier
    pub engine_id: String,
    /// Engine-provided feature flags
    #[serde(default)]
    pub features: Vec<String>,
}

impl Voice {
    pub fn new(id: impl Into<String>, locale: LocaleTag, engine_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            locale,
            quality: VoiceQuality::Unspecified,
            engine_id: engine_id.into(),
            features: Vec::new(),
        }
    }

    pub fn with_quality(mut self, quality: VoiceQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }

    /// Language code of this voice's locale
    pub fn language(&self) -> &str {
        &self.locale.language
    }

    pub fn quality_label(&self) -> Option<String> {
        self.quality.label()
    }

    /// Best-effort gender tag.
    ///
    /// This is a heuristic over vendor naming and feature flags, not an
    /// attribute the host guarantees. Checked in order: identifier contains
    /// "male" but not "female", identifier contains "female", then the
    /// `maleVoice` / `femaleVoice` feature flags.
    pub fn gender_hint(&self) -> Option<VoiceTag> {
        let id = self.id.to_lowercase();
        if id.contains("male") && !id.contains("female") {
            return Some(VoiceTag::Male);
        }
        if id.contains("female") {
            return Some(VoiceTag::Female);
        }
        if self.features.iter().any(|f| f == FEATURE_MALE_VOICE) {
            return Some(VoiceTag::Male);
        }
        if self.features.iter().any(|f| f == FEATURE_FEMALE_VOICE) {
            return Some(VoiceTag::Female);
        }
        None
    }

    /// `"<Language> - <Tag> (<Country>)"`, with "Voice" when no tag is guessed
    pub fn display_name(&self) -> String {
        let tag = self
            .gender_hint()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "Voice".to_string());
        format!(
            "{} - {} ({})",
            self.locale.display_language(),
            tag,
            self.locale.display_country()
        )
    }
}
