//! Locale tags (language + optional region)

use crate::error::SpeechError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language code plus optional region/country code.
///
/// Language is stored lowercase and region uppercase, so `en_us`, `en-US`
/// and `EN-us` all compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocaleTag {
    pub language: String,
    pub region: Option<String>,
}

impl LocaleTag {
    pub fn new(language: &str, region: Option<&str>) -> Self {
        Self {
            language: language.to_ascii_lowercase(),
            region: region.map(|r| r.to_ascii_uppercase()),
        }
    }

    /// Language-only tag
    pub fn language(language: &str) -> Self {
        Self::new(language, None)
    }

    /// Parse `en`, `en-US`, `en_US` or longer tags such as `en-gb-scotland`.
    ///
    /// Subtags after the region are dropped. A second subtag that is not a
    /// region (two letters or three digits) is ignored as well.
    pub fn parse(tag: &str) -> Option<Self> {
        let mut parts = tag.trim().split(|c| c == '-' || c == '_');

        let language = parts.next()?;
        if !(2..=8).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let region = parts.next().filter(|r| {
            (r.len() == 2 && r.chars().all(|c| c.is_ascii_alphabetic()))
                || (r.len() == 3 && r.chars().all(|c| c.is_ascii_digit()))
        });

        Some(Self::new(language, region))
    }

    /// Human-readable language name, or the upper-cased code when unknown
    pub fn display_language(&self) -> String {
        language_display_name(&self.language)
    }

    /// Human-readable country name; the region code when unknown, empty when absent
    pub fn display_country(&self) -> String {
        match self.region.as_deref() {
            Some(region) => country_display_name(region),
            None => String::new(),
        }
    }
}

impl fmt::Display for LocaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{}-{}", self.language, region),
            None => write!(f, "{}", self.language),
        }
    }
}

impl FromStr for LocaleTag {
    type Err = SpeechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| SpeechError::Config(format!("Invalid locale tag: {:?}", s)))
    }
}

/// Display name for an ISO 639-1 language code
pub fn language_display_name(code: &str) -> String {
    let name = match code {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "nl" => "Dutch",
        "sv" => "Swedish",
        "da" => "Danish",
        "no" => "Norwegian",
        "fi" => "Finnish",
        "pl" => "Polish",
        "tr" => "Turkish",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "cs" => "Czech",
        "hu" => "Hungarian",
        "ro" => "Romanian",
        "sk" => "Slovak",
        "bg" => "Bulgarian",
        "hr" => "Croatian",
        "sl" => "Slovenian",
        "et" => "Estonian",
        "lv" => "Latvian",
        "lt" => "Lithuanian",
        "el" => "Greek",
        "he" => "Hebrew",
        "uk" => "Ukrainian",
        _ => return code.to_ascii_uppercase(),
    };
    name.to_string()
}

/// Display name for an ISO 3166-1 region code
pub fn country_display_name(code: &str) -> String {
    let name = match code {
        "US" => "United States",
        "GB" => "United Kingdom",
        "CA" => "Canada",
        "AU" => "Australia",
        "IN" => "India",
        "DE" => "Germany",
        "AT" => "Austria",
        "CH" => "Switzerland",
        "FR" => "France",
        "BE" => "Belgium",
        "IT" => "Italy",
        "ES" => "Spain",
        "MX" => "Mexico",
        "PT" => "Portugal",
        "BR" => "Brazil",
        "JP" => "Japan",
        "KR" => "South Korea",
        "CN" => "China",
        "TW" => "Taiwan",
        "SA" => "Saudi Arabia",
        "RU" => "Russia",
        "ID" => "Indonesia",
        "TH" => "Thailand",
        "NL" => "Netherlands",
        _ => return code.to_string(),
    };
    name.to_string()
}
