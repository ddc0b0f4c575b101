//! Error types for vocalis-spk

use thiserror::Error;

/// Speech discovery and control errors
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Initialization failed with status: {0}")]
    InitializationFailed(i32),

    #[error("Voice data missing, TTS data needs to be installed")]
    VoiceDataMissing,

    #[error("No voices available. Please install a Text-to-Speech engine with voice support.")]
    NoVoicesAvailable,

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Controller error: {0}")]
    Controller(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpeechError {
    /// Whether the caller can recover by prompting the user to install voice data
    pub fn needs_voice_data_install(&self) -> bool {
        matches!(self, SpeechError::VoiceDataMissing)
    }
}
