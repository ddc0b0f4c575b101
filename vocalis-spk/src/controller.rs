//! Speech controller: host connection lifecycle and playback commands

use crate::engines::{QueueMode, SpeechHost};
use crate::error::SpeechError;
use crate::voice::Voice;
use std::sync::Arc;
use tracing::{debug, info, warn};

const MAX_TEXT_LENGTH: usize = 100_000;

/// Controller lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Initializing,
    Ready,
    Failed(String),
}

/// Owns one connection to a host speech service
pub struct SpeechController {
    host: Arc<dyn SpeechHost>,
    state: ControllerState,
    disposed: bool,
}

impl SpeechController {
    pub fn new(host: Arc<dyn SpeechHost>) -> Self {
        Self {
            host,
            state: ControllerState::Uninitialized,
            disposed: false,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ControllerState::Ready
    }

    pub fn host(&self) -> &Arc<dyn SpeechHost> {
        &self.host
    }

    /// Connect to the host, optionally pinned to an engine.
    ///
    /// Resolves once: a second call returns `SpeechError::Controller`. On
    /// failure the host is shut down before the error is returned.
    pub async fn initialize(&mut self, preferred_engine: Option<&str>) -> Result<(), SpeechError> {
        if self.state != ControllerState::Uninitialized {
            return Err(SpeechError::Controller(format!(
                "Controller already initialized (state: {:?})",
                self.state
            )));
        }

        self.state = ControllerState::Initializing;
        debug!("Initializing {} host (engine: {:?})", self.host.name(), preferred_engine);

        match self.host.initialize(preferred_engine).await {
            Ok(()) => {
                self.state = ControllerState::Ready;
                info!("Speech controller ready on {}", self.host.name());
                Ok(())
            }
            Err(e) => {
                warn!("Speech controller initialization failed: {}", e);
                self.state = ControllerState::Failed(e.to_string());
                if let Err(shutdown_err) = self.host.shutdown().await {
                    warn!("Host shutdown after failed initialization failed: {}", shutdown_err);
                }
                Err(e)
            }
        }
    }

    /// Speak `text` with `voice`, interrupting anything already playing
    pub async fn speak(&self, text: &str, voice: Option<&Voice>) -> Result<(), SpeechError> {
        if !self.is_ready() {
            return Err(SpeechError::Controller(format!(
                "Cannot speak in state {:?}",
                self.state
            )));
        }
        let voice = voice.ok_or_else(|| SpeechError::InvalidSelection("No voice selected".to_string()))?;

        if text.is_empty() {
            return Err(SpeechError::Controller("Text cannot be empty".to_string()));
        }
        if text.contains('\0') {
            return Err(SpeechError::Controller("Text contains null bytes".to_string()));
        }
        if text.len() > MAX_TEXT_LENGTH {
            return Err(SpeechError::Controller(format!(
                "Text too long (max {} bytes)",
                MAX_TEXT_LENGTH
            )));
        }

        self.host.set_voice(voice).await?;
        self.host.speak(text, QueueMode::Flush).await?;
        debug!("Speaking {} bytes with voice {}", text.len(), voice.id);
        Ok(())
    }

    pub fn is_speaking(&self) -> bool {
        self.is_ready() && self.host.is_speaking()
    }

    /// Stop playback; a no-op unless the controller is ready
    pub async fn stop(&self) -> Result<(), SpeechError> {
        if !self.is_ready() {
            return Ok(());
        }
        self.host.stop().await
    }

    /// Stop playback and release the host connection
    pub async fn dispose(mut self) -> Result<(), SpeechError> {
        self.disposed = true;
        if self.is_ready() {
            if let Err(e) = self.host.stop().await {
                warn!("Stop during dispose failed: {}", e);
            }
        }
        // A failed initialization already shut the host down
        if matches!(self.state, ControllerState::Failed(_)) {
            return Ok(());
        }
        self.state = ControllerState::Uninitialized;
        self.host.shutdown().await?;
        info!("Speech controller disposed");
        Ok(())
    }
}

impl Drop for SpeechController {
    fn drop(&mut self) {
        if self.disposed || self.state != ControllerState::Ready {
            return;
        }
        warn!("SpeechController dropped without dispose(), shutting down host {}", self.host.name());

        // Drop cannot await; hand the shutdown to the runtime if there is one
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let host = Arc::clone(&self.host);
                handle.spawn(async move {
                    if let Err(e) = host.stop().await {
                        warn!("Stop on drop failed: {}", e);
                    }
                    if let Err(e) = host.shutdown().await {
                        warn!("Shutdown on drop failed: {}", e);
                    }
                });
            }
            Err(_) => warn!("No tokio runtime available; host {} left connected", self.host.name()),
        }
    }
}
