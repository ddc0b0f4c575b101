//! Tests for the speech controller lifecycle

use std::sync::Arc;
use vocalis_spk::engines::memory::{HostCall, InMemoryHost, InitOutcome};
use vocalis_spk::engines::QueueMode;
use vocalis_spk::error::SpeechError;
use vocalis_spk::{ControllerState, LocaleTag, SpeechController, Voice};

fn english_voice() -> Voice {
    Voice::new("en-us-x-sfg-local", LocaleTag::new("en", Some("US")), "com.google.android.tts")
}

async fn ready_controller(host: &Arc<InMemoryHost>) -> SpeechController {
    let mut controller = SpeechController::new(host.clone());
    controller.initialize(None).await.unwrap();
    controller
}

#[tokio::test]
async fn test_initialize_reaches_ready() {
    let host = Arc::new(InMemoryHost::demo());
    let mut controller = SpeechController::new(host.clone());
    assert_eq!(controller.state(), &ControllerState::Uninitialized);
    assert!(!controller.is_ready());

    controller.initialize(None).await.unwrap();
    assert_eq!(controller.state(), &ControllerState::Ready);
    assert_eq!(host.active_engine().as_deref(), Some("com.google.android.tts"));

    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_initialize_with_pinned_engine() {
    let host = Arc::new(InMemoryHost::demo());
    let mut controller = SpeechController::new(host.clone());
    controller.initialize(Some("com.samsung.SMT")).await.unwrap();

    assert_eq!(host.active_engine().as_deref(), Some("com.samsung.SMT"));
    assert_eq!(host.calls()[0], HostCall::Initialize(Some("com.samsung.SMT".to_string())));
    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_initialize_failure_releases_host() {
    let host = Arc::new(InMemoryHost::demo().with_init_outcome(InitOutcome::Failed(-1)));
    let mut controller = SpeechController::new(host.clone());

    let result = controller.initialize(None).await;
    match result {
        Err(SpeechError::InitializationFailed(code)) => assert_eq!(code, -1),
        other => panic!("Expected InitializationFailed, got {:?}", other),
    }
    assert!(matches!(controller.state(), ControllerState::Failed(_)));
    assert!(host.is_shut_down());

    // Already released; dispose must not shut down a second time
    controller.dispose().await.unwrap();
    let shutdowns = host.calls().iter().filter(|c| **c == HostCall::Shutdown).count();
    assert_eq!(shutdowns, 1);
}

#[tokio::test]
async fn test_initialize_voice_data_missing() {
    let host = Arc::new(InMemoryHost::demo().with_init_outcome(InitOutcome::VoiceDataMissing));
    let mut controller = SpeechController::new(host.clone());

    let err = controller.initialize(None).await.unwrap_err();
    assert!(err.needs_voice_data_install());
    assert!(matches!(controller.state(), ControllerState::Failed(_)));
}

#[tokio::test]
async fn test_unknown_pinned_engine_fails() {
    let host = Arc::new(InMemoryHost::demo());
    let mut controller = SpeechController::new(host.clone());

    let result = controller.initialize(Some("org.missing.engine")).await;
    assert!(matches!(result, Err(SpeechError::InitializationFailed(-1))));
    assert!(host.is_shut_down());
}

#[tokio::test]
async fn test_initialize_twice_is_rejected() {
    let host = Arc::new(InMemoryHost::demo());
    let mut controller = ready_controller(&host).await;

    let second = controller.initialize(None).await;
    assert!(matches!(second, Err(SpeechError::Controller(_))));
    assert_eq!(controller.state(), &ControllerState::Ready);

    let inits = host.calls().iter().filter(|c| matches!(c, HostCall::Initialize(_))).count();
    assert_eq!(inits, 1);
    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_speak_flushes_with_selected_voice() {
    let host = Arc::new(InMemoryHost::demo());
    let controller = ready_controller(&host).await;
    let voice = english_voice();

    controller.speak("first sentence", Some(&voice)).await.unwrap();
    controller.speak("second sentence", Some(&voice)).await.unwrap();

    assert_eq!(host.speaking().as_deref(), Some("second sentence"));
    assert!(host.queued().is_empty());
    assert_eq!(host.active_voice().as_deref(), Some("en-us-x-sfg-local"));
    assert_eq!(host.active_language(), Some(LocaleTag::new("en", Some("US"))));

    let calls = host.calls();
    let speak_at = calls
        .iter()
        .position(|c| *c == HostCall::Speak("first sentence".to_string(), QueueMode::Flush))
        .expect("speak recorded");
    assert_eq!(calls[speak_at - 1], HostCall::SetVoice("en-us-x-sfg-local".to_string()));

    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_speak_without_voice_is_invalid_selection() {
    let host = Arc::new(InMemoryHost::demo());
    let controller = ready_controller(&host).await;

    let result = controller.speak("hello", None).await;
    assert!(matches!(result, Err(SpeechError::InvalidSelection(_))));
    assert!(host.speaking().is_none());
    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_speak_rejects_bad_text() {
    let host = Arc::new(InMemoryHost::demo());
    let controller = ready_controller(&host).await;
    let voice = english_voice();

    assert!(matches!(controller.speak("", Some(&voice)).await, Err(SpeechError::Controller(_))));
    assert!(matches!(controller.speak("a\0b", Some(&voice)).await, Err(SpeechError::Controller(_))));
    let long = "a".repeat(100_001);
    assert!(matches!(controller.speak(&long, Some(&voice)).await, Err(SpeechError::Controller(_))));
    assert!(!host.calls().iter().any(|c| matches!(c, HostCall::Speak(..))));

    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_speak_before_initialize_fails() {
    let host = Arc::new(InMemoryHost::demo());
    let controller = SpeechController::new(host.clone());

    let result = controller.speak("hello", Some(&english_voice())).await;
    assert!(matches!(result, Err(SpeechError::Controller(_))));
}

#[tokio::test]
async fn test_stop_is_noop_when_not_ready() {
    let host = Arc::new(InMemoryHost::demo());
    let controller = SpeechController::new(host.clone());

    controller.stop().await.unwrap();
    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn test_stop_silences_playback() {
    let host = Arc::new(InMemoryHost::demo());
    let controller = ready_controller(&host).await;

    controller.speak("hello there", Some(&english_voice())).await.unwrap();
    assert!(controller.is_speaking());
    controller.stop().await.unwrap();
    assert!(host.speaking().is_none());
    assert!(!controller.is_speaking());
    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_dispose_stops_and_shuts_down() {
    let host = Arc::new(InMemoryHost::demo());
    let controller = ready_controller(&host).await;
    controller.speak("hello there", Some(&english_voice())).await.unwrap();

    controller.dispose().await.unwrap();
    assert!(host.is_shut_down());
    assert!(host.speaking().is_none());

    let calls = host.calls();
    let n = calls.len();
    assert_eq!(&calls[n - 2..], &[HostCall::Stop, HostCall::Shutdown]);
}

#[tokio::test]
async fn test_dispose_uninitialized_releases_host() {
    let host = Arc::new(InMemoryHost::demo());
    let controller = SpeechController::new(host.clone());

    controller.dispose().await.unwrap();
    assert_eq!(host.calls(), vec![HostCall::Shutdown]);
}

#[tokio::test]
async fn test_drop_without_dispose_shuts_down_host() {
    let host = Arc::new(InMemoryHost::demo());
    {
        let _controller = ready_controller(&host).await;
    }

    for _ in 0..10 {
        if host.is_shut_down() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(host.is_shut_down());
}
