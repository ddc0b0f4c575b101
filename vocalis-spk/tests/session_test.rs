//! Tests for a full voice session over the in-memory host

use std::sync::Arc;
use vocalis_spk::engines::memory::{HostCall, InMemoryHost, InitOutcome};
use vocalis_spk::error::SpeechError;
use vocalis_spk::{ControllerState, EngineInfo, LocaleTag, SpeechConfig, Voice, VoiceSession};

const GOOGLE: &str = "com.google.android.tts";
const SAMSUNG: &str = "com.samsung.SMT";

async fn demo_session(config: SpeechConfig) -> (Arc<InMemoryHost>, VoiceSession) {
    let host = Arc::new(InMemoryHost::demo());
    let session = VoiceSession::start(host.clone(), config).await.unwrap();
    (host, session)
}

#[tokio::test]
async fn test_start_selects_default_engine_and_voice() {
    let (host, session) = demo_session(SpeechConfig::default()).await;

    assert_eq!(session.controller_state(), &ControllerState::Ready);
    assert_eq!(session.selection().engine_id(), Some(GOOGLE));
    assert_eq!(
        session.selection().voice().map(|v| v.id.as_str()),
        Some("en-us-x-sfg-local")
    );
    assert_eq!(host.active_engine().as_deref(), Some(GOOGLE));
    assert_eq!(host.active_voice().as_deref(), Some("en-us-x-sfg-local"));

    assert_eq!(session.languages(), vec!["de", "en", "es", "fr", "it", "ja", "ko", "pt"]);
    assert_eq!(session.voices().len(), 9);
    assert!(session.show_engine_picker());

    session.close().await.unwrap();
    assert!(host.is_shut_down());
}

#[tokio::test]
async fn test_presentation_profile_limits_languages() {
    let mut config = SpeechConfig::default();
    config.presentation.allowed_languages = Some(vec!["en".into(), "es".into(), "fr".into()]);
    config.presentation.initial_language = Some("es".to_string());
    let (host, session) = demo_session(config).await;

    assert_eq!(session.languages(), vec!["en", "es", "fr"]);
    assert_eq!(session.selection().language(), Some("es"));
    assert_eq!(
        session.selection().voice().map(|v| v.id.as_str()),
        Some("es-es-x-eea-local")
    );
    assert!(session.sample_text().starts_with("La vida"));
    assert_eq!(host.active_voice().as_deref(), Some("es-es-x-eea-local"));

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_speak_sample_uses_language_sample() {
    let (host, session) = demo_session(SpeechConfig::default()).await;
    let expected = session.presentation().sample_text(Some("en")).to_string();

    session.speak_sample().await.unwrap();
    assert_eq!(host.speaking(), Some(expected));

    session.stop().await.unwrap();
    assert!(host.speaking().is_none());
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_sample_text_falls_back_for_unknown_language() {
    let (_host, mut session) = demo_session(SpeechConfig::default()).await;

    session.select_language("ja").await.unwrap();
    assert_eq!(session.sample_text(), session.presentation().fallback_text);
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_select_engine_pushes_to_host() {
    let (host, mut session) = demo_session(SpeechConfig::default()).await;

    let selection = session.select_engine(SAMSUNG).await.unwrap();
    assert_eq!(selection.voice().map(|v| v.id.as_str()), Some("SMTl01-female"));
    assert_eq!(host.active_engine().as_deref(), Some(SAMSUNG));
    assert_eq!(host.active_voice().as_deref(), Some("SMTl01-female"));
    assert_eq!(session.voices().len(), 2);

    session.speak("hello").await.unwrap();
    assert!(host.calls().contains(&HostCall::SetVoice("SMTl01-female".to_string())));
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_engine_without_voices_cannot_speak() {
    let (host, mut session) = demo_session(SpeechConfig::default()).await;

    session.select_engine("org.example.silent").await.unwrap();
    assert!(session.selection().voice().is_none());
    assert!(session.voices().is_empty());

    let result = session.speak("hello").await;
    assert!(matches!(result, Err(SpeechError::InvalidSelection(_))));
    assert!(host.speaking().is_none());
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_initial_language_without_voices_leaves_no_voice() {
    let mut config = SpeechConfig::default();
    config.presentation.initial_language = Some("nl".to_string());
    let (_host, session) = demo_session(config).await;

    assert_eq!(session.selection().language(), Some("nl"));
    assert!(session.selection().voice().is_none());
    assert!(session.voices().is_empty());
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_select_voice_and_refresh_keep_selection() {
    let (_host, mut session) = demo_session(SpeechConfig::default()).await;

    session.select_voice("fr-fr-x-frd-local").await.unwrap();
    session.refresh().await.unwrap();
    assert_eq!(
        session.selection().voice().map(|v| v.id.as_str()),
        Some("fr-fr-x-frd-local")
    );

    let foreign = session.select_voice("SMTm01-male").await;
    assert!(matches!(foreign, Err(SpeechError::InvalidSelection(_))));
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_grouped_voices_follow_filter() {
    let (_host, mut session) = demo_session(SpeechConfig::default()).await;

    let groups = session.grouped_voices();
    assert_eq!(groups[0].language, "en");
    assert_eq!(groups[0].voices.len(), 3);

    session.select_language("fr").await.unwrap();
    let groups = session.grouped_voices();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].language, "fr");
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_single_engine_hides_picker() {
    let host = Arc::new(InMemoryHost::new("single").with_engine(
        EngineInfo::new("only", "Only engine"),
        vec![Voice::new("v1", LocaleTag::new("en", Some("US")), "only")],
    ));
    let session = VoiceSession::start(host, SpeechConfig::default()).await.unwrap();

    assert!(!session.show_engine_picker());
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_start_without_voices_releases_host() {
    let host = Arc::new(InMemoryHost::new("empty").with_engine(EngineInfo::new("A", "A"), vec![]));

    let result = VoiceSession::start(host.clone(), SpeechConfig::default()).await;
    assert!(matches!(result, Err(SpeechError::NoVoicesAvailable)));
    assert!(host.is_shut_down());
}

#[tokio::test]
async fn test_start_with_failed_initialization() {
    let host = Arc::new(InMemoryHost::demo().with_init_outcome(InitOutcome::Failed(-1)));

    let result = VoiceSession::start(host.clone(), SpeechConfig::default()).await;
    assert!(matches!(result, Err(SpeechError::InitializationFailed(-1))));
    assert!(host.is_shut_down());
    assert!(!host.calls().contains(&HostCall::Engines));
}

#[tokio::test]
async fn test_start_rejects_invalid_config() {
    let host = Arc::new(InMemoryHost::demo());
    let mut config = SpeechConfig::default();
    config.presentation.title = "   ".to_string();

    let result = VoiceSession::start(host.clone(), config).await;
    assert!(matches!(result, Err(SpeechError::Config(_))));
    assert!(host.calls().is_empty());
}
