//! Tests for error handling in vocalis-spk
//! Tests for error propagation and recovery paths

use std::sync::Arc;
use vocalis_spk::config::CatalogConfig;
use vocalis_spk::engines::memory::{InMemoryHost, InitOutcome};
use vocalis_spk::error::SpeechError;
use vocalis_spk::{EngineInfo, LocaleTag, SpeechConfig, Voice, VoiceCatalog, VoiceSession};

#[test]
fn test_speech_error_display() {
    let errors = vec![
        SpeechError::InitializationFailed(-1),
        SpeechError::VoiceDataMissing,
        SpeechError::NoVoicesAvailable,
        SpeechError::InvalidSelection("Unknown engine: x".to_string()),
        SpeechError::Engine("Test engine error".to_string()),
        SpeechError::Controller("Test controller error".to_string()),
        SpeechError::Config("Test config error".to_string()),
        SpeechError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "Test IO error")),
    ];

    for error in errors {
        let error_str = format!("{}", error);
        assert!(!error_str.is_empty());
    }
}

#[test]
fn test_initialization_status_in_message() {
    let error = SpeechError::InitializationFailed(-1);
    assert!(error.to_string().contains("-1"));
}

#[test]
fn test_no_voices_message_suggests_install() {
    let message = SpeechError::NoVoicesAvailable.to_string();
    assert!(message.contains("install a Text-to-Speech engine"));
}

#[test]
fn test_voice_data_missing_is_recoverable() {
    assert!(SpeechError::VoiceDataMissing.needs_voice_data_install());
    assert!(!SpeechError::NoVoicesAvailable.needs_voice_data_install());
    assert!(!SpeechError::InitializationFailed(-1).needs_voice_data_install());
}

#[test]
fn test_speech_error_from_io_error() {
    let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
    let speech_error: SpeechError = io_error.into();

    match speech_error {
        SpeechError::Io(_) => {}
        _ => panic!("Expected Io error"),
    }
}

#[test]
fn test_invalid_locale_string() {
    let result: Result<LocaleTag, SpeechError> = "12-34".parse();
    assert!(matches!(result, Err(SpeechError::Config(_))));

    let parsed: LocaleTag = "es_MX".parse().unwrap();
    assert_eq!(parsed.to_string(), "es-MX");
}

#[tokio::test]
async fn test_failed_refresh_leaves_catalog_empty() {
    let empty = Arc::new(InMemoryHost::new("empty"));
    let mut catalog = VoiceCatalog::new(empty, CatalogConfig::default());

    let result = catalog.refresh(&[]).await;
    assert!(matches!(result, Err(SpeechError::NoVoicesAvailable)));
    assert!(catalog.snapshot().is_none());
    assert!(catalog.available_voices().is_empty());
    assert!(matches!(catalog.select_language("en"), Err(SpeechError::InvalidSelection(_))));
}

#[tokio::test]
async fn test_engine_enumeration_failure_is_not_fatal() {
    let host = Arc::new(
        InMemoryHost::new("test")
            .with_engine(EngineInfo::new("good", "Good"), vec![Voice::new("v1", LocaleTag::language("en"), "good")])
            .with_engine(EngineInfo::new("bad", "Bad"), vec![Voice::new("v2", LocaleTag::language("de"), "bad")])
            .with_failing_engine("bad"),
    );
    let session = VoiceSession::start(host, SpeechConfig::default()).await.unwrap();

    assert_eq!(session.languages(), vec!["en"]);
    assert!(!session.show_engine_picker());
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_session_start_error_variants() {
    let host = Arc::new(InMemoryHost::demo().with_init_outcome(InitOutcome::VoiceDataMissing));
    let err = VoiceSession::start(host, SpeechConfig::default()).await.err().unwrap();
    assert!(err.needs_voice_data_install());

    let mut config = SpeechConfig::default();
    config.catalog.preferred_engine = Some("org.missing".to_string());
    let host = Arc::new(InMemoryHost::demo());
    let err = VoiceSession::start(host.clone(), config).await.err().unwrap();
    assert!(matches!(err, SpeechError::InitializationFailed(-1)));
    assert!(host.is_shut_down());
}
