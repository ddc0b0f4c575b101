//! Tests for the native command-line host

use vocalis_spk::engines::native::{parse_espeak_voices, parse_say_voices, NativeBackend, NativeHost};
use vocalis_spk::engines::{QueueMode, SpeechHost};
use vocalis_spk::{LocaleTag, VoiceTag};

#[test]
fn test_backend_matches_platform() {
    let backend = NativeBackend::detect();
    if cfg!(target_os = "macos") {
        assert_eq!(backend, NativeBackend::Say);
    } else {
        assert_eq!(backend, NativeBackend::EspeakNg);
    }
    assert_eq!(backend.engine_info().id, backend.program());
}

#[test]
fn test_espeak_listing_with_variants() {
    let output = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  de              --/M      German             gmw/de
 5  pt-br           --/F      Portuguese_(Brazil) roa/pt-BR            (pt 6)
 5  cmn             --/M      Chinese_(Mandarin) sit/cmn              (zh-cmn 5)(zh 5)
";
    let voices = parse_espeak_voices(output, "espeak-ng");
    assert_eq!(voices.len(), 3);
    assert_eq!(voices[1].locale, LocaleTag::new("pt", Some("BR")));
    assert_eq!(voices[1].gender_hint(), Some(VoiceTag::Female));
    assert_eq!(voices[2].language(), "cmn");
    assert!(voices.iter().all(|v| v.engine_id == "espeak-ng"));
}

#[test]
fn test_malformed_lines_are_skipped() {
    let output = "\
Pty Language Age/Gender VoiceName File
garbage
 5  1234    --/M      Numbers    x/y
";
    assert!(parse_espeak_voices(output, "espeak-ng").is_empty());
    assert!(parse_say_voices("NoLocaleHere\n# only a comment\n", "say").is_empty());
}

#[test]
fn test_say_listing_display_names() {
    let voices = parse_say_voices("Amélie              fr_CA    # Bonjour, je m'appelle Amélie.\n", "say");
    assert_eq!(voices.len(), 1);
    assert_eq!(voices[0].display_name(), "French - Voice (Canada)");
}

#[tokio::test]
async fn test_host_reports_single_engine() {
    let host = NativeHost::with_backend(NativeBackend::EspeakNg, 1000);
    let engines = host.engines().await.unwrap();
    assert_eq!(engines.len(), 1);
    assert_eq!(host.default_engine().await.unwrap(), "espeak-ng");
    assert_eq!(host.name(), "native");
}

#[tokio::test]
async fn test_uninitialized_host_is_quiet() {
    let host = NativeHost::with_backend(NativeBackend::Say, 175);
    assert!(!host.is_speaking());
    assert!(host.speak("hello", QueueMode::Add).await.is_err());
    assert!(host.shutdown().await.is_ok());
}
