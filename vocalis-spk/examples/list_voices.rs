//! List installed voices grouped by language

use std::sync::Arc;
use vocalis_spk::engines::memory::InMemoryHost;
use vocalis_spk::engines::native::NativeHost;
use vocalis_spk::engines::SpeechHost;
use vocalis_spk::{SpeechConfig, VoiceSession};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = SpeechConfig::load_default()?;

    // Fall back to canned engines when no native synthesizer is installed
    let session = match VoiceSession::start(Arc::new(NativeHost::new()), config.clone()).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Native speech unavailable ({}), using demo engines", e);
            let host: Arc<dyn SpeechHost> = Arc::new(InMemoryHost::demo());
            VoiceSession::start(host, config).await?
        }
    };

    if let Some(snapshot) = session.snapshot() {
        for (engine, count) in snapshot.engine_summaries() {
            println!("{} [{}] ({} voices)", engine.label, engine.id, count);
        }
    }

    for group in session.grouped_voices() {
        println!("\n{}", group.language);
        for voice in &group.voices {
            match voice.quality_label() {
                Some(quality) => println!("  {}  {}  {}", voice.id, voice.display_name(), quality),
                None => println!("  {}  {}", voice.id, voice.display_name()),
            }
        }
    }

    session.close().await?;
    Ok(())
}
