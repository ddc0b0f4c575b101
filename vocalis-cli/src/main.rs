// Vocalis Command Line Interface
// Browse installed speech engines and voices, and try them out

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use vocalis_spk::engines::memory::InMemoryHost;
use vocalis_spk::engines::native::NativeHost;
use vocalis_spk::engines::SpeechHost;
use vocalis_spk::{SpeechConfig, SpeechError, VoiceSession};

#[derive(Parser)]
#[command(name = "vocalis")]
#[command(about = "Vocalis - browse and try text-to-speech voices", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to the user config directory)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Use built-in demo engines instead of the platform synthesizer
    #[arg(long, global = true)]
    demo: bool,

    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List installed engines
    Engines,

    /// List languages with at least one voice
    Languages,

    /// List voices, grouped by language
    Voices {
        /// Engine to list (defaults to the host's default engine)
        #[arg(long, short)]
        engine: Option<String>,

        /// Only voices for this language code
        #[arg(long, short)]
        language: Option<String>,

        /// Print the full catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Speak text (or the language's sample paragraph)
    Speak {
        /// Text to speak
        text: Option<String>,

        #[arg(long, short)]
        engine: Option<String>,

        #[arg(long, short)]
        language: Option<String>,

        /// Voice id on the selected engine
        #[arg(long)]
        voice: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &cli.config {
        Some(path) => SpeechConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SpeechConfig::load_default().context("Failed to load default config")?,
    };

    let mut session = start_session(config, cli.demo).await?;
    let result = run(&cli.command, &mut session, cli.demo).await;
    if let Err(ref e) = result {
        debug!("Command failed: {:?}", e);
    }
    if let Err(e) = session.close().await {
        warn!("Failed to release speech host: {}", e);
    }
    result
}

async fn start_session(config: SpeechConfig, demo: bool) -> anyhow::Result<VoiceSession> {
    let host: Arc<dyn SpeechHost> = if demo {
        Arc::new(InMemoryHost::demo())
    } else {
        Arc::new(NativeHost::new())
    };

    match VoiceSession::start(host, config).await {
        Ok(session) => Ok(session),
        Err(e) if e.needs_voice_data_install() => {
            anyhow::bail!("{}. Install voice data for your synthesizer and try again.", e)
        }
        Err(SpeechError::InitializationFailed(status)) if !demo => anyhow::bail!(
            "Could not start the platform synthesizer (status {}). Is espeak-ng installed? Use --demo to try the built-in engines.",
            status
        ),
        Err(e) => Err(e.into()),
    }
}

async fn run(command: &Commands, session: &mut VoiceSession, demo: bool) -> anyhow::Result<()> {
    match command {
        Commands::Engines => {
            list_engines(session);
        }
        Commands::Languages => {
            for language in session.languages() {
                println!("{}", language);
            }
        }
        Commands::Voices { engine, language, json } => {
            apply_selection(session, engine.as_deref(), language.as_deref(), None).await?;
            if *json {
                let snapshot = session.snapshot().context("Voice catalog not loaded")?;
                println!("{}", serde_json::to_string_pretty(&*snapshot)?);
            } else {
                list_voices(session);
            }
        }
        Commands::Speak { text, engine, language, voice } => {
            apply_selection(session, engine.as_deref(), language.as_deref(), voice.as_deref()).await?;
            match text {
                Some(text) => session.speak(text).await?,
                None => session.speak_sample().await?,
            }
            if let Some(voice) = session.selection().voice() {
                println!("Speaking with {} ({})", voice.display_name(), voice.id);
            }
            // The demo host never finishes an utterance on its own
            if !demo {
                wait_for_playback(session).await?;
            }
        }
    }
    Ok(())
}

async fn apply_selection(
    session: &mut VoiceSession,
    engine: Option<&str>,
    language: Option<&str>,
    voice: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(engine) = engine {
        session.select_engine(engine).await?;
    }
    if let Some(language) = language {
        session.select_language(language).await?;
    }
    if let Some(voice) = voice {
        session.select_voice(voice).await?;
    }
    Ok(())
}

fn list_engines(session: &VoiceSession) {
    let Some(snapshot) = session.snapshot() else {
        return;
    };
    let active = session.selection().engine_id();
    for (engine, count) in snapshot.engine_summaries() {
        let marker = if Some(engine.id.as_str()) == active { "*" } else { " " };
        println!("{} {} [{}] ({} voices)", marker, engine.label, engine.id, count);
    }
}

fn list_voices(session: &VoiceSession) {
    let selected = session.selection().voice().map(|v| v.id.clone());
    let print_voice = |voice: &vocalis_spk::Voice, indent: &str| {
        let marker = if selected.as_deref() == Some(voice.id.as_str()) { "*" } else { " " };
        match voice.quality_label() {
            Some(quality) => println!("{}{} {}  {}  [{}]", indent, marker, voice.display_name(), voice.id, quality),
            None => println!("{}{} {}  {}", indent, marker, voice.display_name(), voice.id),
        }
    };

    if session.presentation().group_by_language {
        for group in session.grouped_voices() {
            println!("{}", group.language);
            for voice in &group.voices {
                print_voice(voice, "  ");
            }
        }
    } else {
        for voice in session.voices() {
            print_voice(&voice, "");
        }
    }
}

async fn wait_for_playback(session: &VoiceSession) -> anyhow::Result<()> {
    let playback = async {
        while session.is_speaking() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    };

    tokio::select! {
        _ = playback => Ok(()),
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!("Failed to listen for ctrl-c: {}", e);
            }
            session.stop().await?;
            Ok(())
        }
    }
}
