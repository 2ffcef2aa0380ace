use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use karen_assistant::Config;
use karen_assistant::assistant::{self, build_session, build_voice};
use karen_assistant::voice::Persona;

/// How long `voices` waits for the synthesizer to enumerate its voices
const VOICE_LOAD_TIMEOUT: Duration = Duration::from_secs(3);

/// Karen - keyword-driven voice assistant
#[derive(Parser)]
#[command(name = "karen", version, about)]
struct Cli {
    /// Wake word that arms the female persona for the next utterance
    #[arg(long, env = "KAREN_WAKE_WORD")]
    wake_word: Option<String>,

    /// Don't speak responses
    #[arg(long)]
    no_voice: bool,

    /// Don't listen on the microphone (typed input only)
    #[arg(long)]
    no_listen: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a single utterance, print and speak the reply
    Ask {
        /// What to ask
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List synthesizer voices and the persona selection
    Voices,
    /// Speak text with a persona
    Say {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the speech system.")]
        text: String,
        /// Use the male persona instead of the female one
        #[arg(long)]
        male: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn,karen_assistant=info",
        1 => "info,karen_assistant=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.no_voice)?;
    if let Some(wake_word) = cli.wake_word {
        config.wake_word = wake_word.trim().to_lowercase();
    }

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Ask { text } => ask(&config, &text.join(" ")).await,
            Command::Voices => list_voices(&config).await,
            Command::Say { text, male } => say(&config, &text, male).await,
        };
    }

    tracing::info!(
        wake_word = %config.wake_word,
        voice = config.voice.enabled,
        listen = !cli.no_listen,
        "starting assistant"
    );

    let (session, events) = build_session(&config, !cli.no_listen)?;
    println!(
        "Type a message and press enter. Say \"{}\" to switch persona. /listen restarts the microphone, /quit exits.",
        config.wake_word
    );

    assistant::run(session, events).await?;
    Ok(())
}

/// Resolve one utterance as if it had been typed
async fn ask(config: &Config, text: &str) -> anyhow::Result<()> {
    let (mut session, _) = build_session(config, false)?;
    session.on_typed_input(text);
    session.settle().await;
    session.finish_speaking().await;
    Ok(())
}

/// Print voices and the persona selection
async fn list_voices(config: &Config) -> anyhow::Result<()> {
    let mut voice = build_voice(config);
    if !voice.is_available() {
        println!("No speech synthesizer found (install espeak-ng, or use say on macOS)");
        return Ok(());
    }

    let mut changes = voice.watch_voices();

    if changes.borrow().is_empty() {
        let _ = tokio::time::timeout(VOICE_LOAD_TIMEOUT, changes.changed()).await;
        voice.reload_voices();
    }

    let voices = changes.borrow().clone();
    if voices.is_empty() {
        println!("The synthesizer reported no voices");
        return Ok(());
    }

    for v in &voices {
        println!("{:<40} {:<12} {}", v.name, v.language, v.id);
    }

    println!("---");
    for persona in [Persona::Male, Persona::Female] {
        let name = voice
            .selection()
            .voice_for(persona)
            .map_or("(default)", |v| v.name.as_str());
        println!("{persona:?}: {name}");
    }

    Ok(())
}

/// Speak text and wait for playback to finish
async fn say(config: &Config, text: &str, male: bool) -> anyhow::Result<()> {
    let mut voice = build_voice(config);
    let mut changes = voice.watch_voices();

    // Give the synthesizer a moment so the persona voice is used
    if changes.borrow().is_empty() {
        let _ = tokio::time::timeout(VOICE_LOAD_TIMEOUT, changes.changed()).await;
        voice.reload_voices();
    }

    let persona = if male { Persona::Male } else { Persona::Female };
    voice.speak(text, persona);
    voice.wait_until_silent().await;
    Ok(())
}
