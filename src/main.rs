use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use whisper_relay::{
    create_router, export, AppState, Config, TranscriptResult, TranscriptionClient,
    TranscriptionSession,
};

#[derive(Parser)]
#[command(
    name = "whisper-relay",
    about = "Speech-to-text front-end for Groq's hosted Whisper API",
    version
)]
struct Cli {
    /// Config file (TOML, extension omitted)
    #[arg(long, global = true, default_value = "config/whisper-relay")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transcribe an existing audio file
    Transcribe {
        /// Audio file (.mp3 .mp4 .mpeg .mpga .m4a .wav .webm)
        file: PathBuf,

        /// Language code; repeat for one transcript per language
        #[arg(long = "language")]
        languages: Vec<String>,

        /// Write the transcript to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Copy the transcript to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Record from the default microphone, then transcribe
    Record {
        /// Capture length in seconds (default: configured record duration)
        #[arg(long)]
        duration: Option<u64>,

        /// Language code; repeat for one transcript per language
        #[arg(long = "language")]
        languages: Vec<String>,

        /// Write the transcript to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Copy the transcript to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Run the HTTP front-end
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    info!("{} starting", config.service.name);

    // Missing credential is a startup failure, not a mid-pipeline surprise
    let api_key = config.api_key()?;
    let client = TranscriptionClient::new(api_key, config.transcription.clone());
    let session = TranscriptionSession::new(config.clone(), client);

    match cli.command {
        Command::Transcribe {
            file,
            languages,
            output,
            copy,
        } => {
            let result = session.transcribe_file(&file, &languages).await?;
            finish(&result, output.as_deref(), copy);
        }

        Command::Record {
            duration,
            languages,
            output,
            copy,
        } => {
            let duration = duration.unwrap_or(config.audio.record_duration_secs);
            let result = session.transcribe_recording(duration, &languages).await?;
            finish(&result, output.as_deref(), copy);
        }

        Command::Serve => {
            let state = AppState::new(session);
            let app = create_router(state);

            let addr = format!("{}:{}", config.service.http.bind, config.service.http.port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("HTTP server listening on {}", addr);

            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

/// Print the transcript and run the secondary actions. Export and clipboard
/// failures are notices, not errors; the transcript was still produced.
fn finish(result: &TranscriptResult, output: Option<&Path>, copy: bool) {
    println!("{}", result.text);
    info!(
        "Transcription complete! Time taken: {:.2} seconds",
        result.elapsed_seconds
    );

    if let Some(path) = output {
        match export::save_transcript(&result.text, path) {
            Ok(()) => info!("Transcript saved to {}", path.display()),
            Err(e) => warn!("{:#}", e),
        }
    }

    if copy {
        match export::copy_to_clipboard(&result.text) {
            Ok(()) => info!("Transcript copied to clipboard"),
            Err(e) => warn!("{:#}", e),
        }
    }
}
