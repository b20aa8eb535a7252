mod config;
mod error;
mod player;
mod prompt;
mod pulse;
mod sinks;
mod transcoder;

use clap::{Parser, ValueEnum};
use config::Config;
use error::SessionError;
use player::{PlaybackReport, PlaybackRequest};
use prompt::Prompter;
use pulse::PulseConnector;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::signal;
use transcoder::ProcessTranscoder;

#[derive(Parser)]
#[command(name = "virtual_mic_rs")]
#[command(version)]
#[command(about = "Stream an audio file into a virtual microphone sink", long_about = None)]
struct Cli {
    /// Audio file to play; without it the program asks interactively
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Virtual sink name (blank for the configured default)
    #[arg(short, long)]
    sink: Option<String>,

    /// Also play the audio on the default output
    #[arg(long)]
    hear: bool,

    /// Restart playback every time the file ends
    #[arg(long = "loop")]
    loop_playback: bool,

    /// Unload the sinks created by this run when it ends
    #[arg(long)]
    unload_on_exit: bool,

    /// Transcoder executable (looked up on PATH)
    #[arg(long)]
    transcoder: Option<String>,

    /// Format of the final report
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logging defaults to info, RUST_LOG overrides
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Build-time configuration
    let mut config = match Config::new() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", SessionError::Config(e.to_string()));
            return ExitCode::FAILURE;
        }
    };
    if let Some(program) = &cli.transcoder {
        config.transcoder_program = program.clone();
    }
    log::debug!("{} starting with {:?}", Config::app_version(), config);

    // Without --file, ask interactively
    let request = match build_request(&cli, &config) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Playing audio file: {}", request.file.display());
    println!("Using sink name: {}", request.sink_name);
    println!("Hear audio: {}", yes_no(request.hear_audio));
    println!("Loop playback: {}", yes_no(request.loop_playback));

    // Ctrl+C ends the loop and still tears the connection down
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            log::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let connector = PulseConnector::new(config.client_name.clone());
    match player::play(&connector, &ProcessTranscoder, &config, &request, shutdown).await {
        Ok(report) => {
            if let Err(e) = print_report(&report, &cli.format) {
                log::error!("Failed to print report: {}", e);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_request(cli: &Cli, config: &Config) -> Result<PlaybackRequest, SessionError> {
    match &cli.file {
        Some(file) => {
            prompt::check_readable(file)?;
            Ok(PlaybackRequest {
                file: file.clone(),
                sink_name: prompt::resolve_sink_name(
                    cli.sink.as_deref().unwrap_or(""),
                    &config.default_sink_name,
                )?,
                hear_audio: cli.hear,
                loop_playback: cli.loop_playback,
                unload_on_exit: cli.unload_on_exit,
            })
        }
        None => {
            let stdin = std::io::stdin();
            let answers =
                Prompter::new(stdin.lock(), std::io::stdout()).collect(&config.default_sink_name)?;
            Ok(PlaybackRequest {
                file: answers.file,
                sink_name: answers.sink_name,
                hear_audio: answers.hear_audio,
                loop_playback: answers.loop_playback,
                unload_on_exit: cli.unload_on_exit,
            })
        }
    }
}

fn print_report(report: &PlaybackReport, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!(
                "Finished: {} pass(es) to {}{}{}",
                report.passes,
                report.target_sink,
                if report.failed_passes > 0 {
                    format!(", {} failed", report.failed_passes)
                } else {
                    String::new()
                },
                if report.interrupted { " (interrupted)" } else { "" },
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(report)?);
        }
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}
