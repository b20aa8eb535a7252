//! Playback session: connect, provision sinks, run the transcoder (once or
//! in a loop), tear everything down.

use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::SessionError;
use crate::pulse::{AudioServer, Connector};
use crate::sinks;
use crate::transcoder::{TranscodeJob, Transcoder};

/// What the user asked for. Fixed for the whole session.
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    pub file: PathBuf,
    pub sink_name: String,
    pub hear_audio: bool,
    pub loop_playback: bool,
    /// Unload the modules this session loaded before disconnecting
    pub unload_on_exit: bool,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct PlaybackReport {
    pub target_sink: String,
    pub mixed: bool,
    pub passes: u64,
    pub failed_passes: u64,
    pub interrupted: bool,
}

/// Run one playback session.
///
/// `shutdown` ends the session early; a pass that is still running when it
/// fires is abandoned and its transcoder killed. The server connection is
/// released on every path out of this function.
pub async fn play<C, T, F>(
    connector: &C,
    transcoder: &T,
    config: &Config,
    request: &PlaybackRequest,
    shutdown: F,
) -> Result<PlaybackReport, SessionError>
where
    C: Connector,
    T: Transcoder,
    F: Future<Output = ()>,
{
    let mut server = connector.connect()?;
    let mut loaded: Vec<u32> = Vec::new();

    let result = run_session(&mut server, transcoder, config, request, shutdown, &mut loaded).await;

    if request.unload_on_exit {
        // combine sink first, it depends on the null sink
        for index in loaded.iter().rev() {
            match server.unload_module(*index) {
                Ok(()) => log::info!("Unloaded module #{}", index),
                Err(e) => log::warn!("Failed to unload module #{}: {}", index, e),
            }
        }
    }
    server.disconnect();

    result
}

async fn run_session<S, T, F>(
    server: &mut S,
    transcoder: &T,
    config: &Config,
    request: &PlaybackRequest,
    shutdown: F,
    loaded: &mut Vec<u32>,
) -> Result<PlaybackReport, SessionError>
where
    S: AudioServer,
    T: Transcoder,
    F: Future<Output = ()>,
{
    let virtual_sink = sinks::ensure_virtual_sink(server, config, &request.sink_name).await?;
    loaded.extend(virtual_sink.module);

    let mut report = PlaybackReport {
        target_sink: virtual_sink.name.clone(),
        ..Default::default()
    };

    if request.hear_audio {
        if let Some(default_sink) = sinks::get_default_sink(server) {
            println!("Default sink: {}", default_sink);

            match sinks::create_combined_sink(server, config, &virtual_sink.name, &default_sink)
                .await
            {
                Ok(combined) => {
                    loaded.extend(combined.module);
                    report.target_sink = combined.name;
                    report.mixed = true;
                }
                Err(e) => {
                    log::error!("Failed to create combined sink: {}", e);
                    log::warn!("Continuing without local monitoring");
                }
            }
        } else {
            log::warn!("Audio server reports no default sink, playing without monitoring");
        }
    }

    let job = TranscodeJob {
        program: config.transcoder_program.clone(),
        input: request.file.clone(),
        target_sink: report.target_sink.clone(),
        channels: config.output_channels,
    };

    println!("Playing {} to {}", request.file.display(), report.target_sink);

    tokio::pin!(shutdown);
    loop {
        let outcome = tokio::select! {
            biased;
            _ = &mut shutdown => {
                log::info!("Shutdown requested, stopping playback");
                report.interrupted = true;
                break;
            }
            outcome = transcoder.run(&job) => outcome?,
        };

        report.passes += 1;
        if !outcome.success {
            report.failed_passes += 1;
            log::warn!("Transcoder pass {} ended with {}", report.passes, outcome);
            if !request.loop_playback {
                return Err(SessionError::TranscoderExit(outcome.to_string()));
            }
        }

        if request.loop_playback {
            println!("Restarting playback...");
        } else {
            println!("Playback complete");
            break;
        }
    }

    Ok(report)
}
