//! Error types for a playback session.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Context or mainloop could not be created, or the server refused us
    #[error("Connection to audio server failed: {0}")]
    Connect(String),

    /// An introspection request was cancelled or the mainloop died under it
    #[error("Audio server request failed: {0}")]
    Request(String),

    #[error("Failed to load {module}: {reason}")]
    ModuleLoad { module: String, reason: String },

    /// Module acknowledged but the sink never showed up in the sink list
    #[error("Sink '{0}' did not appear after loading its module")]
    SinkNotVisible(String),

    #[error("Failed to spawn transcoder '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The child started but waiting on it failed
    #[error("Failed to wait for transcoder '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Transcoder exited unsuccessfully: {0}")]
    TranscoderExit(String),

    #[error("{0}")]
    Input(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
