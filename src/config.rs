#[derive(Debug, Clone)]
pub struct Config {
    // Client name announced to the audio server
    pub client_name: String,

    // Virtual sink
    pub default_sink_name: String,
    pub virtual_sink_description: String,

    // Combined sink
    pub combined_sink_name: String,
    pub combined_sink_description: String,

    // Transcoder (program can be overridden on the command line)
    pub transcoder_program: String,
    pub output_channels: u8,

    // Polling budget for a freshly loaded sink to show up
    pub settle_attempts: u32,
    pub settle_interval_ms: u64,
}

impl Config {
    /// Build the configuration from the environment variables set at compile
    /// time. Every value comes from config.toml.
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            client_name: env!("CLIENT_NAME").to_string(),

            default_sink_name: env!("VIRTUAL_SINK_NAME").to_string(),
            virtual_sink_description: env!("VIRTUAL_SINK_DESCRIPTION").to_string(),

            combined_sink_name: env!("COMBINED_SINK_NAME").to_string(),
            combined_sink_description: env!("COMBINED_SINK_DESCRIPTION").to_string(),

            transcoder_program: env!("TRANSCODER_PROGRAM").to_string(),
            output_channels: env!("TRANSCODER_CHANNELS").parse()
                .map_err(|_| "Failed to parse TRANSCODER_CHANNELS")?,

            settle_attempts: env!("SETTLE_ATTEMPTS").parse()
                .map_err(|_| "Failed to parse SETTLE_ATTEMPTS")?,
            settle_interval_ms: env!("SETTLE_INTERVAL_MS").parse()
                .map_err(|_| "Failed to parse SETTLE_INTERVAL_MS")?,
        })
    }

    /// Application name and version as baked in at build time.
    pub fn app_version() -> String {
        format!("{} {}", env!("APP_NAME"), env!("APP_VERSION"))
    }
}
