use std::fs;
use std::path::Path;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    application: Application,
    virtual_sink: VirtualSink,
    combined_sink: CombinedSink,
    transcoder: Transcoder,
    provisioning: Provisioning,
}

#[derive(Deserialize)]
struct Application {
    name: String,
    version: String,
    client_name: String,
}

#[derive(Deserialize)]
struct VirtualSink {
    default_name: String,
    description: String,
}

#[derive(Deserialize)]
struct CombinedSink {
    name: String,
    description: String,
}

#[derive(Deserialize)]
struct Transcoder {
    program: String,
    channels: u8,
}

#[derive(Deserialize)]
struct Provisioning {
    settle_attempts: u32,
    settle_interval_ms: u64,
}


// Read config.toml at compile time and export it as environment variables
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    // Application
    println!("cargo:rustc-env=APP_NAME={}", config.application.name);
    println!("cargo:rustc-env=APP_VERSION={}", config.application.version);
    println!("cargo:rustc-env=CLIENT_NAME={}", config.application.client_name);

    // Virtual sink
    println!("cargo:rustc-env=VIRTUAL_SINK_NAME={}", config.virtual_sink.default_name);
    println!("cargo:rustc-env=VIRTUAL_SINK_DESCRIPTION={}", config.virtual_sink.description);

    // Combined sink
    println!("cargo:rustc-env=COMBINED_SINK_NAME={}", config.combined_sink.name);
    println!("cargo:rustc-env=COMBINED_SINK_DESCRIPTION={}", config.combined_sink.description);

    // Transcoder
    println!("cargo:rustc-env=TRANSCODER_PROGRAM={}", config.transcoder.program);
    println!("cargo:rustc-env=TRANSCODER_CHANNELS={}", config.transcoder.channels);

    // Module load confirmation
    println!("cargo:rustc-env=SETTLE_ATTEMPTS={}", config.provisioning.settle_attempts);
    println!("cargo:rustc-env=SETTLE_INTERVAL_MS={}", config.provisioning.settle_interval_ms);
}
