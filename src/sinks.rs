//! Sink provisioning: the virtual capture sink and the optional combine sink
//! that mirrors it to the default output.

use std::time::Duration;

use crate::config::Config;
use crate::error::SessionError;
use crate::pulse::AudioServer;

pub const NULL_SINK_MODULE: &str = "module-null-sink";
pub const COMBINE_SINK_MODULE: &str = "module-combine-sink";

/// A sink the session can target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedSink {
    pub name: String,
    /// Module index loaded by this session, `None` if the sink was already there
    pub module: Option<u32>,
}

/// Module arguments for a null sink named `name`.
pub fn null_sink_args(name: &str, description: &str) -> String {
    format!(
        "sink_name={} sink_properties=device.description=\"{}\"",
        name, description
    )
}

/// Module arguments for a combine sink fanning out to `slaves`.
pub fn combine_sink_args(name: &str, slaves: &[&str], description: &str) -> String {
    format!(
        "sink_name={} slaves={} sink_properties=device.description=\"{}\"",
        name,
        slaves.join(","),
        description
    )
}

/// Make sure a null sink called `name` exists, loading one if needed.
pub async fn ensure_virtual_sink<S: AudioServer>(
    server: &mut S,
    config: &Config,
    name: &str,
) -> Result<ProvisionedSink, SessionError> {
    if server.sink_exists(name)? {
        println!("Using existing sink: {}", name);
        return Ok(ProvisionedSink {
            name: name.to_string(),
            module: None,
        });
    }

    println!("Creating virtual sink: {}", name);
    let args = null_sink_args(name, &config.virtual_sink_description);
    let index = server.load_module(NULL_SINK_MODULE, &args)?;
    log::info!("Loaded {} #{} ({})", NULL_SINK_MODULE, index, args);

    settle(server, config, name, index).await?;

    Ok(ProvisionedSink {
        name: name.to_string(),
        module: Some(index),
    })
}

/// Create the combine sink that plays `virtual_name` and `default_name`
/// together.
///
/// A sink already registered under the combined name is reused only when
/// it fans out to exactly these two sinks. Otherwise its module is
/// unloaded and a fresh combine sink is loaded in its place.
pub async fn create_combined_sink<S: AudioServer>(
    server: &mut S,
    config: &Config,
    virtual_name: &str,
    default_name: &str,
) -> Result<ProvisionedSink, SessionError> {
    let name = config.combined_sink_name.as_str();
    let slaves = [virtual_name, default_name];

    if server.sink_exists(name)? {
        let Some(owner) = server.sink_owner_module(name)? else {
            return Err(SessionError::ModuleLoad {
                module: COMBINE_SINK_MODULE.to_string(),
                reason: format!("existing sink '{}' has no owner module to replace", name),
            });
        };

        let argument = server.module_argument(owner)?;
        let current = argument.as_deref().and_then(slaves_of);
        if current == Some(slaves.join(",").as_str()) {
            log::info!("Reusing existing combined sink: {}", name);
            return Ok(ProvisionedSink {
                name: name.to_string(),
                module: None,
            });
        }

        log::info!(
            "Replacing combined sink {} (module #{}, slaves {})",
            name,
            owner,
            current.unwrap_or("unknown")
        );
        server.unload_module(owner)?;
    }

    let args = combine_sink_args(name, &slaves, &config.combined_sink_description);
    let index = server.load_module(COMBINE_SINK_MODULE, &args)?;
    log::info!("Loaded {} #{} ({})", COMBINE_SINK_MODULE, index, args);

    settle(server, config, name, index).await?;

    Ok(ProvisionedSink {
        name: name.to_string(),
        module: Some(index),
    })
}

/// The `slaves=` value of a combine sink's module arguments.
fn slaves_of(args: &str) -> Option<&str> {
    args.split_whitespace()
        .find_map(|kv| kv.strip_prefix("slaves="))
        .map(|v| v.trim_matches('"'))
}

/// The server's default sink, or `None` if it has none or the query failed.
pub fn get_default_sink<S: AudioServer>(server: &mut S) -> Option<String> {
    match server.default_sink() {
        Ok(sink) => sink,
        Err(e) => {
            log::warn!("Failed to query default sink: {}", e);
            None
        }
    }
}

/// Wait for a freshly loaded module's sink to show up in the sink list.
///
/// Polls up to `settle_attempts` times with linear backoff. If the sink
/// never appears the module is unloaded again.
async fn settle<S: AudioServer>(
    server: &mut S,
    config: &Config,
    name: &str,
    module: u32,
) -> Result<(), SessionError> {
    for attempt in 1..=config.settle_attempts {
        if server.sink_exists(name)? {
            log::debug!("Sink {} visible after {} check(s)", name, attempt);
            return Ok(());
        }
        if attempt == config.settle_attempts {
            break;
        }
        let delay = Duration::from_millis(config.settle_interval_ms * u64::from(attempt));
        tokio::time::sleep(delay).await;
    }

    log::error!(
        "Sink {} not visible after {} checks, unloading module #{}",
        name,
        config.settle_attempts,
        module
    );
    if let Err(e) = server.unload_module(module) {
        log::warn!("Failed to unload module #{}: {}", module, e);
    }
    Err(SessionError::SinkNotVisible(name.to_string()))
}
