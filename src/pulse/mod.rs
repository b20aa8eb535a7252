//! pulse - Audio-server client for PulseAudio-compatible servers
//!
//! The rest of the crate talks to the server through the [`AudioServer`]
//! and [`Connector`] traits; `PulseConnection` is the libpulse-backed
//! implementation used by the binary.

mod connection;
#[cfg(test)]
pub mod mock;

pub use connection::PulseConnector;

use crate::error::SessionError;

/// Requests a playback session issues against a connected audio server.
///
/// Every call blocks until the server has answered.
pub trait AudioServer {
    /// True if a sink with exactly this name is currently registered.
    fn sink_exists(&mut self, name: &str) -> Result<bool, SessionError>;

    /// Name of the server's current default sink, if it reports one.
    fn default_sink(&mut self) -> Result<Option<String>, SessionError>;

    /// Load a module and return the index the server assigned to it.
    fn load_module(&mut self, module: &str, args: &str) -> Result<u32, SessionError>;

    fn unload_module(&mut self, index: u32) -> Result<(), SessionError>;

    /// Index of the module that owns sink `name`. `None` if the sink is
    /// missing or not owned by a module.
    fn sink_owner_module(&mut self, name: &str) -> Result<Option<u32>, SessionError>;

    /// Argument string module `index` was loaded with.
    fn module_argument(&mut self, index: u32) -> Result<Option<String>, SessionError>;

    /// Tear the connection down. Safe to call more than once.
    fn disconnect(&mut self);
}

/// Opens a fresh [`AudioServer`] connection for one session.
pub trait Connector {
    type Server: AudioServer;

    fn connect(&self) -> Result<Self::Server, SessionError>;
}
