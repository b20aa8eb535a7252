//! Scripted in-memory audio server used by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use super::{AudioServer, Connector};
use crate::error::SessionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SinkExists(String),
    DefaultSink,
    LoadModule { module: String, args: String },
    UnloadModule(u32),
    SinkOwner(String),
    ModuleArgument(u32),
    Disconnect,
}

/// Calls seen by a [`MockServer`], shared with the test after the server
/// has been moved into a session.
pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub struct MockServer {
    pub sinks: Vec<String>,
    /// Loaded modules as `(index, args)`
    pub modules: Vec<(u32, String)>,
    pub default_sink: Option<String>,
    /// Module names whose load request is answered with a failure
    pub failing_modules: Vec<String>,
    /// When false, loaded modules never register their sink
    pub sinks_appear: bool,
    /// Number of checks a freshly loaded sink stays invisible for
    pub appear_after: usize,
    pub calls: CallLog,
    pending: Vec<(String, usize)>,
    next_index: u32,
}

impl MockServer {
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            modules: Vec::new(),
            default_sink: None,
            failing_modules: Vec::new(),
            sinks_appear: true,
            appear_after: 0,
            calls: Rc::new(RefCell::new(Vec::new())),
            pending: Vec::new(),
            next_index: 20,
        }
    }

    pub fn with_sink(mut self, name: &str) -> Self {
        self.sinks.push(name.to_string());
        self
    }

    /// A sink owned by an already loaded module, as left behind by an
    /// earlier session.
    pub fn with_module_sink(mut self, index: u32, args: &str) -> Self {
        if let Some(name) = sink_name_of(args) {
            self.sinks.push(name.to_string());
        }
        self.modules.push((index, args.to_string()));
        self
    }

    pub fn with_default_sink(mut self, name: &str) -> Self {
        self.default_sink = Some(name.to_string());
        self
    }

    pub fn failing(mut self, module: &str) -> Self {
        self.failing_modules.push(module.to_string());
        self
    }

    pub fn log(&self) -> CallLog {
        self.calls.clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

fn sink_name_of(args: &str) -> Option<&str> {
    args.split_whitespace()
        .find_map(|kv| kv.strip_prefix("sink_name="))
}

/// All `LoadModule` calls in order, as `(module, args)`.
pub fn loads(log: &CallLog) -> Vec<(String, String)> {
    log.borrow()
        .iter()
        .filter_map(|c| match c {
            Call::LoadModule { module, args } => Some((module.clone(), args.clone())),
            _ => None,
        })
        .collect()
}

impl AudioServer for MockServer {
    fn sink_exists(&mut self, name: &str) -> Result<bool, SessionError> {
        self.record(Call::SinkExists(name.to_string()));

        if let Some(pos) = self.pending.iter().position(|(s, _)| s == name) {
            if self.pending[pos].1 == 0 {
                let (sink, _) = self.pending.remove(pos);
                self.sinks.push(sink);
            } else {
                self.pending[pos].1 -= 1;
            }
        }

        Ok(self.sinks.iter().any(|s| s == name))
    }

    fn default_sink(&mut self) -> Result<Option<String>, SessionError> {
        self.record(Call::DefaultSink);
        Ok(self.default_sink.clone())
    }

    fn load_module(&mut self, module: &str, args: &str) -> Result<u32, SessionError> {
        self.record(Call::LoadModule {
            module: module.to_string(),
            args: args.to_string(),
        });

        if self.failing_modules.iter().any(|m| m == module) {
            return Err(SessionError::ModuleLoad {
                module: module.to_string(),
                reason: "Module initialization failed".to_string(),
            });
        }

        if self.sinks_appear {
            if let Some(name) = sink_name_of(args) {
                if self.appear_after == 0 {
                    self.sinks.push(name.to_string());
                } else {
                    self.pending.push((name.to_string(), self.appear_after));
                }
            }
        }

        self.next_index += 1;
        self.modules.push((self.next_index, args.to_string()));
        Ok(self.next_index)
    }

    fn unload_module(&mut self, index: u32) -> Result<(), SessionError> {
        self.record(Call::UnloadModule(index));

        if let Some(pos) = self.modules.iter().position(|(i, _)| *i == index) {
            let (_, args) = self.modules.remove(pos);
            if let Some(name) = sink_name_of(&args) {
                self.sinks.retain(|s| s != name);
                self.pending.retain(|(s, _)| s != name);
            }
        }
        Ok(())
    }

    fn sink_owner_module(&mut self, name: &str) -> Result<Option<u32>, SessionError> {
        self.record(Call::SinkOwner(name.to_string()));
        if !self.sinks.iter().any(|s| s == name) {
            return Ok(None);
        }
        Ok(self
            .modules
            .iter()
            .find(|(_, args)| sink_name_of(args) == Some(name))
            .map(|(index, _)| *index))
    }

    fn module_argument(&mut self, index: u32) -> Result<Option<String>, SessionError> {
        self.record(Call::ModuleArgument(index));
        Ok(self
            .modules
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, args)| args.clone()))
    }

    fn disconnect(&mut self) {
        self.record(Call::Disconnect);
    }
}

/// Hands out a single prepared [`MockServer`], or refuses to connect.
pub struct MockConnector {
    server: RefCell<Option<MockServer>>,
}

impl MockConnector {
    pub fn new(server: MockServer) -> Self {
        Self {
            server: RefCell::new(Some(server)),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            server: RefCell::new(None),
        }
    }
}

impl Connector for MockConnector {
    type Server = MockServer;

    fn connect(&self) -> Result<MockServer, SessionError> {
        self.server
            .borrow_mut()
            .take()
            .ok_or_else(|| SessionError::Connect("Connection refused".into()))
    }
}
