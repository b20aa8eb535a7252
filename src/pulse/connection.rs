//! libpulse connection driven by a standard (blocking) mainloop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use libpulse_binding as pa;
use pa::callbacks::ListResult;
use pa::context::introspect::{ModuleInfo, ServerInfo, SinkInfo};
use pa::context::{Context, FlagSet as ContextFlagSet, State as ContextState};
use pa::mainloop::standard::{IterateResult, Mainloop};
use pa::operation::{Operation, State as OperationState};

use super::{AudioServer, Connector};
use crate::error::SessionError;

/// Readiness of a context while the connection is being established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    NotReady,
    Ready,
    Failed,
}

impl ReadyState {
    /// Feed one observed context state into the machine.
    ///
    /// `Ready` and `Failed` are terminal; later observations do not move them.
    pub fn advance(self, observed: ContextState) -> Self {
        match self {
            ReadyState::NotReady => match observed {
                ContextState::Ready => ReadyState::Ready,
                ContextState::Failed | ContextState::Terminated => ReadyState::Failed,
                _ => ReadyState::NotReady,
            },
            terminal => terminal,
        }
    }
}

/// A live connection to the audio server.
///
/// The context is declared before the mainloop so it is released first.
pub struct PulseConnection {
    context: Context,
    mainloop: Mainloop,
    connected: bool,
}

impl PulseConnection {
    /// Connect to the default local server and block until the context is
    /// ready or has failed.
    pub fn connect(client_name: &str) -> Result<Self, SessionError> {
        let mut mainloop = Mainloop::new()
            .ok_or_else(|| SessionError::Connect("Failed to create mainloop".into()))?;

        let mut context = Context::new(&mainloop, client_name)
            .ok_or_else(|| SessionError::Connect("Failed to create context".into()))?;

        context
            .connect(None, ContextFlagSet::NOFLAGS, None)
            .map_err(|e| {
                SessionError::Connect(format!("Failed to connect to PulseAudio server: {}", e))
            })?;

        let mut ready = ReadyState::NotReady;
        while ready == ReadyState::NotReady {
            match mainloop.iterate(true) {
                IterateResult::Success(_) => ready = ready.advance(context.get_state()),
                IterateResult::Quit(_) => ready = ReadyState::Failed,
                IterateResult::Err(e) => {
                    log::warn!("Mainloop iteration failed while connecting: {}", e);
                    ready = ReadyState::Failed;
                }
            }
        }

        if ready == ReadyState::Failed {
            return Err(SessionError::Connect(format!(
                "Connection to PulseAudio server failed: {}",
                context.errno()
            )));
        }

        log::info!("Connected to audio server as \"{}\"", client_name);

        Ok(Self {
            context,
            mainloop,
            connected: true,
        })
    }

    fn iterate(&mut self, what: &str) -> Result<(), SessionError> {
        match self.mainloop.iterate(true) {
            IterateResult::Success(_) => Ok(()),
            IterateResult::Quit(_) => {
                Err(SessionError::Request(format!("{}: mainloop quit", what)))
            }
            IterateResult::Err(e) => Err(SessionError::Request(format!("{}: {}", what, e))),
        }
    }

    /// Step the mainloop until `op` is no longer running.
    fn wait_for<C: ?Sized>(&mut self, op: &Operation<C>, what: &str) -> Result<(), SessionError> {
        loop {
            match op.get_state() {
                OperationState::Running => self.iterate(what)?,
                OperationState::Done => return Ok(()),
                OperationState::Cancelled => {
                    return Err(SessionError::Request(format!(
                        "{} was cancelled: {}",
                        what,
                        self.context.errno()
                    )));
                }
            }
        }
    }
}

impl AudioServer for PulseConnection {
    fn sink_exists(&mut self, name: &str) -> Result<bool, SessionError> {
        let found = Rc::new(Cell::new(false));

        let wanted = name.to_string();
        let flag = found.clone();
        let op = self.context.introspect().get_sink_info_by_name(
            name,
            move |result: ListResult<&SinkInfo>| {
                if let ListResult::Item(info) = result {
                    if info.name.as_deref() == Some(wanted.as_str()) {
                        flag.set(true);
                    }
                }
            },
        );
        self.wait_for(&op, "get_sink_info_by_name")?;

        Ok(found.get())
    }

    fn default_sink(&mut self) -> Result<Option<String>, SessionError> {
        let default = Rc::new(RefCell::new(None));

        let slot = default.clone();
        let op = self
            .context
            .introspect()
            .get_server_info(move |info: &ServerInfo| {
                if let Some(name) = &info.default_sink_name {
                    *slot.borrow_mut() = Some(name.to_string());
                }
            });
        self.wait_for(&op, "get_server_info")?;

        Ok(default.take())
    }

    fn load_module(&mut self, module: &str, args: &str) -> Result<u32, SessionError> {
        let index = Rc::new(Cell::new(pa::def::INVALID_INDEX));

        let slot = index.clone();
        let op = self
            .context
            .introspect()
            .load_module(module, args, move |idx: u32| slot.set(idx));
        self.wait_for(&op, "load_module")?;

        match index.get() {
            pa::def::INVALID_INDEX => Err(SessionError::ModuleLoad {
                module: module.to_string(),
                reason: format!("{}", self.context.errno()),
            }),
            idx => Ok(idx),
        }
    }

    fn unload_module(&mut self, index: u32) -> Result<(), SessionError> {
        let ok = Rc::new(Cell::new(false));

        let flag = ok.clone();
        let op = self
            .context
            .introspect()
            .unload_module(index, move |success: bool| flag.set(success));
        self.wait_for(&op, "unload_module")?;

        if ok.get() {
            Ok(())
        } else {
            Err(SessionError::Request(format!(
                "unload_module #{}: {}",
                index,
                self.context.errno()
            )))
        }
    }

    fn sink_owner_module(&mut self, name: &str) -> Result<Option<u32>, SessionError> {
        let owner = Rc::new(Cell::new(None));

        let wanted = name.to_string();
        let slot = owner.clone();
        let op = self.context.introspect().get_sink_info_by_name(
            name,
            move |result: ListResult<&SinkInfo>| {
                if let ListResult::Item(info) = result {
                    if info.name.as_deref() == Some(wanted.as_str()) {
                        slot.set(info.owner_module);
                    }
                }
            },
        );
        self.wait_for(&op, "get_sink_info_by_name")?;

        Ok(owner.get())
    }

    fn module_argument(&mut self, index: u32) -> Result<Option<String>, SessionError> {
        let argument = Rc::new(RefCell::new(None));

        let slot = argument.clone();
        let op = self.context.introspect().get_module_info(
            index,
            move |result: ListResult<&ModuleInfo>| {
                if let ListResult::Item(info) = result {
                    *slot.borrow_mut() = info.argument.as_deref().map(str::to_string);
                }
            },
        );
        self.wait_for(&op, "get_module_info")?;

        Ok(argument.take())
    }

    fn disconnect(&mut self) {
        if self.connected {
            self.context.disconnect();
            self.connected = false;
            log::info!("Disconnected from audio server");
        }
    }
}

impl Drop for PulseConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Opens [`PulseConnection`]s under a fixed client name.
pub struct PulseConnector {
    client_name: String,
}

impl PulseConnector {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }
}

impl Connector for PulseConnector {
    type Server = PulseConnection;

    fn connect(&self) -> Result<PulseConnection, SessionError> {
        PulseConnection::connect(&self.client_name)
    }
}
