//! The pump link worker.
//!
//! A dedicated thread owns the serial port and the valve state. Every tick
//! it writes the current state as a single byte, whether or not the state
//! changed, so the firmware can tell the console is still alive. Control
//! messages from the front end are queued on a channel and handled between
//! ticks, so several transitions between two ticks end up as one frame.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use libra_format::{Transition, ValveState, FRAME_SIZE};
use log::{debug, error, warn};

use crate::error::LinkError;
use crate::serial::{LineSettings, Link, Platform};
use crate::store::FrameSink;

/// Messages the front end sends to the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Open(String),
    Refresh,
    UpdateState(Transition),
    UpdateStateRaw(u8),
    SetDebug(bool),
    Stop,
}

/// Messages the worker publishes back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Available(Vec<String>),
}

pub struct LinkConfig {
    pub period: Duration,
    pub settings: LineSettings,
    pub debug: bool,
    pub frame_log: Option<Box<dyn FrameSink>>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            period: crate::consts::TICK_PERIOD,
            settings: LineSettings::default(),
            debug: false,
            frame_log: None,
        }
    }
}

/// Handle to a running pump link. Every operation is fire-and-forget.
/// Dropping the handle stops the worker and closes the port.
pub struct PumpLink {
    tx: Sender<Control>,
    worker: Option<JoinHandle<()>>,
}

impl PumpLink {
    pub fn spawn<P: Platform>(
        platform: P,
        events: Sender<LinkEvent>,
        config: LinkConfig,
    ) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let worker = Worker {
            platform,
            settings: config.settings,
            period: config.period,
            port: None,
            state: ValveState::new(),
            last_state: ValveState::new(),
            debug: config.debug,
            events,
            frame_log: config.frame_log,
        };

        let handle = thread::Builder::new()
            .name("pump-link".into())
            .spawn(move || worker.run(rx))?;

        Ok(Self {
            tx,
            worker: Some(handle),
        })
    }

    pub fn open(&self, port_name: impl Into<String>) {
        self.send(Control::Open(port_name.into()));
    }

    pub fn refresh(&self) {
        self.send(Control::Refresh);
    }

    pub fn update_state(&self, transition: Transition) {
        self.send(Control::UpdateState(transition));
    }

    /// Like [`update_state`](Self::update_state), for callers that only
    /// hold a numeric transition code.
    pub fn update_state_raw(&self, code: u8) {
        self.send(Control::UpdateStateRaw(code));
    }

    pub fn set_debug(&self, enabled: bool) {
        self.send(Control::SetDebug(enabled));
    }

    /// Stop the worker and wait for it to release the port
    pub fn stop(self) {
        drop(self)
    }

    fn send(&self, msg: Control) {
        if self.tx.send(msg).is_err() {
            warn!("Pump link is not running, dropping command");
        }
    }
}

impl Drop for PumpLink {
    fn drop(&mut self) {
        let _ = self.tx.send(Control::Stop);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("Pump link worker panicked");
            }
        }
    }
}

struct Worker<P> {
    platform: P,
    settings: LineSettings,
    period: Duration,
    port: Option<Box<dyn Link>>,
    state: ValveState,
    // only used for debug output
    last_state: ValveState,
    debug: bool,
    events: Sender<LinkEvent>,
    frame_log: Option<Box<dyn FrameSink>>,
}

/// Whether the worker keeps going after a message
enum Flow {
    Continue,
    Exit,
}

impl<P: Platform> Worker<P> {
    fn run(mut self, rx: Receiver<Control>) {
        if self.debug {
            debug!("Initialized pump link");
        }

        let mut next_tick = Instant::now();
        'ticks: loop {
            loop {
                let flow = match rx.try_recv() {
                    Ok(msg) => self.handle(msg),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => Flow::Exit,
                };
                if let Flow::Exit = flow {
                    break 'ticks;
                }
            }

            self.tick();

            next_tick += self.period;
            loop {
                let now = Instant::now();
                if now >= next_tick {
                    // Fell behind, e.g. a slow open. Don't burst to catch up.
                    next_tick = now;
                    break;
                }
                let flow = match rx.recv_timeout(next_tick - now) {
                    Ok(msg) => self.handle(msg),
                    Err(RecvTimeoutError::Timeout) => break,
                    Err(RecvTimeoutError::Disconnected) => Flow::Exit,
                };
                if let Flow::Exit = flow {
                    break 'ticks;
                }
            }
        }

        if self.debug {
            debug!("Pump link stopping");
        }
    }

    fn handle(&mut self, msg: Control) -> Flow {
        match msg {
            Control::Open(name) => self.open(&name),
            Control::Refresh => self.refresh(),
            Control::UpdateState(t) => self.update_state(t),
            Control::UpdateStateRaw(code) => match Transition::try_from(code) {
                Ok(t) => self.update_state(t),
                Err(e) => error!("{}", LinkError::from(e)),
            },
            Control::SetDebug(enabled) => self.debug = enabled,
            Control::Stop => return Flow::Exit,
        }
        Flow::Continue
    }

    fn tick(&mut self) {
        let port = match self.port.as_mut() {
            Some(port) => port,
            None => return,
        };

        let frame = self.state.to_frame();
        let result = match port.write(&frame) {
            Ok(n) if n == FRAME_SIZE => Ok(()),
            Ok(n) => Err(LinkError::PartialWrite {
                port: port.name().to_owned(),
                written: n,
                expected: FRAME_SIZE,
                reason: "short write".to_owned(),
            }),
            Err(e) => Err(LinkError::PartialWrite {
                port: port.name().to_owned(),
                written: 0,
                expected: FRAME_SIZE,
                reason: e.to_string(),
            }),
        };
        if let Err(e) = &result {
            error!("{}", e);
        }

        if self.debug && self.last_state != self.state {
            debug!("Sending: {}", self.state);
        }
        self.last_state = self.state;

        if let Some(sink) = self.frame_log.as_mut() {
            if let Err(e) = sink.record(port.name(), self.state, result.is_ok()) {
                warn!("Frame log disabled after write error: {}", e);
                self.frame_log = None;
            }
        }
    }

    fn open(&mut self, name: &str) {
        self.close();

        match self.platform.open(name, &self.settings) {
            Ok(port) => {
                if self.debug {
                    debug!("Opened {} at {} baud", name, self.settings.baud_rate);
                }
                self.port = Some(port);
            }
            Err(source) => {
                let e = LinkError::OpenFailed {
                    port: name.to_owned(),
                    source,
                };
                error!("{}", e);
            }
        }
    }

    fn close(&mut self) {
        if let Some(port) = self.port.take() {
            if self.debug {
                debug!("Closing {}", port.name());
            }
        }
    }

    fn refresh(&mut self) {
        if self.debug {
            debug!("Refreshing available serial ports...");
        }

        let ports = match self.platform.available_ports() {
            Ok(ports) => ports,
            Err(e) => {
                // Counts as an empty list: nothing is published
                warn!("{}", LinkError::Enumerate(e));
                return;
            }
        };

        if self.debug {
            for p in &ports {
                debug!(
                    "Found serial port with following metadata\n  Port: {}\n  Location: {}\n  Description: {}\n  Manufacturer: {}\n  Serial number: {}",
                    p.name,
                    p.location.as_deref().unwrap_or(""),
                    p.description.as_deref().unwrap_or(""),
                    p.manufacturer.as_deref().unwrap_or(""),
                    p.serial_number.as_deref().unwrap_or(""),
                );
            }
        }

        if ports.is_empty() {
            warn!("{}", LinkError::NoPorts);
            return;
        }

        let names = ports.into_iter().map(|p| p.name).collect();
        // Nobody listening is fine
        let _ = self.events.send(LinkEvent::Available(names));
    }

    fn update_state(&mut self, transition: Transition) {
        self.state.apply(transition);
    }
}

impl<P> Drop for Worker<P> {
    fn drop(&mut self) {
        // Release the port on every exit path, unwinding included
        if let Some(port) = self.port.take() {
            if self.debug {
                debug!("Released {}", port.name());
            }
        }
    }
}
