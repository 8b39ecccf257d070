use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use engine::{
    Command, Engine, EngineErrorEvent, Event, FrameScheduler, FrameTick, ThreadScheduler,
};
use tracing::debug;

/// Sender used by the UI thread to dispatch commands to the engine thread.
pub type EngineCommandSender = Sender<Command>;

/// Receiver used by the UI thread to read events emitted by the engine thread.
pub type EngineEventReceiver = Receiver<Event>;

/// Channel-backed bridge between UI state and engine worker.
#[derive(Debug)]
pub struct EngineBridge {
    command_tx: EngineCommandSender,
    event_rx: EngineEventReceiver,
    frame_rx: Option<Receiver<FrameTick>>,
}

impl EngineBridge {
    /// Creates a bridge from command sender and event receiver.
    pub fn new(command_tx: EngineCommandSender, event_rx: EngineEventReceiver) -> Self {
        Self {
            command_tx,
            event_rx,
            frame_rx: None,
        }
    }

    /// Attaches the receiving end of the engine's frame ticker.
    pub fn with_frames(mut self, frame_rx: Receiver<FrameTick>) -> Self {
        self.frame_rx = Some(frame_rx);
        self
    }

    /// Sends one command to the engine worker.
    pub fn send_command(&self, command: Command) -> Result<(), BridgeError> {
        self.command_tx
            .send(command)
            .map_err(|_| BridgeError::Disconnected)
    }

    /// Sends commands in order, stopping at the first failure.
    pub fn send_all(&self, commands: impl IntoIterator<Item = Command>) -> Result<(), BridgeError> {
        commands
            .into_iter()
            .try_for_each(|command| self.send_command(command))
    }

    /// Receives all currently queued events without blocking.
    pub fn drain_events(&self) -> Result<Vec<Event>, BridgeError> {
        let mut events = Vec::new();
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => return Ok(events),
                Err(TryRecvError::Disconnected) => return Err(BridgeError::Disconnected),
            }
        }
    }

    /// Consumes pending frame ticks; returns whether at least one arrived.
    ///
    /// Ticks that piled up between two UI refreshes collapse into one frame.
    pub fn take_frame_due(&self) -> bool {
        let Some(frame_rx) = &self.frame_rx else {
            return false;
        };
        let mut due = false;
        while frame_rx.try_recv().is_ok() {
            due = true;
        }
        due
    }
}

/// Error raised by the UI-engine bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    Disconnected,
}

/// Spawns a worker thread that owns `engine` and applies commands in order.
///
/// Failed commands are reported as [`Event::Error`]. The worker exits when
/// either side of the bridge is dropped.
pub fn spawn_engine_bridge<S>(mut engine: Engine<S>) -> (EngineCommandSender, EngineEventReceiver)
where
    S: FrameScheduler + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::channel::<Command>();
    let (event_tx, event_rx) = mpsc::channel::<Event>();

    thread::spawn(move || {
        while let Ok(command) = command_rx.recv() {
            match engine.handle_command(command) {
                Ok(events) => {
                    for event in events {
                        if event_tx.send(event).is_err() {
                            return;
                        }
                    }
                }
                Err(error) => {
                    if event_tx
                        .send(Event::Error(EngineErrorEvent::from_error(&error)))
                        .is_err()
                    {
                        return;
                    }
                }
            }
        }
        debug!("engine bridge closed");
    });

    (command_tx, event_rx)
}

/// Spawns an engine driven by a [`ThreadScheduler`] and wires its ticks back
/// to the returned bridge.
pub fn spawn_threaded_bridge(frame_interval: Duration) -> EngineBridge {
    let (frame_tx, frame_rx) = mpsc::channel();
    let engine = Engine::new(ThreadScheduler::new(frame_interval, frame_tx));
    let (command_tx, event_rx) = spawn_engine_bridge(engine);
    EngineBridge::new(command_tx, event_rx).with_frames(frame_rx)
}
