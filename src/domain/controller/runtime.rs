use std::io;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::domain::controller::controller::Controller;
use crate::domain::controller::events::{ControllerEvent, EventOutcome};
use crate::error::{Error, Result};

/// Messages accepted by the event loop thread.
pub enum ControllerMessage {
    Event { event: ControllerEvent, reply_to: Option<mpsc::Sender<EventOutcome>> },
    Shutdown,
}

/// Owns the thread that runs the controller, plus the periodic timers.
///
/// All events, timer ticks included, go through one channel, so the
/// controller keeps its single-writer discipline without any locking.
pub struct ControllerRuntime;

impl ControllerRuntime {
    /// Starts the event loop and the sampling/unlock timers configured in the
    /// controller's firewall settings.
    pub fn spawn(controller: Controller) -> io::Result<ControllerHandle> {
        let firewall = controller.config().firewall;
        let mut handle = Self::spawn_without_timers(controller)?;

        handle.timers.push(Timer::start("firewall-sample", firewall.sample_interval, handle.tx.clone(), || ControllerEvent::StatsSampleTick)?);
        handle.timers.push(Timer::start("firewall-unlock", firewall.unlock_interval, handle.tx.clone(), || ControllerEvent::UnlockTick)?);

        Ok(handle)
    }

    /// Starts only the event loop; ticks have to be sent by the caller.
    pub fn spawn_without_timers(controller: Controller) -> io::Result<ControllerHandle> {
        let (tx, rx) = mpsc::channel::<ControllerMessage>();

        let event_loop = thread::Builder::new().name("controller-event-loop".to_string()).spawn(move || {
            log::info!("Controller event loop started.");
            Self::run_event_loop(controller, rx)
        })?;

        Ok(ControllerHandle { tx, event_loop: Some(event_loop), timers: Vec::new() })
    }

    fn run_event_loop(mut controller: Controller, rx: mpsc::Receiver<ControllerMessage>) -> Controller {
        while let Ok(msg) = rx.recv() {
            match msg {
                ControllerMessage::Event { event, reply_to } => {
                    let outcome = controller.handle_event(event);
                    if let Some(reply) = reply_to {
                        let _ = reply.send(outcome);
                    }
                }
                ControllerMessage::Shutdown => break,
            }
        }

        log::info!("Controller event loop stopped.");
        controller
    }
}

struct Timer {
    stop: mpsc::Sender<()>,
    worker: JoinHandle<()>,
}

impl Timer {
    fn start(
        name: &str,
        interval: Duration,
        tx: mpsc::Sender<ControllerMessage>,
        tick: impl Fn() -> ControllerEvent + Send + 'static,
    ) -> io::Result<Timer> {
        let (stop, stop_rx) = mpsc::channel::<()>();

        let worker = thread::Builder::new().name(name.to_string()).spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if tx.send(ControllerMessage::Event { event: tick(), reply_to: None }).is_err() {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })?;

        Ok(Timer { stop, worker })
    }

    fn stop(self) {
        let _ = self.stop.send(());
        let _ = self.worker.join();
    }
}

/// Handle to a running controller.
pub struct ControllerHandle {
    tx: mpsc::Sender<ControllerMessage>,
    event_loop: Option<JoinHandle<Controller>>,
    timers: Vec<Timer>,
}

impl ControllerHandle {
    /// Queues an event without waiting for it to be handled.
    pub fn send(&self, event: ControllerEvent) -> Result<()> {
        self.tx.send(ControllerMessage::Event { event, reply_to: None }).map_err(|_| Error::EventLoopStopped)
    }

    /// Queues an event and blocks until the controller has handled it.
    pub fn request(&self, event: ControllerEvent) -> Result<EventOutcome> {
        let (reply_to, reply) = mpsc::channel();
        self.tx.send(ControllerMessage::Event { event, reply_to: Some(reply_to) }).map_err(|_| Error::EventLoopStopped)?;
        reply.recv().map_err(|_| Error::EventLoopStopped)
    }

    /// Stops the timers, drains the queued events and hands the controller back.
    pub fn shutdown(mut self) -> Result<Controller> {
        for timer in self.timers.drain(..) {
            timer.stop();
        }

        let _ = self.tx.send(ControllerMessage::Shutdown);
        let event_loop = self.event_loop.take().ok_or(Error::EventLoopStopped)?;
        event_loop.join().map_err(|_| Error::EventLoopStopped)
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        for timer in self.timers.drain(..) {
            timer.stop();
        }
        if let Some(event_loop) = self.event_loop.take() {
            let _ = self.tx.send(ControllerMessage::Shutdown);
            let _ = event_loop.join();
        }
    }
}
