//! Background refresh loop.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::collector::Collector;
use super::registry::{Registry, Snapshot};

/// Messages from the UI to the refresh thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    RefreshNow,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Refresh,
    Stop,
}

/// Decides when the next cycle starts. Waiting happens between cycles only,
/// so a stop request never interrupts a cycle in progress.
pub trait Ticker: Send + 'static {
    fn wait(&mut self, control: &Receiver<Control>) -> Tick;
}

/// Fixed-interval ticker; control messages cut the wait short.
pub struct IntervalTicker {
    interval: Duration,
}

impl IntervalTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for IntervalTicker {
    fn wait(&mut self, control: &Receiver<Control>) -> Tick {
        match control.recv_timeout(self.interval) {
            Ok(Control::RefreshNow) | Err(RecvTimeoutError::Timeout) => Tick::Refresh,
            Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => Tick::Stop,
        }
    }
}

/// Ticker driven by an explicit channel, for deterministic tests and
/// one-shot tools.
pub struct ManualTicker {
    ticks: Receiver<()>,
}

impl ManualTicker {
    /// Each `()` sent on the returned sender starts one cycle. Dropping it
    /// stops the loop.
    pub fn new() -> (Sender<()>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { ticks: rx })
    }
}

impl Ticker for ManualTicker {
    fn wait(&mut self, control: &Receiver<Control>) -> Tick {
        loop {
            match control.try_recv() {
                Ok(Control::RefreshNow) => return Tick::Refresh,
                Ok(Control::Stop) | Err(TryRecvError::Disconnected) => return Tick::Stop,
                Err(TryRecvError::Empty) => {}
            }
            match self.ticks.recv_timeout(Duration::from_millis(10)) {
                Ok(()) => return Tick::Refresh,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Tick::Stop,
            }
        }
    }
}

/// Sent to the UI after every cycle.
#[derive(Debug, Clone)]
pub enum CycleEvent {
    Published(Arc<Snapshot>),
    Failed(String),
}

/// Handle to the refresh thread.
pub struct Scheduler {
    control: Sender<Control>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn spawn<T: Ticker>(
        registry: Arc<Registry>,
        collector: Arc<Collector>,
        ticker: T,
        events: Sender<CycleEvent>,
    ) -> io::Result<Self> {
        let (control_tx, control_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("bpfinspect-refresh".to_string())
            .spawn(move || run_loop(&registry, &collector, ticker, &control_rx, &events))?;
        Ok(Self {
            control: control_tx,
            handle: Some(handle),
        })
    }

    /// Start a cycle now instead of at the next interval.
    pub fn request_refresh(&self) {
        let _ = self.control.send(Control::RefreshNow);
    }

    /// Stop after the current cycle, if any, and wait for the thread.
    pub fn stop(mut self) {
        let _ = self.control.send(Control::Stop);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("refresh thread panicked");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // Without a join: a hung probe must not block shutdown.
        let _ = self.control.send(Control::Stop);
    }
}

fn run_loop<T: Ticker>(
    registry: &Registry,
    collector: &Collector,
    mut ticker: T,
    control: &Receiver<Control>,
    events: &Sender<CycleEvent>,
) {
    while ticker.wait(control) == Tick::Refresh {
        let event = match registry.refresh(collector) {
            Ok(snapshot) => CycleEvent::Published(snapshot),
            Err(e) => CycleEvent::Failed(e.to_string()),
        };
        if events.send(event).is_err() {
            break;
        }
    }
    log::debug!("refresh thread stopped");
}
