//! Polling driver
//!
//! Runs the engine and the protocol handler on one blocking thread: tick, then
//! poll, repeatedly. The monitor never touches either directly; it reads
//! published [`Snapshot`] copies and sends mode overrides over a channel that
//! the loop drains between iterations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use speedsim_core::ecu::{EngineMode, EngineStatus, RealtimeView, StatisticsView, StatusView};
use speedsim_core::engine::EngineSimulator;
use speedsim_core::platform::{RandomProvider, TimeProvider};
use speedsim_core::protocol::{ProtocolError, ProtocolHandler, SerialInterface};

/// Sleep when an iteration found nothing to do
const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Seconds of runtime between summary log lines
const SUMMARY_INTERVAL_S: u32 = 5;

/// Pending mode overrides before senders wait
const OVERRIDE_CHANNEL_CAPACITY: usize = 16;

/// Copy of everything the monitor shows, taken between loop iterations
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub status: EngineStatus,
    pub mode: EngineMode,
    pub runtime: u32,
    pub commands: u32,
    pub errors: u32,
}

impl Snapshot {
    pub fn realtime(&self) -> RealtimeView {
        RealtimeView::from(&self.status)
    }

    pub fn status_view(&self) -> StatusView {
        StatusView {
            mode: self.mode,
            runtime: self.runtime,
        }
    }

    pub fn statistics(&self) -> StatisticsView {
        StatisticsView::new(self.mode, self.runtime, self.commands, self.errors)
    }
}

/// Cloneable handle for observing and steering a running driver
#[derive(Clone)]
pub struct DriverHandle {
    snapshots: watch::Receiver<Snapshot>,
    overrides: mpsc::Sender<EngineMode>,
    stop: Arc<AtomicBool>,
}

impl DriverHandle {
    /// Latest published snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Queue a mode override. Returns `false` if the driver has exited.
    pub async fn request_mode(&self, mode: EngineMode) -> bool {
        self.overrides.send(mode).await.is_ok()
    }

    /// Ask the loop to exit after its current iteration
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

pub struct Driver<C, R, S> {
    engine: EngineSimulator<C, R>,
    protocol: ProtocolHandler<S>,
    overrides: mpsc::Receiver<EngineMode>,
    snapshots: watch::Sender<Snapshot>,
    stop: Arc<AtomicBool>,
    next_summary_s: u32,
}

impl<C, R, S> Driver<C, R, S>
where
    C: TimeProvider,
    R: RandomProvider,
    S: SerialInterface,
{
    pub fn new(
        engine: EngineSimulator<C, R>,
        protocol: ProtocolHandler<S>,
    ) -> (Self, DriverHandle) {
        let (override_tx, override_rx) = mpsc::channel(OVERRIDE_CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(capture(&engine, &protocol));
        let stop = Arc::new(AtomicBool::new(false));

        let driver = Self {
            engine,
            protocol,
            overrides: override_rx,
            snapshots: snapshot_tx,
            stop: stop.clone(),
            next_summary_s: SUMMARY_INTERVAL_S,
        };
        let handle = DriverHandle {
            snapshots: snapshot_rx,
            overrides: override_tx,
            stop,
        };
        (driver, handle)
    }

    /// Cold-start the engine and open the transport
    pub fn start(&mut self) -> Result<(), ProtocolError> {
        self.engine.initialize();
        self.protocol.begin()?;
        self.next_summary_s = SUMMARY_INTERVAL_S;
        self.publish();
        tracing::info!(mode = %self.engine.mode(), "simulation started");
        Ok(())
    }

    /// One loop iteration. Returns whether anything happened.
    pub fn run_once(&mut self) -> Result<bool, ProtocolError> {
        let mut changed = false;
        while let Ok(mode) = self.overrides.try_recv() {
            tracing::info!(from = %self.engine.mode(), to = %mode, "mode override");
            self.engine.set_mode(mode);
            changed = true;
        }

        let ticked = self.engine.tick();
        let outcome = self.protocol.poll(self.engine.status())?;

        if ticked {
            self.log_summary();
        }

        let busy = ticked || outcome.is_processed();
        if busy || changed {
            self.publish();
        }
        Ok(busy)
    }

    /// Start, then loop until [`DriverHandle::stop`] is called or the transport fails
    pub fn run(mut self) -> Result<(), ProtocolError> {
        self.start()?;

        while !self.stop.load(Ordering::Relaxed) {
            if !self.run_once()? {
                std::thread::sleep(IDLE_SLEEP);
            }
        }

        tracing::info!(
            commands = self.protocol.command_count(),
            errors = self.protocol.error_count(),
            "simulation stopped"
        );
        Ok(())
    }

    fn publish(&self) {
        self.snapshots.send_replace(capture(&self.engine, &self.protocol));
    }

    fn log_summary(&mut self) {
        let runtime = self.engine.runtime_seconds();
        if runtime < self.next_summary_s {
            return;
        }
        self.next_summary_s = runtime + SUMMARY_INTERVAL_S;

        let status = self.engine.status();
        tracing::info!(
            mode = %self.engine.mode().label(),
            rpm = status.rpm(),
            clt = status.coolant_temp(),
            map = status.map(),
            commands = self.protocol.command_count(),
            "engine"
        );
    }

    #[cfg(test)]
    fn protocol_mut(&mut self) -> &mut ProtocolHandler<S> {
        &mut self.protocol
    }
}

fn capture<C, R, S>(engine: &EngineSimulator<C, R>, protocol: &ProtocolHandler<S>) -> Snapshot
where
    C: TimeProvider,
    R: RandomProvider,
    S: SerialInterface,
{
    Snapshot {
        status: engine.status().clone(),
        mode: engine.mode(),
        runtime: engine.runtime_seconds(),
        commands: protocol.command_count(),
        errors: protocol.error_count(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use speedsim_core::platform::{ManualClock, SeededRandom};
    use speedsim_core::protocol::MemoryChannel;

    pub type TestDriver = Driver<ManualClock, SeededRandom, MemoryChannel>;

    /// Started driver on a manual clock and an in-memory transport
    pub fn driver() -> (ManualClock, TestDriver, DriverHandle) {
        let clock = ManualClock::new(0);
        let engine = EngineSimulator::new(clock.clone(), SeededRandom::new(1));
        let protocol = ProtocolHandler::new(MemoryChannel::new());
        let (mut driver, handle) = Driver::new(engine, protocol);
        driver.start().unwrap();
        (clock, driver, handle)
    }

    pub fn push_input(driver: &mut TestDriver, bytes: &[u8]) {
        driver.protocol_mut().channel_mut().push_input(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use speedsim_core::engine::constants::UPDATE_INTERVAL_MS;

    #[test]
    fn test_start_publishes_cold_engine() {
        let (_, _driver, handle) = driver();
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.mode, EngineMode::Startup);
        assert_eq!(snapshot.status.response, b'A');
        assert_eq!(snapshot.commands, 0);
    }

    #[test]
    fn test_idle_iteration_reports_no_work() {
        let (_, mut driver, _) = driver();
        assert!(!driver.run_once().unwrap());
    }

    #[test]
    fn test_tick_publishes_snapshot() {
        let (clock, mut driver, handle) = driver();
        clock.advance(UPDATE_INTERVAL_MS);
        assert!(driver.run_once().unwrap());
        assert!(handle.snapshot().status.rpm() > 0);
    }

    #[test]
    fn test_commands_are_counted_in_snapshot() {
        let (_, mut driver, handle) = driver();
        push_input(&mut driver, b"AZ");
        assert!(driver.run_once().unwrap());
        assert!(driver.run_once().unwrap());

        let stats = handle.snapshot().statistics();
        assert_eq!(stats.commands, 2);
        assert_eq!(stats.errors, 1);
    }

    #[tokio::test]
    async fn test_override_applied_on_next_iteration() {
        let (_, mut driver, handle) = driver();
        assert!(handle.request_mode(EngineMode::WideOpenThrottle).await);
        assert_eq!(handle.snapshot().mode, EngineMode::Startup);

        driver.run_once().unwrap();
        assert_eq!(handle.snapshot().mode, EngineMode::WideOpenThrottle);
    }

    #[test]
    fn test_run_exits_when_stopped() {
        let (_, driver, handle) = driver();
        handle.stop();
        assert!(driver.run().is_ok());
    }

    #[tokio::test]
    async fn test_override_fails_after_driver_exits() {
        let (_, driver, handle) = driver();
        drop(driver);
        assert!(!handle.request_mode(EngineMode::Idle).await);
    }
}
