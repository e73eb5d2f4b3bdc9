//! Serial ingestion of newline-delimited JSON sensor readings
//!
//! The loop is a two-level state machine. The outer level owns the connection:
//! open it, or wait out a fixed backoff and try again, forever. The inner level
//! reads one line at a time from a live connection; a bad line costs only that
//! line, while an I/O error drops back to the outer level.

pub mod client;
pub mod config;

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use chrono::Utc;
use flume::{Receiver, RecvTimeoutError, Sender};

use crate::data_mgmt::{
    parse::{parse_line, ParseError},
    process::{accept, project, ValidationFailure},
    ConfigStore, ReadingStore, SensorReading, StoreError,
};

pub use client::{ConnectionError, Connector, LineReader, LineSource, SerialConnector};
pub use config::{LoopTiming, SerialDeviceConfig};

pub enum ConnectionState {
    Disconnected,
    Connected(Box<dyn LineSource>),
    Backoff(Duration),
}

/// What became of one line of device output
#[derive(Debug)]
pub enum LineOutcome {
    Skipped,
    Malformed(ParseError),
    Rejected(ValidationFailure),
    Stored(SensorReading),
    StoreFailed(StoreError),
}

/// Parse, filter, validate and persist one line
pub fn process_line(line: &[u8], settings: &ConfigStore, store: &dyn ReadingStore) -> LineOutcome {
    let raw = match parse_line(line) {
        Ok(Some(raw)) => raw,
        Ok(None) => return LineOutcome::Skipped,
        Err(e) => return LineOutcome::Malformed(e),
    };

    let filtered = project(&raw, &settings.get(), Utc::now());
    let reading = match accept(filtered) {
        Ok(reading) => reading,
        Err(e) => return LineOutcome::Rejected(e),
    };

    match store.insert(&reading) {
        Ok(()) => LineOutcome::Stored(reading),
        Err(e) => LineOutcome::StoreFailed(e),
    }
}

pub struct IngestionLoop<C> {
    connector: C,
    settings: Arc<ConfigStore>,
    store: Arc<dyn ReadingStore>,
    backoff: Constant,
    poll_interval: Duration,
}

impl<C: Connector> IngestionLoop<C> {
    pub fn new(
        connector: C,
        settings: Arc<ConfigStore>,
        store: Arc<dyn ReadingStore>,
        timing: LoopTiming,
    ) -> Self {
        IngestionLoop {
            connector,
            settings,
            store,
            backoff: Constant::new(timing.reconnect_delay),
            poll_interval: timing.poll_interval,
        }
    }

    /// Run until a message arrives on `shutdown` or its sender is dropped
    pub fn run(mut self, shutdown: Receiver<()>) {
        log::info!("Starting ingestion from {}", self.connector.describe());

        let mut state = ConnectionState::Disconnected;
        loop {
            state = match state {
                ConnectionState::Disconnected => self.connect(),
                ConnectionState::Backoff(delay) => {
                    if stop_requested(&shutdown, delay) {
                        break;
                    }
                    ConnectionState::Disconnected
                }
                ConnectionState::Connected(mut source) => match self.read_next(source.as_mut()) {
                    Ok(()) => {
                        if stop_requested(&shutdown, self.poll_interval) {
                            log::info!("Closing connection to {}", self.connector.describe());
                            break;
                        }
                        ConnectionState::Connected(source)
                    }
                    Err(e) => {
                        log::error!("Serial connection lost: {}", e);
                        ConnectionState::Disconnected
                    }
                },
            };
        }

        log::info!("Ingestion loop stopped");
    }

    /// Spawn the loop on its own thread
    pub fn spawn(self) -> io::Result<IngestionHandle>
    where
        C: 'static,
    {
        let (shutdown_tx, shutdown_rx) = flume::bounded(1);
        let thread = thread::Builder::new()
            .name("ingestion".into())
            .spawn(move || self.run(shutdown_rx))?;
        Ok(IngestionHandle {
            shutdown: shutdown_tx,
            thread,
        })
    }

    fn connect(&mut self) -> ConnectionState {
        match self.connector.open() {
            Ok(source) => {
                log::info!("Connected to {}", self.connector.describe());
                self.backoff.reset();
                ConnectionState::Connected(source)
            }
            Err(e) => {
                // Constant backoff never runs out; the fallback only guards the type
                let delay = self.backoff.next_backoff().unwrap_or(self.poll_interval);
                log::error!(
                    "Serial connection error: {}; retrying in {:.1}s",
                    e,
                    delay.as_secs_f32()
                );
                ConnectionState::Backoff(delay)
            }
        }
    }

    fn read_next(&self, source: &mut dyn LineSource) -> io::Result<()> {
        let Some(line) = source.read_line()? else {
            return Ok(());
        };

        match process_line(&line, &self.settings, self.store.as_ref()) {
            LineOutcome::Skipped => {}
            LineOutcome::Malformed(e) => log::warn!("Skipping unparseable line: {}", e),
            LineOutcome::Rejected(e) => log::warn!("Invalid sensor data received: {}", e),
            LineOutcome::Stored(reading) => log::debug!("Saved reading: {:?}", reading),
            LineOutcome::StoreFailed(e) => log::error!("Could not save reading: {}", e),
        }
        Ok(())
    }
}

/// Sleep for `wait`, returning early with `true` if shutdown was signalled
fn stop_requested(shutdown: &Receiver<()>, wait: Duration) -> bool {
    match shutdown.recv_timeout(wait) {
        Err(RecvTimeoutError::Timeout) => false,
        Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
    }
}

pub struct IngestionHandle {
    shutdown: Sender<()>,
    thread: JoinHandle<()>,
}

impl IngestionHandle {
    /// Signal the loop to stop and wait for it to close the device
    pub fn stop(self) {
        let _ = self.shutdown.try_send(());
        if self.thread.join().is_err() {
            log::error!("Ingestion thread panicked");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_mgmt::{MemoryReadingStore, SensorField};
    use serde_json::json;

    struct FailingStore;

    impl ReadingStore for FailingStore {
        fn insert(&self, _reading: &SensorReading) -> Result<(), StoreError> {
            Err(StoreError::Corrupt("store offline".into()))
        }

        fn latest(&self) -> Result<Option<SensorReading>, StoreError> {
            Ok(None)
        }
    }

    #[test]
    fn valid_line_is_stored() {
        let settings = ConfigStore::in_memory();
        let store = MemoryReadingStore::new();
        let outcome = process_line(br#"{"temperature": 22.5, "movement": "detected"}"#, &settings, &store);
        assert!(matches!(outcome, LineOutcome::Stored(_)));
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn fields_left_out_of_settings_are_not_persisted() {
        let settings = ConfigStore::in_memory();
        settings.replace(&json!({"humidity": true, "sound": true})).unwrap();
        let store = MemoryReadingStore::new();

        process_line(br#"{"temperature": 22.5, "humidity": 40, "sound": 900}"#, &settings, &store);

        let stored = store.latest().unwrap().unwrap();
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["humidity"], json!(40.0));
        assert_eq!(value["sound"], json!(900));
        assert!(value.get("temperature").is_none());
        assert!(value.get("timestamp").is_some());
        assert_eq!(stored.fields.len(), 2);
        assert!(!stored.fields.contains_key(&SensorField::Temperature));
    }

    #[test]
    fn out_of_range_reading_is_discarded_whole() {
        let settings = ConfigStore::in_memory();
        let store = MemoryReadingStore::new();
        let outcome = process_line(br#"{"temperature": 85, "humidity": 50}"#, &settings, &store);
        assert!(matches!(outcome, LineOutcome::Rejected(_)));
        assert!(store.all().is_empty());
    }

    #[test]
    fn malformed_and_blank_lines() {
        let settings = ConfigStore::in_memory();
        let store = MemoryReadingStore::new();
        assert!(matches!(
            process_line(b"{not json", &settings, &store),
            LineOutcome::Malformed(_)
        ));
        assert!(matches!(process_line(b"\r\n", &settings, &store), LineOutcome::Skipped));
        assert!(store.all().is_empty());
    }

    #[test]
    fn store_failure_is_reported_not_raised() {
        let settings = ConfigStore::in_memory();
        let outcome = process_line(br#"{"light": 10}"#, &settings, &FailingStore);
        assert!(matches!(outcome, LineOutcome::StoreFailed(_)));
    }

    #[test]
    fn dropped_sender_counts_as_shutdown() {
        let (tx, rx) = flume::bounded::<()>(1);
        assert!(!stop_requested(&rx, Duration::from_millis(1)));
        drop(tx);
        assert!(stop_requested(&rx, Duration::from_secs(60)));
    }
}
