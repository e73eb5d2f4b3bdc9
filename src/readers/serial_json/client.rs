use std::io::{self, BufRead, BufReader, Read};
use std::mem;

use thiserror::Error;

use super::config::SerialDeviceConfig;

/// Longest line kept while waiting for its terminator
const MAX_LINE_LEN: usize = 8 * 1024;

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("could not open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A live byte stream delivering newline-terminated lines
pub trait LineSource: Send {
    /// Read one complete line, without waiting longer than the source's timeout.
    ///
    /// `Ok(None)` means nothing complete arrived in time. Any error means the
    /// connection is gone.
    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>>;
}

/// Opens new connections to the device
pub trait Connector: Send {
    fn describe(&self) -> String;
    fn open(&mut self) -> Result<Box<dyn LineSource>, ConnectionError>;
}

pub struct SerialConnector {
    config: SerialDeviceConfig,
}

impl SerialConnector {
    pub fn new(config: SerialDeviceConfig) -> Self {
        SerialConnector { config }
    }
}

impl Connector for SerialConnector {
    fn describe(&self) -> String {
        format!("{} @ {} baud", self.config.port, self.config.baud_rate)
    }

    fn open(&mut self) -> Result<Box<dyn LineSource>, ConnectionError> {
        let port = serialport::new(&self.config.port, self.config.baud_rate)
            .timeout(self.config.read_timeout)
            .open()
            .map_err(|source| ConnectionError::Open {
                port: self.config.port.clone(),
                source,
            })?;
        Ok(Box::new(LineReader::new(port)))
    }
}

/// Line framing over any reader whose reads time out rather than block forever
pub struct LineReader<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
    // Inside an over-long line; bytes are dropped up to its terminator
    discarding: bool,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        LineReader {
            reader: BufReader::new(inner),
            pending: Vec::new(),
            discarding: false,
        }
    }
}

impl<R: Read + Send> LineSource for LineReader<R> {
    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        // Bytes read before a timeout stay in `pending` and are completed later.
        // `pending` never holds more than one byte past the limit.
        let budget = (MAX_LINE_LEN + 1).saturating_sub(self.pending.len()) as u64;
        let read = match (&mut self.reader).take(budget).read_until(b'\n', &mut self.pending) {
            Ok(n) => n,
            Err(e) if is_timeout(&e) => return Ok(None),
            Err(e) => return Err(e),
        };

        if read == 0 && self.pending.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "device closed the stream",
            ));
        }

        let terminated = self.pending.last() == Some(&b'\n');
        if self.discarding {
            self.discarding = !terminated;
            self.pending.clear();
            return Ok(None);
        }
        if !terminated && self.pending.len() > MAX_LINE_LEN {
            log::warn!(
                "Discarding line longer than {} bytes received without a terminator",
                MAX_LINE_LEN
            );
            self.pending.clear();
            self.discarding = true;
            return Ok(None);
        }

        // Either a full line, or the final unterminated one before end of stream
        Ok(Some(mem::take(&mut self.pending)))
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
