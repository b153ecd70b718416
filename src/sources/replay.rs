//! Datagram log recording and replay.
//!
//! A datagram log is a flat file of received datagrams, each stored as a
//! one-byte channel tag, a big-endian u16 payload length, and the payload
//! bytes. [`DatagramLogWriter`] records a live session;
//! [`LogReplaySource`] plays one back through the same driver path the
//! live source feeds, paced at a fixed interval.
//!
//! Replay preserves exactly what the wire carried: malformed datagrams
//! are recorded and replayed too, and are dropped by the driver the same
//! way they were dropped live.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use byteorder::{BigEndian, ByteOrder};
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::source::{Datagram, DatagramSource, TelemetryChannel};
use crate::{LinkError, Result};

/// Default replay pacing between datagrams.
const DEFAULT_PACING: Duration = Duration::from_millis(20);

/// Appends received datagrams to a log file.
pub struct DatagramLogWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    records: u64,
}

impl DatagramLogWriter {
    /// Create (or truncate) a log file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| LinkError::log_error(path.clone(), e))?;
        Ok(Self { writer: BufWriter::new(file), path, records: 0 })
    }

    /// Append one datagram.
    ///
    /// Payloads longer than a u16 length field cannot occur on this link
    /// (UDP datagrams under the MTU) and are rejected rather than split.
    pub fn record(&mut self, channel: TelemetryChannel, payload: &[u8]) -> Result<()> {
        if payload.len() > u16::MAX as usize {
            return Err(LinkError::decode_error(
                "datagram log",
                format!("payload of {} bytes exceeds the length field", payload.len()),
            ));
        }

        let mut prefix = [0u8; 3];
        prefix[0] = channel.to_tag();
        BigEndian::write_u16(&mut prefix[1..3], payload.len() as u16);
        self.writer
            .write_all(&prefix)
            .and_then(|()| self.writer.write_all(payload))
            .map_err(|e| LinkError::log_error(self.path.clone(), e))?;
        self.records += 1;
        Ok(())
    }

    /// Flush buffered records and close the log.
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush().map_err(|e| LinkError::log_error(self.path.clone(), e))?;
        info!("Recorded {} datagrams to {}", self.records, self.path.display());
        Ok(())
    }
}

/// Datagram source replaying a recorded log at a fixed pace.
pub struct LogReplaySource {
    reader: BufReader<File>,
    path: PathBuf,
    pacing: Interval,
    replayed: u64,
}

impl LogReplaySource {
    /// Open a log for replay with the default pacing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_pacing(path, DEFAULT_PACING)
    }

    /// Open a log for replay with an explicit inter-datagram pacing.
    pub fn with_pacing<P: AsRef<Path>>(path: P, pacing: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| LinkError::log_error(path.clone(), e))?;
        info!("Replaying datagram log {}", path.display());

        let mut pacing = interval(pacing);
        pacing.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Ok(Self { reader: BufReader::new(file), path, pacing, replayed: 0 })
    }

    fn read_record(&mut self) -> Result<Option<Datagram>> {
        let mut tag = [0u8; 1];
        match self.reader.read_exact(&mut tag) {
            Ok(()) => {}
            // Clean end of log
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(LinkError::log_error(self.path.clone(), e)),
        }

        let channel = TelemetryChannel::from_tag(tag[0]).ok_or_else(|| {
            LinkError::decode_error("datagram log", format!("unknown channel tag {:#04x}", tag[0]))
        })?;

        let mut len = [0u8; 2];
        self.reader
            .read_exact(&mut len)
            .map_err(|e| LinkError::log_error(self.path.clone(), e))?;
        let mut payload = vec![0u8; BigEndian::read_u16(&len) as usize];
        self.reader
            .read_exact(&mut payload)
            .map_err(|e| LinkError::log_error(self.path.clone(), e))?;

        self.replayed += 1;
        Ok(Some(Datagram { channel, payload, source: None }))
    }
}

#[async_trait::async_trait]
impl DatagramSource for LogReplaySource {
    async fn next_datagram(&mut self) -> Result<Option<Datagram>> {
        self.pacing.tick().await;
        let record = self.read_record()?;
        if record.is_none() {
            debug!("Replay ended after {} datagrams", self.replayed);
        }
        Ok(record)
    }

    fn describe(&self) -> String {
        format!("replay {}", self.path.display())
    }
}
