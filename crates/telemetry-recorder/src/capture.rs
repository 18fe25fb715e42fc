//! Packet-capture writer/reader (SPEC_FULL.md §4.10): an ordered log of
//! `{timestamp-µs, length, bytes}` records. The writer appends as raw
//! datagrams arrive at the Ingress Listener; the reader feeds them back
//! through the same decode path at their original inter-packet spacing,
//! used by `--replay-server` and by the test suite to replay fixture
//! sessions deterministically.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use pitwall_telemetry_core::RawDatagramSource;

/// One recorded datagram: arrival timestamp (microseconds since the
/// capture started) plus the raw bytes.
#[derive(Debug, Clone)]
pub struct CaptureRecord {
    pub timestamp_us: u64,
    pub bytes: Vec<u8>,
}

/// Appends `{timestamp-µs, length, bytes}` records to a file as raw
/// datagrams arrive. Gated by `--packet-capture-mode` at the call site;
/// this type has no opinion on the mode, only on the file format.
pub struct CaptureWriter {
    file: BufWriter<File>,
    started_at: Instant,
}

impl CaptureWriter {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            file: BufWriter::new(file),
            started_at: Instant::now(),
        })
    }

    /// Appends one datagram, timestamped relative to when the writer was
    /// created.
    pub fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        let timestamp_us = self.started_at.elapsed().as_micros() as u64;
        self.file.write_all(&timestamp_us.to_le_bytes())?;
        self.file.write_all(&(bytes.len() as u32).to_le_bytes())?;
        self.file.write_all(bytes)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Feeds a previously captured file back through the same decode path.
/// Implements [`RawDatagramSource`] so the Ingress Listener can replay a
/// capture with no code path different from a live socket.
pub struct CaptureReader {
    records: std::vec::IntoIter<CaptureRecord>,
    last_timestamp_us: Option<u64>,
    paced: bool,
}

impl CaptureReader {
    /// `paced = true` sleeps between records to reproduce the original
    /// inter-packet spacing (`--replay-server`); `paced = false` replays as
    /// fast as the consumer drains the queue (test fixtures).
    pub fn open(path: &Path, paced: bool) -> io::Result<Self> {
        let records = read_all(path)?;
        Ok(Self {
            records: records.into_iter(),
            last_timestamp_us: None,
            paced,
        })
    }
}

#[async_trait]
impl RawDatagramSource for CaptureReader {
    async fn recv(&mut self) -> io::Result<Vec<u8>> {
        let record = self.records.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "capture file exhausted")
        })?;
        if self.paced {
            if let Some(last) = self.last_timestamp_us {
                let delta = record.timestamp_us.saturating_sub(last);
                if delta > 0 {
                    tokio::time::sleep(Duration::from_micros(delta)).await;
                }
            }
        }
        self.last_timestamp_us = Some(record.timestamp_us);
        Ok(record.bytes)
    }
}

fn read_all(path: &Path) -> io::Result<Vec<CaptureRecord>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    loop {
        let mut ts_buf = [0u8; 8];
        match reader.read_exact(&mut ts_buf) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(error) => return Err(error),
        }
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;
        let len = u32::from_le_bytes(len_buf) as usize;
        let mut bytes = vec![0u8; len];
        reader.read_exact(&mut bytes)?;
        records.push(CaptureRecord {
            timestamp_us: u64::from_le_bytes(ts_buf),
            bytes,
        });
    }
    Ok(records)
}
