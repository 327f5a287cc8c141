//! Check result persistence.
//!
//! The connection handler hands every decoded result, together with the
//! originating client host, to a [`CheckSink`]. The shipped sink is
//! [`CheckLog`], an append-only file of length-prefixed CBOR records;
//! [`MemorySink`] collects records in memory for tests.

use crate::error::{ServerError, ServerResult};
use checkin_protocol::CheckResult;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Upper bound on a single stored record; larger length prefixes mean a
/// corrupt log.
const MAX_RECORD_SIZE: u32 = 1024 * 1024;

/// Receives one check result at a time from connection handlers.
///
/// Calls are synchronous; implementations must be safe to share across
/// connection tasks.
pub trait CheckSink: Send + Sync {
    /// Accepts one result reported by `client`.
    fn record(&self, client: &str, result: &CheckResult) -> ServerResult<()>;
}

/// A persisted check result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCheck {
    /// Host the result arrived from.
    pub client: String,
    /// Status code of the check.
    pub status: i32,
    /// Captured output of the check.
    pub output: String,
    /// Arrival time, Unix millis.
    pub received_at_millis: u64,
}

impl StoredCheck {
    fn new(client: &str, result: &CheckResult) -> Self {
        let received_at_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            client: client.to_string(),
            status: result.status,
            output: result.output.clone(),
            received_at_millis,
        }
    }
}

/// Append-only check result log.
///
/// Each record is a big-endian `u32` length followed by that many bytes of
/// CBOR. Writes are flushed per record so a crash loses at most the record
/// being written.
pub struct CheckLog {
    writer: Mutex<BufWriter<File>>,
}

impl CheckLog {
    /// Opens a log at `path`, creating it if needed. Existing records are
    /// kept; new records are appended.
    pub fn open(path: &Path) -> ServerResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| {
                ServerError::Store(format!("error opening {}: {err}", path.display()))
            })?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Reads every record in the log at `path`.
    ///
    /// A log whose final record is cut short is reported as corrupt.
    pub fn read_all(path: &Path) -> ServerResult<Vec<StoredCheck>> {
        let file = File::open(path)
            .map_err(|err| ServerError::Store(format!("error opening {}: {err}", path.display())))?;
        let mut reader = BufReader::new(file);

        let mut records = Vec::new();
        loop {
            let mut len_bytes = [0u8; 4];
            match reader.read_exact(&mut len_bytes) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(err) => return Err(err.into()),
            }

            let len = u32::from_be_bytes(len_bytes);
            if len > MAX_RECORD_SIZE {
                return Err(ServerError::Store(format!(
                    "corrupt log: record of {len} bytes"
                )));
            }

            let mut payload = vec![0u8; len as usize];
            reader
                .read_exact(&mut payload)
                .map_err(|_| ServerError::Store("corrupt log: truncated record".into()))?;

            let record = ciborium::from_reader(payload.as_slice())
                .map_err(|err: ciborium::de::Error<std::io::Error>| {
                    ServerError::Store(format!("corrupt log: {err}"))
                })?;
            records.push(record);
        }

        Ok(records)
    }
}

impl CheckSink for CheckLog {
    fn record(&self, client: &str, result: &CheckResult) -> ServerResult<()> {
        let record = StoredCheck::new(client, result);

        let mut payload = Vec::new();
        ciborium::into_writer(&record, &mut payload)
            .map_err(|err| ServerError::Store(err.to_string()))?;

        let mut writer = self.writer.lock();
        writer.write_all(&(payload.len() as u32).to_be_bytes())?;
        writer.write_all(&payload)?;
        writer.flush()?;
        Ok(())
    }
}

/// In-memory sink for tests.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<StoredCheck>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    pub fn records(&self) -> Vec<StoredCheck> {
        self.records.lock().clone()
    }
}

impl CheckSink for MemorySink {
    fn record(&self, client: &str, result: &CheckResult) -> ServerResult<()> {
        self.records.lock().push(StoredCheck::new(client, result));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checks.log");

        let log = CheckLog::open(&path).unwrap();
        log.record("203.0.113.9", &CheckResult::new(0, "ok")).unwrap();
        log.record("203.0.113.9", &CheckResult::new(2, "load average 14.2"))
            .unwrap();

        let records = CheckLog::read_all(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].client, "203.0.113.9");
        assert_eq!(records[0].status, 0);
        assert_eq!(records[0].output, "ok");
        assert_eq!(records[1].status, 2);
        assert!(records[1].received_at_millis >= records[0].received_at_millis);
    }

    #[test]
    fn reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checks.log");

        {
            let log = CheckLog::open(&path).unwrap();
            log.record("a", &CheckResult::new(0, "first")).unwrap();
        }
        {
            let log = CheckLog::open(&path).unwrap();
            log.record("b", &CheckResult::new(1, "second")).unwrap();
        }

        let records = CheckLog::read_all(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].output, "first");
        assert_eq!(records[1].output, "second");
    }

    #[test]
    fn empty_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checks.log");
        let _log = CheckLog::open(&path).unwrap();

        assert!(CheckLog::read_all(&path).unwrap().is_empty());
    }

    #[test]
    fn truncated_record_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checks.log");

        let log = CheckLog::open(&path).unwrap();
        log.record("a", &CheckResult::new(0, "ok")).unwrap();
        drop(log);

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        assert!(matches!(
            CheckLog::read_all(&path),
            Err(ServerError::Store(_))
        ));
    }

    #[test]
    fn oversized_length_prefix_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checks.log");
        std::fs::write(&path, u32::MAX.to_be_bytes()).unwrap();

        assert!(matches!(
            CheckLog::read_all(&path),
            Err(ServerError::Store(_))
        ));
    }

    #[test]
    fn memory_sink_collects() {
        let sink = MemorySink::new();
        sink.record("203.0.113.9", &CheckResult::new(1, "warn")).unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].client, "203.0.113.9");
        assert_eq!(records[0].status, 1);
    }
}
