//! JSONL file writer for engine events.
//!
//! Each [`EngineEvent`] is serialized as a single JSON line with a `type`
//! field and an RFC 3339 `timestamp`, appended to the file via a buffered
//! writer.

use chrono::{DateTime, SecondsFormat, Utc};
use council_application::ports::audit_logger::AuditLogger;
use council_domain::EngineEvent;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL audit logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlAuditLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlAuditLogger {
    /// Create a new logger appending to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create audit log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open audit log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render one event as a JSONL record.
    fn record(event: &EngineEvent) -> Option<Value> {
        let mut value = serde_json::to_value(event).ok()?;
        if let Value::Object(map) = &mut value {
            map.insert(
                "timestamp".to_string(),
                Value::String(rfc3339_millis(event.timestamp)),
            );
        }
        Some(value)
    }
}

fn rfc3339_millis(millis: u64) -> String {
    let at = i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_else(Utc::now);
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl AuditLogger for JsonlAuditLogger {
    fn log(&self, event: &EngineEvent) {
        let Some(record) = Self::record(event) else {
            return;
        };
        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // JSONL is append-only; flush each line for crash safety
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlAuditLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{EventType, Persona, Phase, SCHEMA_RETRY_EXCEEDED_CODE};

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_jsonl_logger_writes_valid_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = JsonlAuditLogger::new(&path).unwrap();

        logger.log(&EngineEvent::phase_transition(Phase::Thinking, Phase::Debate));
        logger.log(
            &EngineEvent::new(EventType::SchemaRetryExhausted)
                .with_phase(Phase::Voting)
                .with_persona(Persona::Skeptic)
                .with_code(SCHEMA_RETRY_EXCEEDED_CODE)
                .with_field("attempts", 3),
        );
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);

        assert_eq!(lines[0]["type"], "phase.transition");
        assert_eq!(lines[0]["from"], "thinking");
        assert_eq!(lines[0]["to"], "debate");
        assert!(lines[0].get("persona").is_none());

        assert_eq!(lines[1]["type"], "schema.retry_exhausted");
        assert_eq!(lines[1]["persona"], "skeptic");
        assert_eq!(lines[1]["code"], "CONSENSUS_SCHEMA_RETRY_EXCEEDED");
        assert_eq!(lines[1]["attempts"], 3);
    }

    #[test]
    fn test_timestamp_is_rfc3339_millis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = JsonlAuditLogger::new(&path).unwrap();

        let mut event = EngineEvent::new(EventType::QuorumFailSafe);
        event.timestamp = 1_700_000_000_123;
        logger.log(&event);
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines[0]["timestamp"], "2023-11-14T22:13:20.123Z");
    }

    #[test]
    fn test_appends_across_loggers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.jsonl");

        for _ in 0..2 {
            let logger = JsonlAuditLogger::new(&path).unwrap();
            logger.log(&EngineEvent::new(EventType::ContextReduced));
        }

        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn test_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = JsonlAuditLogger::new(&path).unwrap();
        assert_eq!(logger.path(), path.as_path());
    }
}
