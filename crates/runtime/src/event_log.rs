//! Append-only event log.
//!
//! Each drained [`WorldEvent`] is written as one JSON line tagged with the
//! tick it happened on, so a session can be replayed or grepped afterwards.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use combat_core::state::{Tick, WorldEvent};
use serde::Serialize;

use crate::error::Result;

#[derive(Serialize)]
struct Line<'a> {
    tick: Tick,
    event: &'a WorldEvent,
}

/// JSON-lines writer for world events.
pub struct EventLog {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl EventLog {
    /// Opens (or creates) the log at `path`, appending to what is there.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn append(&mut self, tick: Tick, events: &[WorldEvent]) -> Result<()> {
        for event in events {
            serde_json::to_writer(&mut self.writer, &Line { tick, event })?;
            self.writer.write_all(b"\n")?;
            self.written += 1;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Events written through this handle.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::state::{ActorId, Audience};

    #[test]
    fn writes_one_json_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/events.jsonl");
        let mut log = EventLog::open(&path).unwrap();
        log.append(
            7,
            &[
                WorldEvent::Message {
                    to: Audience::Actor(ActorId(1)),
                    text: "You feel much better.".into(),
                },
                WorldEvent::Departed { actor: ActorId(2) },
            ],
        )
        .unwrap();
        log.flush().unwrap();
        assert_eq!(log.written(), 2);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["tick"], 7);
        assert!(lines[1]["event"].get("Departed").is_some());
    }
}
