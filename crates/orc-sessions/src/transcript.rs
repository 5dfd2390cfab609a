//! Append-only JSONL transcripts — the default `ChatHistorySink`
//! implementation (spec §4.5, §6 external interfaces).
//!
//! Each session gets a `<sessionId>.jsonl` file under the sessions
//! directory. Every completed turn is appended as one JSON line.

use std::path::{Path, PathBuf};

use orc_domain::error::{Error, Result};

use crate::types::Turn;

/// Writes append-only JSONL transcript files, one per session.
pub struct TranscriptWriter {
    base_dir: PathBuf,
}

impl TranscriptWriter {
    pub fn new(base_dir: &Path) -> Self {
        Self { base_dir: base_dir.to_path_buf() }
    }

    /// Append one or more turns to a session's transcript.
    pub fn append(&self, session_id: &str, turns: &[Turn]) -> Result<()> {
        if turns.is_empty() {
            return Ok(());
        }

        if !self.base_dir.exists() {
            std::fs::create_dir_all(&self.base_dir).map_err(Error::Io)?;
        }

        let path = self.base_dir.join(format!("{session_id}.jsonl"));
        let mut buf = String::new();
        for turn in turns {
            let json = serde_json::to_string(turn)
                .map_err(|e| Error::Internal(format!("serializing transcript turn: {e}")))?;
            buf.push_str(&json);
            buf.push('\n');
        }

        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(Error::Io)?;
        file.write_all(buf.as_bytes()).map_err(Error::Io)?;

        Ok(())
    }

    /// Drop a session's on-disk transcript (spec §4.5 reset: the runner and
    /// its id survive, its history doesn't). Missing file is not an error.
    pub fn truncate(&self, session_id: &str) -> Result<()> {
        let path = self.base_dir.join(format!("{session_id}.jsonl"));
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Read back a transcript (history replay / debugging).
    pub fn read(&self, session_id: &str) -> Result<Vec<Turn>> {
        let path = self.base_dir.join(format!("{session_id}.jsonl"));
        if !path.exists() {
            return Ok(Vec::new());
        }

        let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
        let mut turns = Vec::new();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Turn>(line) {
                Ok(turn) => turns.push(turn),
                Err(e) => {
                    tracing::warn!(session_id, error = %e, "skipping malformed transcript line");
                }
            }
        }
        Ok(turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use chrono::Utc;

    fn turn(id: u64, content: &str) -> Turn {
        Turn { id, role: Role::User, content: content.to_string(), agent_name: None, timestamp: Utc::now() }
    }

    #[test]
    fn append_then_read_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(tmp.path());
        writer.append("s1", &[turn(0, "hi"), turn(1, "there")]).unwrap();
        let turns = writer.read("s1").unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "hi");
    }

    #[test]
    fn read_missing_transcript_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(tmp.path());
        assert!(writer.read("nope").unwrap().is_empty());
    }

    #[test]
    fn truncate_removes_transcript_file() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(tmp.path());
        writer.append("s1", &[turn(0, "hi")]).unwrap();
        writer.truncate("s1").unwrap();
        assert!(writer.read("s1").unwrap().is_empty());
    }

    #[test]
    fn truncate_missing_transcript_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(tmp.path());
        assert!(writer.truncate("nope").is_ok());
    }

    #[test]
    fn skips_malformed_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(tmp.path());
        writer.append("s1", &[turn(0, "hi")]).unwrap();
        use std::io::Write;
        let path = tmp.path().join("s1.jsonl");
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"not json\n").unwrap();
        let turns = writer.read("s1").unwrap();
        assert_eq!(turns.len(), 1);
    }
}
