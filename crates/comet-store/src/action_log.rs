//! JSON-lines action log: one [`LogEntry`] per line, append only.

use crate::error::Result;
use comet::v1::LogEntry;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

const TAIL_BLOCK: u64 = 8 * 1024;

pub struct ActionLogFile;

impl ActionLogFile {
    /// Append one entry. The line is written with a single `write_all` so a
    /// reader never sees half an entry followed by another one.
    ///
    /// An entry for the same action as the last line (see
    /// [`LogEntry::same_action`]) is dropped, so retrying an action whose
    /// snapshot write failed does not log it twice.
    pub fn append<P: AsRef<Path>>(path: P, entry: &LogEntry) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if entry.time > 0
            && let Some(last) = Self::last_entry(path)?
            && last.same_action(entry)
        {
            tracing::debug!(
                file = %path.display(),
                action = %entry.name,
                time = entry.time,
                "action already logged"
            );
            return Ok(());
        }
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Read every entry in order. A missing log reads as empty. Blank lines
    /// are skipped; lines that do not parse are reported and skipped.
    pub fn read_entries<P: AsRef<Path>>(path: P) -> Result<Vec<LogEntry>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(path)?);
        let mut entries = Vec::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(
                        file = %path.display(),
                        line = line_num + 1,
                        error = %e,
                        "skipping unreadable action log line"
                    );
                }
            }
        }
        Ok(entries)
    }

    /// The entry on the last non-blank line, read backwards from the end of
    /// the file. `None` for a missing or empty log or an unreadable line.
    pub fn last_entry<P: AsRef<Path>>(path: P) -> Result<Option<LogEntry>> {
        let mut file = match File::open(path.as_ref()) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut pos = file.metadata()?.len();
        let mut tail: Vec<u8> = Vec::new();
        let line = loop {
            let end = tail
                .iter()
                .rposition(|b| !b.is_ascii_whitespace())
                .map(|i| i + 1)
                .unwrap_or(0);
            if end > 0
                && let Some(nl) = tail[..end].iter().rposition(|b| *b == b'\n')
            {
                break tail[nl + 1..end].to_vec();
            }
            if pos == 0 {
                break tail[..end].to_vec();
            }

            let step = pos.min(TAIL_BLOCK);
            pos -= step;
            let mut block = vec![0; step as usize];
            file.seek(SeekFrom::Start(pos))?;
            file.read_exact(&mut block)?;
            block.extend_from_slice(&tail);
            tail = block;
        };

        if line.is_empty() {
            return Ok(None);
        }
        Ok(serde_json::from_slice(&line).ok())
    }
}
