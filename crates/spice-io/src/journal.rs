//! # Journal: Append-Only Review Storage
//!
//! Reviews are never updated or deleted, so their store is a single file
//! that only grows. Each review is archived with `rkyv` and framed by
//! [`encode_frame`]. Appends are synced to disk before they are
//! acknowledged.
//!
//! On open the file is memory-mapped read-only and replayed with a
//! [`FrameCursor`]. A torn tail left by an interrupted append is cut off so
//! the next append starts on a frame boundary.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use spice_core::ReviewRecord;

use crate::cursor::{encode_frame, FrameCursor};
use crate::error::{Error, Result};

/// Outcome of replaying a journal on open.
#[derive(Debug, Default)]
pub struct Replay {
    /// Every intact record, in append order.
    pub records: Vec<ReviewRecord>,
    /// Bytes cut from a torn tail (0 for a clean journal).
    pub truncated_bytes: u64,
}

/// The open review journal.
pub struct ReviewJournal {
    /// The backing file, opened for append.
    file: File,

    path: PathBuf,

    /// Current file length in bytes (always on a frame boundary).
    len: u64,

    /// Number of records in the journal.
    records: u64,
}

impl ReviewJournal {
    /// Open (or create) the journal at `path` and replay its records.
    pub fn open(path: &Path) -> Result<(Self, Replay)> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let file_len = file.metadata()?.len();
        let mut replay = Replay::default();
        let mut valid_len = file_len;

        if file_len > 0 {
            // SAFETY: the map is read-only and dropped before this function
            // writes to the file. No other process appends to the journal.
            let mmap = unsafe { Mmap::map(&file)? };
            let mut cursor = FrameCursor::new(&mmap);

            while let Some((offset, payload)) = cursor.next_frame()? {
                let record = rkyv::from_bytes::<ReviewRecord, rkyv::rancor::Error>(payload)
                    .map_err(|e| Error::Decode {
                        offset,
                        reason: e.to_string(),
                    })?;
                replay.records.push(record);
            }

            if cursor.is_torn() {
                valid_len = cursor.offset() as u64;
            }
        }

        if valid_len < file_len {
            file.set_len(valid_len)?;
            file.sync_data()?;
            replay.truncated_bytes = file_len - valid_len;
        }

        let journal = Self {
            file,
            path: path.to_path_buf(),
            len: valid_len,
            records: replay.records.len() as u64,
        };
        Ok((journal, replay))
    }

    /// Append one record. Returns the byte offset of its frame.
    pub fn append(&mut self, record: &ReviewRecord) -> Result<u64> {
        let payload = rkyv::to_bytes::<rkyv::rancor::Error>(record)
            .map_err(|e| Error::Encode(e.to_string()))?;
        let frame = encode_frame(&payload);

        let offset = self.len;
        self.file.write_all(&frame)?;
        self.file.sync_data()?;

        self.len += frame.len() as u64;
        self.records += 1;
        Ok(offset)
    }

    /// Returns the journal size in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Returns the number of records appended so far.
    #[inline]
    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Confirm the backing file is still reachable.
    pub fn probe(&self) -> Result<()> {
        std::fs::metadata(&self.path)?;
        Ok(())
    }
}
