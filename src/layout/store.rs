//! Binary toolbar layout record and where it is kept.
//!
//! Layout of the current format, all fields little-endian 32-bit:
//!
//! ```text
//! custom buttons enabled   0 or 1
//! wrap toolbar enabled     0 or 1
//! buttons on toolbar       N
//! buttons available        M
//! N identities             command id or hash | HASHFLAG
//! M identities
//! ```
//!
//! The legacy format written by versions 1.2 to 2.0 starts directly with the
//! two counts and may end with the wrap flag. Nothing in the bytes tells the
//! two apart, so callers pick the [`LayoutFormat`] themselves.

use crate::identity::Identity;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Most buttons a toolbar can hold; also the sanity bound on decoded counts.
pub const MAX_BUTTONS: usize = 300;

const WORD: usize = 4;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("no saved toolbar layout")]
    NotFound,

    #[error("toolbar layout truncated: expected {expected} bytes, found {actual}")]
    TruncatedRecord { expected: usize, actual: usize },

    #[error("toolbar layout has invalid {field} count {value} (limit {})", MAX_BUTTONS)]
    InvalidCount { field: &'static str, value: i64 },

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LayoutError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// True for damaged or unreadable data as opposed to a first run.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            LayoutError::TruncatedRecord { .. } | LayoutError::InvalidCount { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutFormat {
    /// Versions 1.2 to 2.0: counts, identities, optional wrap flag.
    Legacy,
    /// Versions 3.0 onwards: flags, counts, identities.
    #[default]
    Current,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayoutRecord {
    pub custom_buttons_enabled: bool,
    pub wrap_enabled: bool,
    pub on_toolbar: Vec<Identity>,
    /// Everything that was available when the record was written, in the
    /// order the host enumerated it at startup.
    pub available: Vec<Identity>,
}

fn check_count(field: &'static str, value: i64) -> Result<usize, LayoutError> {
    match usize::try_from(value) {
        Ok(count) if count <= MAX_BUTTONS => Ok(count),
        _ => Err(LayoutError::InvalidCount { field, value }),
    }
}

fn put_word(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn word_at(bytes: &[u8], index: usize) -> u32 {
    let start = index * WORD;
    let mut buf = [0u8; WORD];
    buf.copy_from_slice(&bytes[start..start + WORD]);
    u32::from_le_bytes(buf)
}

fn identities(bytes: &[u8]) -> Vec<Identity> {
    bytes
        .chunks_exact(WORD)
        .map(|chunk| Identity::from_raw(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])))
        .collect()
}

/// Serialize `record` in the current format.
pub fn encode(record: &LayoutRecord) -> Result<Vec<u8>, LayoutError> {
    check_count("on-toolbar", record.on_toolbar.len() as i64)?;
    check_count("available", record.available.len() as i64)?;

    let mut out = Vec::with_capacity(WORD * (4 + record.on_toolbar.len() + record.available.len()));
    put_word(&mut out, u32::from(record.custom_buttons_enabled));
    put_word(&mut out, u32::from(record.wrap_enabled));
    put_word(&mut out, record.on_toolbar.len() as u32);
    put_word(&mut out, record.available.len() as u32);
    for identity in record.on_toolbar.iter().chain(&record.available) {
        put_word(&mut out, identity.to_raw());
    }
    Ok(out)
}

pub fn decode(bytes: &[u8]) -> Result<LayoutRecord, LayoutError> {
    decode_with(bytes, LayoutFormat::Current)
}

pub fn decode_with(bytes: &[u8], format: LayoutFormat) -> Result<LayoutRecord, LayoutError> {
    let header_words = match format {
        LayoutFormat::Legacy => 2,
        LayoutFormat::Current => 4,
    };
    let header_len = header_words * WORD;
    if bytes.len() < header_len {
        return Err(LayoutError::TruncatedRecord {
            expected: header_len,
            actual: bytes.len(),
        });
    }

    let (custom, wrap, count_at) = match format {
        LayoutFormat::Legacy => (false, false, 0),
        LayoutFormat::Current => (word_at(bytes, 0) != 0, word_at(bytes, 1) != 0, 2),
    };
    // Counts are signed on disk; a negative value must not wrap into a huge one.
    let on_toolbar = check_count("on-toolbar", i64::from(word_at(bytes, count_at) as i32))?;
    let available = check_count("available", i64::from(word_at(bytes, count_at + 1) as i32))?;

    let arrays_end = header_len + WORD * (on_toolbar + available);
    if bytes.len() < arrays_end {
        return Err(LayoutError::TruncatedRecord {
            expected: arrays_end,
            actual: bytes.len(),
        });
    }

    let split = header_len + WORD * on_toolbar;
    let mut record = LayoutRecord {
        custom_buttons_enabled: custom,
        wrap_enabled: wrap,
        on_toolbar: identities(&bytes[header_len..split]),
        available: identities(&bytes[split..arrays_end]),
    };

    if format == LayoutFormat::Legacy && bytes.len() >= arrays_end + WORD {
        record.wrap_enabled = word_at(&bytes[arrays_end..], 0) != 0;
    }
    Ok(record)
}

/// Where encoded layouts are kept between sessions.
pub trait LayoutStorage: Send {
    /// Previously persisted bytes, or [`LayoutError::NotFound`].
    fn load_bytes(&self) -> Result<Vec<u8>, LayoutError>;

    /// Replace whatever was stored before.
    fn persist_bytes(&mut self, bytes: &[u8]) -> Result<(), LayoutError>;
}

pub fn load<S: LayoutStorage + ?Sized>(
    storage: &S,
    format: LayoutFormat,
) -> Result<LayoutRecord, LayoutError> {
    let bytes = storage.load_bytes()?;
    decode_with(&bytes, format)
}

pub fn save<S: LayoutStorage + ?Sized>(
    storage: &mut S,
    record: &LayoutRecord,
) -> Result<(), LayoutError> {
    let bytes = encode(record)?;
    storage.persist_bytes(&bytes)
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

impl LayoutStorage for FileStorage {
    fn load_bytes(&self) -> Result<Vec<u8>, LayoutError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(LayoutError::NotFound),
            Err(err) => Err(LayoutError::io("reading toolbar layout", &self.path, err)),
        }
    }

    fn persist_bytes(&mut self, bytes: &[u8]) -> Result<(), LayoutError> {
        atomic_write(&self.path, bytes)
            .map_err(|err| LayoutError::io("writing toolbar layout", &self.path, err))
    }
}

/// Keeps the layout in memory, for hosts that persist it themselves.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    bytes: Option<Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes: Some(bytes) }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }
}

impl LayoutStorage for MemoryStorage {
    fn load_bytes(&self) -> Result<Vec<u8>, LayoutError> {
        self.bytes.clone().ok_or(LayoutError::NotFound)
    }

    fn persist_bytes(&mut self, bytes: &[u8]) -> Result<(), LayoutError> {
        self.bytes = Some(bytes.to_vec());
        Ok(())
    }
}
