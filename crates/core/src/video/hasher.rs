//! Content hashing of video files.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::types::ContentHashes;

/// Name under which the OpenSubtitles hash is stored in [`ContentHashes::hashes`].
pub const OPENSUBTITLES_HASH: &str = "opensubtitles";
pub const THESUBDB_HASH: &str = "thesubdb";
pub const NAPIPROJEKT_HASH: &str = "napiprojekt";

const CHUNK_SIZE: u64 = 64 * 1024;
const NAPIPROJEKT_READ_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Collaborator that computes content hashes of a video file.
pub trait ContentHasher: Send + Sync {
    fn hash(&self, path: &Path) -> Result<ContentHashes, HashError>;
}

/// Hashes files on the local filesystem.
#[derive(Debug, Default, Clone)]
pub struct FileHasher;

impl FileHasher {
    pub fn new() -> Self {
        Self
    }
}

impl ContentHasher for FileHasher {
    fn hash(&self, path: &Path) -> Result<ContentHashes, HashError> {
        let io_err = |source| HashError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(io_err)?;
        let size = file.metadata().map_err(io_err)?.len();

        let mut hashes = BTreeMap::new();
        let algorithms: [(&str, HashFn); 3] = [
            (OPENSUBTITLES_HASH, opensubtitles_hash),
            (THESUBDB_HASH, thesubdb_hash),
            (NAPIPROJEKT_HASH, napiprojekt_hash),
        ];
        for (name, algorithm) in algorithms {
            if let Some(hash) = algorithm(&mut file, size).map_err(io_err)? {
                hashes.insert(name.to_string(), hash);
            }
        }

        Ok(ContentHashes { size, hashes })
    }
}

type HashFn = fn(&mut File, u64) -> std::io::Result<Option<String>>;

/// File size plus the wrapping sum of the little-endian u64 words in the
/// first and last 64 KiB, as 16 hex digits. Files shorter than two chunks have none.
fn opensubtitles_hash<R: Read + Seek>(reader: &mut R, size: u64) -> std::io::Result<Option<String>> {
    if size < 2 * CHUNK_SIZE {
        return Ok(None);
    }

    let mut hash = size;

    let head_len = size.min(CHUNK_SIZE);
    hash = hash.wrapping_add(sum_words(reader, 0, head_len)?);

    let tail_start = size - CHUNK_SIZE;
    hash = hash.wrapping_add(sum_words(reader, tail_start, CHUNK_SIZE)?);

    Ok(Some(format!("{:016x}", hash)))
}

/// MD5 of the first and last 64 KiB. Files shorter than one chunk have none.
fn thesubdb_hash<R: Read + Seek>(reader: &mut R, size: u64) -> std::io::Result<Option<String>> {
    if size < CHUNK_SIZE {
        return Ok(None);
    }

    let mut context = md5::Context::new();
    context.consume(read_at(reader, 0, CHUNK_SIZE)?);
    context.consume(read_at(reader, size - CHUNK_SIZE, CHUNK_SIZE)?);
    Ok(Some(format!("{:x}", context.compute())))
}

/// MD5 of the first 10 MiB, or of the whole file when it is shorter.
fn napiprojekt_hash<R: Read + Seek>(reader: &mut R, size: u64) -> std::io::Result<Option<String>> {
    let data = read_at(reader, 0, size.min(NAPIPROJEKT_READ_SIZE))?;
    Ok(Some(format!("{:x}", md5::compute(data))))
}

fn read_at<R: Read + Seek>(reader: &mut R, offset: u64, len: u64) -> std::io::Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn sum_words<R: Read + Seek>(reader: &mut R, offset: u64, len: u64) -> std::io::Result<u64> {
    Ok(read_at(reader, offset, len)?
        .chunks_exact(8)
        .map(|chunk| {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            u64::from_le_bytes(word)
        })
        .fold(0u64, |acc, w| acc.wrapping_add(w)))
}
