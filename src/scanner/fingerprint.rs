//! BLAKE3 content fingerprinting.
//!
//! # Overview
//!
//! A [`Fingerprint`] is the BLAKE3 digest of a file's full content together
//! with the number of bytes that were hashed. Small files are streamed
//! through a fixed buffer; files at or above [`MMAP_THRESHOLD`] are memory
//! mapped and hashed on the rayon pool.
//!
//! # Example
//!
//! ```no_run
//! use deduplicate_files::scanner::Fingerprinter;
//! use std::path::Path;
//!
//! let fingerprinter = Fingerprinter::new();
//! let fp = fingerprinter.fingerprint(Path::new("Cargo.toml")).unwrap();
//! println!("{} ({} bytes)", fp.digest_hex(), fp.size);
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::HashError;

/// A 256-bit BLAKE3 content digest.
pub type Digest = [u8; 32];

/// Read buffer size for streamed hashing.
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Files at or above this size are hashed through a memory map.
pub const MMAP_THRESHOLD: u64 = 16 * 1024 * 1024;

/// Content digest and size of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// BLAKE3 digest of the full content
    pub digest: Digest,
    /// Number of bytes hashed
    pub size: u64,
}

impl Fingerprint {
    /// Digest as a lowercase hexadecimal string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hash_to_hex(&self.digest)
    }
}

/// Computes [`Fingerprint`]s.
///
/// Holds no per-file state, so one instance is shared by every rayon worker.
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    buffer_size: usize,
    mmap_threshold: u64,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Fingerprinter {
    /// Create a fingerprinter with the default buffer size and mmap threshold.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: BUFFER_SIZE,
            mmap_threshold: MMAP_THRESHOLD,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag checked between buffered reads.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Override the size at which files are memory mapped.
    ///
    /// `u64::MAX` disables memory mapping.
    #[must_use]
    pub fn with_mmap_threshold(mut self, threshold: u64) -> Self {
        self.mmap_threshold = threshold;
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Read `path` in full and return its digest and size.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the file vanished since discovery
    /// - `PermissionDenied` if it cannot be opened for reading
    /// - `Interrupted` if shutdown was requested mid-read
    /// - `Io` for any other read failure
    pub fn fingerprint(&self, path: &Path) -> Result<Fingerprint, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;
        let len = file
            .metadata()
            .map_err(|e| HashError::from_io(path.to_path_buf(), e))?
            .len();

        if len >= self.mmap_threshold {
            return self.fingerprint_mapped(path);
        }

        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.buffer_size];
        let mut size = 0u64;

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            let n = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path.to_path_buf(), e)),
            };
            hasher.update(&buffer[..n]);
            size += n as u64;
        }

        log::trace!("Fingerprinted {} ({} bytes)", path.display(), size);

        Ok(Fingerprint {
            digest: *hasher.finalize().as_bytes(),
            size,
        })
    }

    fn fingerprint_mapped(&self, path: &Path) -> Result<Fingerprint, HashError> {
        log::debug!("Hashing large file via mmap: {}", path.display());

        let mut hasher = blake3::Hasher::new();
        hasher
            .update_mmap_rayon(path)
            .map_err(|e| HashError::from_io(path.to_path_buf(), e))?;

        Ok(Fingerprint {
            digest: *hasher.finalize().as_bytes(),
            size: hasher.count(),
        })
    }
}

/// Format a digest as lowercase hex (64 characters).
#[must_use]
pub fn hash_to_hex(digest: &Digest) -> String {
    blake3::Hash::from_bytes(*digest).to_hex().to_string()
}
