//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Building the digest→group index from a traversal ([`index`])
//! - Selecting one survivor per duplicate group and totalling the
//!   reclaimable space ([`resolver`])

pub mod index;
pub mod resolver;

pub use index::{
    build_index, FingerprintGroup, FingerprintIndex, IndexBuilder, IndexConfig, IndexError,
    IndexReport,
};
pub use resolver::{resolve, DuplicateSet, KeepPolicy, ReclaimPlan, BYTES_PER_MB};
