//! Duplicate resolution: which copy survives, what gets quarantined.
//!
//! # Overview
//!
//! [`resolve`] walks a completed [`FingerprintIndex`], turns every group with
//! two or more members into a [`DuplicateSet`] and folds them into a
//! [`ReclaimPlan`]. Exactly one member of each set is kept, chosen by a
//! [`KeepPolicy`]; the rest are listed for quarantine.
//!
//! The default policy keeps the member with the longest path string, taking
//! the last one encountered when lengths tie. Path length is only a weak
//! proxy for "more specific location"; [`KeepPolicy::ShortestPath`] and
//! [`KeepPolicy::Oldest`] are the alternatives.
//!
//! # Example
//!
//! ```
//! use deduplicate_files::duplicates::{resolve, FingerprintIndex, KeepPolicy};
//! use std::path::PathBuf;
//!
//! let mut index = FingerprintIndex::new();
//! let digest = *blake3::hash(b"hello").as_bytes();
//! index.insert(digest, 5, PathBuf::from("root/a.txt"));
//! index.insert(digest, 5, PathBuf::from("root/sub/b.txt"));
//!
//! let plan = resolve(&index, KeepPolicy::LongestPath);
//! assert_eq!(plan.duplicate_groups, 1);
//! assert_eq!(plan.reclaimable_bytes, 5);
//! assert_eq!(plan.quarantine, vec![PathBuf::from("root/a.txt")]);
//! ```

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::index::{FingerprintGroup, FingerprintIndex};
use crate::scanner::{hash_to_hex, Digest};

/// Bytes per megabyte in the reclaimable-space summary.
pub const BYTES_PER_MB: u64 = 1_000_000;

/// Rule for picking the one member of a duplicate set that is kept.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum KeepPolicy {
    /// Keep the longest path string (in characters); the last one
    /// encountered wins ties.
    #[default]
    LongestPath,
    /// Keep the shortest path string; the first one encountered wins ties.
    ShortestPath,
    /// Keep the earliest modified file; ties fall back to the shortest path.
    Oldest,
}

impl KeepPolicy {
    /// Index of the member to keep, or `None` for an empty slice.
    #[must_use]
    pub fn select_keep(self, members: &[PathBuf]) -> Option<usize> {
        if members.is_empty() {
            return None;
        }
        let selected = match self {
            Self::LongestPath => {
                let mut keep = 0;
                let mut longest = 0;
                for (i, path) in members.iter().enumerate() {
                    let len = path_len(path);
                    if len >= longest {
                        longest = len;
                        keep = i;
                    }
                }
                keep
            }
            Self::ShortestPath => {
                let mut keep = 0;
                let mut shortest = usize::MAX;
                for (i, path) in members.iter().enumerate() {
                    let len = path_len(path);
                    if len < shortest {
                        shortest = len;
                        keep = i;
                    }
                }
                keep
            }
            Self::Oldest => members
                .iter()
                .enumerate()
                .map(|(i, path)| {
                    let mtime = modified(path);
                    // Unreadable mtimes sort after every readable one
                    (mtime.is_none(), mtime, path_len(path), i)
                })
                .min()
                .map_or(0, |(.., i)| i),
        };
        Some(selected)
    }
}

impl std::fmt::Display for KeepPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LongestPath => write!(f, "longest-path"),
            Self::ShortestPath => write!(f, "shortest-path"),
            Self::Oldest => write!(f, "oldest"),
        }
    }
}

/// Length in characters, so non-ASCII names are not favored by their encoding.
fn path_len(path: &Path) -> usize {
    path.to_string_lossy().chars().count()
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// One duplicate group after selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateSet {
    /// BLAKE3 digest shared by all members
    #[serde(serialize_with = "serialize_digest")]
    pub digest: Digest,
    /// Size of each member in bytes
    pub size: u64,
    /// The surviving copy
    pub keep: PathBuf,
    /// Copies marked for quarantine, in discovery order
    pub quarantine: Vec<PathBuf>,
}

fn serialize_digest<S: serde::Serializer>(digest: &Digest, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hash_to_hex(digest))
}

impl DuplicateSet {
    /// Split a group into keep and quarantine according to `policy`.
    ///
    /// Returns `None` for groups that are not duplicates.
    #[must_use]
    pub fn from_group(digest: Digest, group: &FingerprintGroup, policy: KeepPolicy) -> Option<Self> {
        if !group.is_duplicate() {
            return None;
        }
        let keep_index = policy.select_keep(&group.members)?;
        let quarantine = group
            .members
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != keep_index)
            .map(|(_, p)| p.clone())
            .collect();

        Some(Self {
            digest,
            size: group.size,
            keep: group.members[keep_index].clone(),
            quarantine,
        })
    }

    /// Number of copies including the kept one.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.quarantine.len() + 1
    }

    /// Bytes freed by quarantining every copy but the kept one.
    #[must_use]
    pub fn reclaimable_bytes(&self) -> u64 {
        (self.quarantine.len() as u64).saturating_mul(self.size)
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hash_to_hex(&self.digest)
    }
}

/// What a run would reclaim and which files it would move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReclaimPlan {
    /// Groups with two or more members
    pub duplicate_groups: usize,
    /// Sum of `(members - 1) * size` over all duplicate groups
    pub reclaimable_bytes: u64,
    /// Every path marked for quarantine, flattened across sets
    pub quarantine: Vec<PathBuf>,
    /// Per-group detail, largest reclaim first
    pub sets: Vec<DuplicateSet>,
}

impl ReclaimPlan {
    /// True when there is nothing to quarantine.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quarantine.is_empty()
    }

    /// Reclaimable space in (decimal) megabytes.
    #[must_use]
    pub fn reclaimable_megabytes(&self) -> f64 {
        self.reclaimable_bytes as f64 / BYTES_PER_MB as f64
    }

    /// Paths kept, one per duplicate set.
    #[must_use]
    pub fn kept_paths(&self) -> Vec<&Path> {
        self.sets.iter().map(|s| s.keep.as_path()).collect()
    }
}

/// Build the reclaim plan for a completed index.
///
/// Sets are ordered by reclaimable bytes (descending) then digest, so the
/// quarantine list, and with it every quarantine ordinal, is stable for a
/// given tree.
#[must_use]
pub fn resolve(index: &FingerprintIndex, policy: KeepPolicy) -> ReclaimPlan {
    let mut sets: Vec<DuplicateSet> = index
        .duplicate_groups()
        .filter_map(|(digest, group)| DuplicateSet::from_group(*digest, group, policy))
        .collect();

    sets.sort_by(|a, b| {
        b.reclaimable_bytes()
            .cmp(&a.reclaimable_bytes())
            .then_with(|| a.digest.cmp(&b.digest))
    });

    let mut plan = ReclaimPlan::default();
    for set in &sets {
        plan.duplicate_groups += 1;
        plan.reclaimable_bytes = plan.reclaimable_bytes.saturating_add(set.reclaimable_bytes());
        plan.quarantine.extend(set.quarantine.iter().cloned());

        log::debug!(
            "Duplicate set {}: {} copies of {} bytes, keeping {}",
            set.digest_hex(),
            set.member_count(),
            set.size,
            set.keep.display()
        );
    }
    plan.sets = sets;

    log::info!(
        "Resolved {} duplicate sets, {} files to quarantine, {} bytes reclaimable (policy: {})",
        plan.duplicate_groups,
        plan.quarantine.len(),
        plan.reclaimable_bytes,
        policy
    );

    plan
}
