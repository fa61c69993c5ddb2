//! Duplicate and near-duplicate file detection.
//!
//! Two passes over the non-empty files of a record set:
//! 1. Exact: group by size, hash every member of a multi-file size bucket,
//!    group by digest.
//! 2. Similar: among files not already in an exact group, compare names
//!    within each extension and group pairs at or above the threshold.
//!
//! Each group gets a recommended keeper (see [`crate::ranking`]).

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use derive_builder::Builder;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use dustpan_core::{ContentHash, FileRecord, RecordSet, SkippedRecord};

use crate::hasher::{Blake3Hasher, ContentHasher};
use crate::ranking::recommend_keeper;
use crate::similarity::{normalize_name, normalized_similarity};

/// Default name-similarity threshold for SIMILAR groups.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.70;

/// How above-threshold name pairs become groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarGrouping {
    /// One group per similar pair; clusters may overlap.
    #[default]
    Pairwise,
    /// One group per connected component of the similarity graph.
    Connected,
}

/// Configuration for duplicate detection.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
#[serde(default)]
pub struct DuplicateConfig {
    /// Minimum name similarity for a SIMILAR group.
    #[builder(default = "DEFAULT_SIMILARITY_THRESHOLD")]
    pub similarity_threshold: f64,

    /// Run the name-similarity pass at all.
    #[builder(default = "true")]
    pub detect_similar: bool,

    /// Pairwise or connected-component grouping of similar names.
    #[builder(default)]
    pub similar_grouping: SimilarGrouping,

    /// Maximum number of groups to return (0 = unlimited).
    #[builder(default = "0")]
    pub max_groups: usize,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            detect_similar: true,
            similar_grouping: SimilarGrouping::Pairwise,
            max_groups: 0,
        }
    }
}

impl DuplicateConfig {
    /// Create a new config builder.
    pub fn builder() -> DuplicateConfigBuilder {
        DuplicateConfigBuilder::default()
    }
}

/// Whether a group's members share content or only a similar name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DuplicateKind {
    /// Byte-identical content.
    Exact,
    /// Similar names within one extension; content not compared.
    Similar,
}

/// A set of two or more related files with a keep/delete recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Identifier, stable for one run.
    pub group_id: String,

    /// Exact or similar.
    pub kind: DuplicateKind,

    /// 1.0 for exact groups, name similarity for similar groups.
    pub similarity: f64,

    /// Shared digest (exact groups only).
    pub hash: Option<ContentHash>,

    /// Members in path order.
    pub members: Vec<FileRecord>,

    /// Sum of member sizes.
    pub total_size: u64,

    /// `total_size` minus the size of the kept member.
    pub wasted_size: u64,

    /// Member recommended to keep.
    pub recommended_keep: FileRecord,

    /// All other members.
    pub recommended_delete: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Build a group and rank its members. Returns `None` for fewer than two.
    pub fn new(
        kind: DuplicateKind,
        similarity: f64,
        hash: Option<ContentHash>,
        mut members: Vec<FileRecord>,
    ) -> Option<Self> {
        members.sort_by(|a, b| a.path.cmp(&b.path));
        members.dedup_by(|a, b| a.path == b.path);
        if members.len() < 2 {
            return None;
        }

        let keep_idx = recommend_keeper(&members)?;
        let total_size: u64 = members.iter().map(|m| m.size_bytes).sum();
        let recommended_keep = members[keep_idx].clone();
        let recommended_delete = members
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != keep_idx)
            .map(|(_, m)| m.clone())
            .collect();

        Some(Self {
            group_id: String::new(),
            kind,
            similarity,
            hash,
            wasted_size: total_size - recommended_keep.size_bytes,
            total_size,
            members,
            recommended_keep,
            recommended_delete,
        })
    }

    /// Get the number of files in the group.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Number of files that could go if the keeper stays.
    pub fn deletable_count(&self) -> usize {
        self.recommended_delete.len()
    }

    /// Check if the group contains a path.
    pub fn contains(&self, path: &Path) -> bool {
        self.members.iter().any(|m| m.path == path)
    }
}

/// Results from duplicate analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Exact groups (by wasted space descending), then similar groups
    /// (by similarity descending).
    pub groups: Vec<DuplicateGroup>,

    /// Sum of `total_size` over all groups.
    pub total_duplicate_size: u64,

    /// Sum of `wasted_size` over all groups.
    pub total_wasted_space: u64,

    /// Number of non-empty files analyzed.
    pub files_analyzed: u64,

    /// Number of exact groups.
    pub exact_group_count: usize,

    /// Number of similar groups.
    pub similar_group_count: usize,

    /// Files left out because their content could not be read.
    pub skipped: Vec<SkippedRecord>,

    /// The run was cancelled; groups are those formed before cancellation.
    pub interrupted: bool,
}

impl DuplicateReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Iterate over exact groups.
    pub fn exact_groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.iter().filter(|g| g.kind == DuplicateKind::Exact)
    }

    /// Iterate over similar groups.
    pub fn similar_groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.iter().filter(|g| g.kind == DuplicateKind::Similar)
    }

    /// Total number of member slots across all groups.
    pub fn total_duplicate_files(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::count).sum()
    }
}

/// Outcome of hashing one size bucket.
struct BucketOutcome<'a> {
    groups: Vec<(ContentHash, Vec<&'a FileRecord>)>,
    skipped: Vec<SkippedRecord>,
    interrupted: bool,
}

/// Duplicate file finder.
pub struct DuplicateFinder<H = Blake3Hasher> {
    config: DuplicateConfig,
    hasher: H,
    cancel: CancellationToken,
}

impl DuplicateFinder<Blake3Hasher> {
    /// Create a new duplicate finder with default config.
    pub fn new() -> Self {
        Self::with_config(DuplicateConfig::default())
    }

    /// Create a new duplicate finder with custom config.
    pub fn with_config(config: DuplicateConfig) -> Self {
        Self::with_hasher(config, Blake3Hasher::new())
    }
}

impl<H: ContentHasher> DuplicateFinder<H> {
    /// Create a finder that hashes through `hasher`.
    pub fn with_hasher(config: DuplicateConfig, hasher: H) -> Self {
        Self {
            config,
            hasher,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an external cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this finder's runs.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Get the active configuration.
    pub fn config(&self) -> &DuplicateConfig {
        &self.config
    }

    /// Find exact and similar duplicates in a record set.
    pub fn find_duplicates(&self, records: &RecordSet) -> DuplicateReport {
        // Zero-byte files belong to the empty-file rule, not here.
        let files: Vec<&FileRecord> = records.files().filter(|f| f.size_bytes > 0).collect();
        let files_analyzed = files.len() as u64;

        let size_groups = group_by_size(&files);
        debug!(
            files = files.len(),
            buckets = size_groups.len(),
            "hashing size-matched files"
        );

        let outcomes: Vec<BucketOutcome<'_>> = size_groups
            .into_par_iter()
            .map(|(_size, bucket)| self.hash_bucket(bucket))
            .collect();

        let mut skipped = Vec::new();
        let mut interrupted = false;
        let mut exact_groups = Vec::new();
        let mut in_exact: HashSet<&Path> = HashSet::new();

        for outcome in outcomes {
            skipped.extend(outcome.skipped);
            interrupted |= outcome.interrupted;
            for (hash, members) in outcome.groups {
                in_exact.extend(members.iter().map(|m| m.path.as_path()));
                let members = members.into_iter().cloned().collect();
                exact_groups.extend(DuplicateGroup::new(
                    DuplicateKind::Exact,
                    1.0,
                    Some(hash),
                    members,
                ));
            }
        }

        exact_groups.sort_by(|a, b| {
            b.wasted_size
                .cmp(&a.wasted_size)
                .then_with(|| a.members[0].path.cmp(&b.members[0].path))
        });
        for group in &mut exact_groups {
            if let Some(hash) = group.hash {
                group.group_id = format!("exact-{}", &hash.to_hex()[..16]);
            }
        }

        let mut similar_groups = Vec::new();
        if self.config.detect_similar && !interrupted {
            let remaining: Vec<&FileRecord> = files
                .iter()
                .copied()
                .filter(|f| !in_exact.contains(f.path.as_path()))
                .collect();
            let (groups, cancelled) = self.find_similar(&remaining);
            similar_groups = groups;
            interrupted |= cancelled;
        }

        similar_groups.sort_by(compare_similar);
        for (i, group) in similar_groups.iter_mut().enumerate() {
            group.group_id = format!("similar-{}", i + 1);
        }

        let exact_group_count = exact_groups.len();
        let mut groups = exact_groups;
        groups.extend(similar_groups);

        if self.config.max_groups > 0 && groups.len() > self.config.max_groups {
            groups.truncate(self.config.max_groups);
        }

        let exact_group_count = exact_group_count.min(groups.len());
        let similar_group_count = groups.len() - exact_group_count;
        let total_duplicate_size = groups.iter().map(|g| g.total_size).sum();
        let total_wasted_space = groups.iter().map(|g| g.wasted_size).sum();

        debug!(
            exact = exact_group_count,
            similar = similar_group_count,
            skipped = skipped.len(),
            interrupted,
            "duplicate analysis finished"
        );

        DuplicateReport {
            groups,
            total_duplicate_size,
            total_wasted_space,
            files_analyzed,
            exact_group_count,
            similar_group_count,
            skipped,
            interrupted,
        }
    }

    /// Hash every member of one size bucket and group by digest.
    fn hash_bucket<'a>(&self, bucket: Vec<&'a FileRecord>) -> BucketOutcome<'a> {
        let hashes: Vec<Option<_>> = bucket
            .par_iter()
            .map(|file| {
                if self.cancel.is_cancelled() {
                    None
                } else {
                    Some(self.hasher.hash(&file.path))
                }
            })
            .collect();

        let mut by_hash: IndexMap<ContentHash, Vec<&'a FileRecord>> = IndexMap::new();
        let mut skipped = Vec::new();
        let mut interrupted = false;

        for (file, result) in bucket.into_iter().zip(hashes) {
            match result {
                Some(Ok(hash)) => by_hash.entry(hash).or_default().push(file),
                Some(Err(err)) => {
                    warn!(path = %file.path.display(), error = %err, "excluding unreadable file");
                    skipped.extend(err.to_skipped());
                }
                None => interrupted = true,
            }
        }

        let groups = by_hash
            .into_iter()
            .filter(|(_, members)| members.len() >= 2)
            .collect();

        BucketOutcome {
            groups,
            skipped,
            interrupted,
        }
    }

    /// Compare names within each extension and build SIMILAR groups.
    ///
    /// Returns the groups and whether the pass was cancelled.
    fn find_similar(&self, files: &[&FileRecord]) -> (Vec<DuplicateGroup>, bool) {
        let mut by_extension: BTreeMap<&str, Vec<&FileRecord>> = BTreeMap::new();
        for &file in files {
            by_extension.entry(file.extension.as_str()).or_default().push(file);
        }
        by_extension.retain(|_, v| v.len() > 1);

        let mut groups = Vec::new();
        let mut cancelled = false;

        for (extension, members) in by_extension {
            let normalized: Vec<Vec<char>> = members
                .iter()
                .map(|m| normalize_name(&m.file_name).chars().collect())
                .collect();

            let (pairs, row_cancelled) = self.similar_pairs(&normalized);
            cancelled |= row_cancelled;
            trace!(extension, candidates = members.len(), pairs = pairs.len(), "similar pairs");

            match self.config.similar_grouping {
                SimilarGrouping::Pairwise => {
                    groups.extend(pairwise_groups(&members, &pairs));
                }
                SimilarGrouping::Connected => {
                    groups.extend(connected_groups(&members, &pairs));
                }
            }

            if cancelled {
                break;
            }
        }

        (groups, cancelled)
    }

    /// All index pairs `(i, j)`, `i < j`, scoring in `[threshold, 1.0)`.
    ///
    /// Names that normalize to the same string score 1.0 and are left out.
    fn similar_pairs(&self, names: &[Vec<char>]) -> (Vec<(usize, usize, f64)>, bool) {
        let threshold = self.config.similarity_threshold;
        let rows: Vec<Option<Vec<(usize, usize, f64)>>> = (0..names.len())
            .into_par_iter()
            .map(|i| {
                if self.cancel.is_cancelled() {
                    return None;
                }
                let row = ((i + 1)..names.len())
                    .filter_map(|j| {
                        let similarity = normalized_similarity(&names[i], &names[j]);
                        (similarity >= threshold && similarity < 1.0)
                            .then_some((i, j, similarity))
                    })
                    .collect();
                Some(row)
            })
            .collect();

        let cancelled = rows.iter().any(Option::is_none);
        (rows.into_iter().flatten().flatten().collect(), cancelled)
    }
}

impl Default for DuplicateFinder<Blake3Hasher> {
    fn default() -> Self {
        Self::new()
    }
}

/// Group files by size, keeping only sizes shared by two or more files.
fn group_by_size<'a>(files: &[&'a FileRecord]) -> BTreeMap<u64, Vec<&'a FileRecord>> {
    let mut groups: BTreeMap<u64, Vec<&'a FileRecord>> = BTreeMap::new();
    for file in files {
        groups.entry(file.size_bytes).or_default().push(file);
    }
    groups.retain(|_, v| v.len() > 1);
    groups
}

/// One group per above-threshold pair. `similar_pairs` yields each unordered
/// pair once, so no pair is ever already covered.
fn pairwise_groups(members: &[&FileRecord], pairs: &[(usize, usize, f64)]) -> Vec<DuplicateGroup> {
    pairs
        .iter()
        .filter_map(|&(i, j, similarity)| {
            DuplicateGroup::new(
                DuplicateKind::Similar,
                similarity,
                None,
                vec![members[i].clone(), members[j].clone()],
            )
        })
        .collect()
}

fn connected_groups(
    members: &[&FileRecord],
    pairs: &[(usize, usize, f64)],
) -> Vec<DuplicateGroup> {
    let mut parent: Vec<usize> = (0..members.len()).collect();

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    for &(i, j, _) in pairs {
        let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
        if ri != rj {
            parent[ri.max(rj)] = ri.min(rj);
        }
    }

    // Component root -> (member indices, weakest edge).
    let mut components: BTreeMap<usize, (Vec<usize>, f64)> = BTreeMap::new();
    for &(i, _, similarity) in pairs {
        let root = find(&mut parent, i);
        let entry = components.entry(root).or_insert((Vec::new(), 1.0));
        entry.1 = entry.1.min(similarity);
    }
    for idx in 0..members.len() {
        let root = find(&mut parent, idx);
        if let Some((indices, _)) = components.get_mut(&root) {
            indices.push(idx);
        }
    }

    components
        .into_values()
        .filter_map(|(indices, similarity)| {
            let records = indices.into_iter().map(|i| members[i].clone()).collect();
            DuplicateGroup::new(DuplicateKind::Similar, similarity, None, records)
        })
        .collect()
}

fn compare_similar(a: &DuplicateGroup, b: &DuplicateGroup) -> Ordering {
    b.similarity.total_cmp(&a.similarity).then_with(|| {
        a.members
            .iter()
            .map(|m| &m.path)
            .cmp(b.members.iter().map(|m| &m.path))
    })
}
