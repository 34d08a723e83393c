use std::collections::{BTreeMap, HashSet};

use normalize::{NormalizedName, RawName};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::BlockingConfig;
use crate::error::BlockingError;
use crate::key::{BlockKey, BlockingStrategy};

/// A candidate record with its caller id and derived normalized name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub raw: RawName,
    pub name: NormalizedName,
}

/// Members of the block resolved for a query.
#[derive(Debug, Clone, Copy)]
pub struct BlockLookup<'a> {
    pub key: &'a BlockKey,
    /// Candidate positions in ascending input order.
    pub members: &'a [usize],
    /// The query's own block was empty and every candidate is returned.
    pub used_fallback: bool,
}

/// Realized comparisons versus the naive `queries × candidates` baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReductionReport {
    pub naive: u64,
    pub blocked: u64,
    /// `1 - blocked / naive`; 0 when there is nothing to compare.
    pub ratio: f64,
}

/// Candidates partitioned by [`BlockKey`]. Built once per job, read-only after.
#[derive(Debug, Clone)]
pub struct BlockingIndex {
    strategy: BlockingStrategy,
    candidates: Vec<Candidate>,
    blocks: BTreeMap<BlockKey, Vec<usize>>,
    all: Vec<usize>,
    global_key: BlockKey,
}

impl BlockingIndex {
    /// Partition `candidates`. Positions are indices into the input vector.
    pub fn build(candidates: Vec<Candidate>, cfg: &BlockingConfig) -> Result<Self, BlockingError> {
        cfg.validate()?;

        let mut seen = HashSet::with_capacity(candidates.len());
        for c in &candidates {
            if !seen.insert(c.id.as_str()) {
                return Err(BlockingError::DuplicateId(c.id.clone()));
            }
        }

        let strategy = cfg.effective_strategy(candidates.len());
        let mut blocks: BTreeMap<BlockKey, Vec<usize>> = BTreeMap::new();
        for (position, c) in candidates.iter().enumerate() {
            blocks
                .entry(strategy.key_for(&c.name))
                .or_default()
                .push(position);
        }
        let all = (0..candidates.len()).collect();

        info!(
            candidates = candidates.len(),
            blocks = blocks.len(),
            strategy = ?strategy,
            "blocking_index_built"
        );

        Ok(Self {
            strategy,
            candidates,
            blocks,
            all,
            global_key: BlockKey::global(),
        })
    }

    pub fn strategy(&self) -> BlockingStrategy {
        self.strategy
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn key_for(&self, name: &NormalizedName) -> BlockKey {
        self.strategy.key_for(name)
    }

    pub fn candidate(&self, position: usize) -> Option<&Candidate> {
        self.candidates.get(position)
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Members of `key`, empty when the block does not exist.
    pub fn block(&self, key: &BlockKey) -> &[usize] {
        self.blocks.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn blocks(&self) -> impl Iterator<Item = (&BlockKey, &[usize])> {
        self.blocks.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn all(&self) -> &[usize] {
        &self.all
    }

    /// Resolve the comparison set for a query, falling back to every
    /// candidate when the query's block is empty.
    pub fn lookup(&self, name: &NormalizedName) -> BlockLookup<'_> {
        let key = self.strategy.key_for(name);
        match self.blocks.get_key_value(&key) {
            Some((key, members)) => BlockLookup {
                key,
                members,
                used_fallback: false,
            },
            None => BlockLookup {
                key: &self.global_key,
                members: &self.all,
                used_fallback: true,
            },
        }
    }

    /// Compute and log the comparison reduction for a set of query names.
    pub fn reduction_report<'a, I>(&self, queries: I) -> ReductionReport
    where
        I: IntoIterator<Item = &'a NormalizedName>,
    {
        let n = self.candidates.len() as u64;
        let mut naive = 0u64;
        let mut blocked = 0u64;
        for q in queries {
            naive += n;
            blocked += self.lookup(q).members.len() as u64;
        }
        let ratio = if naive == 0 {
            0.0
        } else {
            1.0 - blocked as f64 / naive as f64
        };
        let report = ReductionReport {
            naive,
            blocked,
            ratio,
        };
        info!(
            naive = report.naive,
            blocked = report.blocked,
            reduction_ratio = report.ratio,
            "blocking_reduction"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use normalize::{NormalizeConfig, Normalizer};

    fn candidates(names: &[&str]) -> Vec<Candidate> {
        let n = Normalizer::new(&NormalizeConfig::default()).unwrap();
        names
            .iter()
            .enumerate()
            .map(|(i, s)| Candidate {
                id: format!("c{i}"),
                raw: RawName::new(*s),
                name: n.normalize(s),
            })
            .collect()
    }

    fn blocked_cfg() -> BlockingConfig {
        BlockingConfig {
            global_block_threshold: 0,
            ..BlockingConfig::default()
        }
    }

    #[test]
    fn union_of_blocks_is_exact_partition() {
        let names = [
            "Acme", "Apex Labs", "Beta", "3M", "", "Zeta", "Alpha", "!!!", "Saint Mary",
        ];
        let idx = BlockingIndex::build(candidates(&names), &blocked_cfg()).unwrap();

        let mut seen: Vec<usize> = idx.blocks().flat_map(|(_, m)| m.iter().copied()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..names.len()).collect::<Vec<_>>());

        assert_eq!(idx.block(&BlockKey::new("a")), &[0, 1, 6]);
        assert_eq!(idx.block(&BlockKey::numeric()), &[3]);
        assert_eq!(idx.block(&BlockKey::unknown()), &[4, 7]);
    }

    #[test]
    fn small_sets_use_global_block() {
        let idx =
            BlockingIndex::build(candidates(&["Acme", "Beta"]), &BlockingConfig::default())
                .unwrap();
        assert_eq!(idx.strategy(), BlockingStrategy::Global);
        assert_eq!(idx.block(&BlockKey::global()), &[0, 1]);
    }

    #[test]
    fn lookup_falls_back_when_block_empty() {
        let idx = BlockingIndex::build(candidates(&["Acme", "Beta"]), &blocked_cfg()).unwrap();
        let n = Normalizer::new(&NormalizeConfig::default()).unwrap();

        let hit = idx.lookup(&n.normalize("Acme Corp"));
        assert!(!hit.used_fallback);
        assert_eq!(hit.members, &[0]);

        let miss = idx.lookup(&n.normalize("Zebra"));
        assert!(miss.used_fallback);
        assert_eq!(miss.key, &BlockKey::global());
        assert_eq!(miss.members, &[0, 1]);
    }

    #[test]
    fn reduction_report_counts_comparisons() {
        let idx =
            BlockingIndex::build(candidates(&["Acme", "Apex", "Beta", "Bolt"]), &blocked_cfg())
                .unwrap();
        let n = Normalizer::new(&NormalizeConfig::default()).unwrap();
        let queries = [n.normalize("Acme"), n.normalize("Zulu")];
        let report = idx.reduction_report(queries.iter());
        assert_eq!(report.naive, 8);
        // "a" block has 2, "z" falls back to all 4
        assert_eq!(report.blocked, 6);
        assert!((report.ratio - 0.25).abs() < 1e-12);

        let empty = idx.reduction_report(std::iter::empty());
        assert_eq!(empty.ratio, 0.0);
    }

    #[test]
    fn rejects_duplicate_ids_and_zero_prefix() {
        let mut cs = candidates(&["Acme", "Beta"]);
        cs[1].id = "c0".into();
        assert_eq!(
            BlockingIndex::build(cs, &blocked_cfg()).unwrap_err(),
            BlockingError::DuplicateId("c0".into())
        );

        let cfg = BlockingConfig {
            strategy: BlockingStrategy::TokenPrefix { len: 0 },
            global_block_threshold: 0,
        };
        assert!(BlockingIndex::build(candidates(&["Acme"]), &cfg).is_err());
    }
}
