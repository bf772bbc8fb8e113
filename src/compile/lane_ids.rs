//! Vergabe synthetischer, 7-stelliger Lane-IDs.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::CompileError;
use crate::shared::CompilerOptions;

/// Kleinste vergebene Lane-ID.
pub const LANE_ID_MIN: u32 = 1_000_000;
/// Größte vergebene Lane-ID.
pub const LANE_ID_MAX: u32 = 9_999_999;

/// Zieht zufällige IDs und verwirft bereits vergebene.
///
/// Mit Seed ist die Folge reproduzierbar. Nach `retry_limit` Kollisionen in
/// Folge wird [`CompileError::IdentifierSpaceExhausted`] gemeldet.
#[derive(Debug, Clone)]
pub struct LaneIdAllocator {
    rng: StdRng,
    range: RangeInclusive<u32>,
    retry_limit: u32,
    issued: HashSet<u32>,
}

impl LaneIdAllocator {
    /// Allokator über den vollen 7-stelligen Bereich.
    pub fn new(seed: Option<u64>, retry_limit: u32) -> Self {
        Self::with_range(seed, retry_limit, LANE_ID_MIN..=LANE_ID_MAX)
    }

    pub fn from_options(options: &CompilerOptions) -> Self {
        Self::new(options.lane_id_seed, options.lane_id_retry_limit)
    }

    /// Allokator über einen eigenen Bereich (z.B. für Tests der Erschöpfung).
    pub fn with_range(seed: Option<u64>, retry_limit: u32, range: RangeInclusive<u32>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            range,
            retry_limit: retry_limit.max(1),
            issued: HashSet::new(),
        }
    }

    /// Zieht eine noch nicht vergebene ID.
    pub fn allocate(&mut self) -> Result<u32, CompileError> {
        for _ in 0..self.retry_limit {
            let candidate = self.rng.gen_range(self.range.clone());
            if self.issued.insert(candidate) {
                return Ok(candidate);
            }
        }

        log::error!(
            "Keine freie Lane-ID nach {} Versuchen ({} vergeben)",
            self.retry_limit,
            self.issued.len()
        );
        Err(CompileError::IdentifierSpaceExhausted {
            attempts: self.retry_limit,
            issued: self.issued.len(),
        })
    }

    /// Gibt eine ID wieder frei. `false`, wenn sie nicht vergeben war.
    pub fn release(&mut self, id: u32) -> bool {
        self.issued.remove(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.issued.contains(&id)
    }

    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }
}
