//! Identity pools and cell profiles.
//!
//! Fixed-shape, randomly sampled reference data for generation. The pools
//! are built once from a seeded RNG and read-only thereafter: the same seed
//! always yields the same cell partition and cell-to-location mapping.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Number of device identifiers in the pool.
pub const DEVICE_POOL_SIZE: usize = 50;

/// Number of owner identifiers in the pool.
pub const OWNER_POOL_SIZE: usize = 30;

/// Number of location identifiers in the pool.
pub const LOCATION_POOL_SIZE: usize = 20;

/// Owners per cell.
pub const CELL_SIZE: usize = 5;

/// Number of cells carved from the front of the owner pool.
pub const CELL_COUNT: usize = 3;

/// Locations sampled for each cell.
pub const CELL_LOCATION_COUNT: usize = 5;

/// A cell's member owners and their shared location set.
///
/// Members are consecutive owners in pool order; the location set is sampled
/// without replacement when the pools are constructed and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellProfile {
    members: Vec<String>,
    locations: Vec<String>,
}

impl CellProfile {
    /// Returns the owner identifiers in cell order.
    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Returns the cell's sampled location set.
    #[must_use]
    pub fn locations(&self) -> &[String] {
        &self.locations
    }
}

/// Static identity reference data for movement generation.
///
/// # Example
///
/// ```
/// use movement_data::IdentityPools;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
/// let pools = IdentityPools::new(&mut rng);
///
/// assert_eq!(pools.device_ids().len(), 50);
/// assert_eq!(pools.cells().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPools {
    device_ids: Vec<String>,
    owner_ids: Vec<String>,
    location_ids: Vec<String>,
    cells: Vec<CellProfile>,
}

impl IdentityPools {
    /// Builds the pools, partitions the first fifteen owners into three
    /// cells of five, and samples five distinct locations for each cell.
    ///
    /// The same RNG seed always produces identical pools.
    #[must_use]
    pub fn new(rng: &mut ChaCha8Rng) -> Self {
        let device_ids = id_pool('D', DEVICE_POOL_SIZE);
        let owner_ids = id_pool('O', OWNER_POOL_SIZE);
        let location_ids = id_pool('L', LOCATION_POOL_SIZE);

        let cells = owner_ids
            .chunks(CELL_SIZE)
            .take(CELL_COUNT)
            .map(|members| CellProfile {
                members: members.to_vec(),
                locations: sample_distinct(rng, &location_ids, CELL_LOCATION_COUNT),
            })
            .collect();

        Self {
            device_ids,
            owner_ids,
            location_ids,
            cells,
        }
    }

    /// Returns the device identifier pool.
    #[must_use]
    pub fn device_ids(&self) -> &[String] {
        &self.device_ids
    }

    /// Returns the owner identifier pool.
    #[must_use]
    pub fn owner_ids(&self) -> &[String] {
        &self.owner_ids
    }

    /// Returns the location identifier pool.
    #[must_use]
    pub fn location_ids(&self) -> &[String] {
        &self.location_ids
    }

    /// Returns the cell profiles in cell order.
    #[must_use]
    pub fn cells(&self) -> &[CellProfile] {
        &self.cells
    }
}

/// Builds a pool of zero-padded identifiers with a single-letter prefix.
fn id_pool(prefix: char, count: usize) -> Vec<String> {
    (0..count).map(|index| format!("{prefix}{index:05}")).collect()
}

/// Samples `count` distinct values by shuffling a copy and truncating.
pub(crate) fn sample_distinct(
    rng: &mut ChaCha8Rng,
    values: &[String],
    count: usize,
) -> Vec<String> {
    let mut shuffled = values.to_vec();
    shuffled.shuffle(rng);
    shuffled.truncate(count.min(values.len()));
    shuffled
}
