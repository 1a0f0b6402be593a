//! Movement pattern generation.
//!
//! This module produces the three traffic shapes submitted to the
//! movement-tracking API: independent "normal" movements, coordinated cell
//! walks through a cell's shared location set, and device hand-offs between
//! cell members. All randomness flows through an injected [`ChaCha8Rng`] so
//! the same seed reproduces the same dataset against a fixed clock.

use std::ops::RangeInclusive;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;

use crate::pools::{CELL_COUNT, CellProfile, IdentityPools, sample_distinct};
use crate::record::{Location, MovementRecord, MovementType};

/// Movements look back at most this many hours from the current time.
const LOOKBACK_HOURS: i64 = 48;

/// Fewest devices assigned to a cell member per pattern.
const MIN_DEVICES_PER_MEMBER: usize = 1;

/// Most devices assigned to a cell member per pattern.
const MAX_DEVICES_PER_MEMBER: usize = 3;

/// Lower bound of the normal-movement confidence grid, in percent.
const NORMAL_CONFIDENCE_MIN: u32 = 70;

/// Lower bound of the cell-pattern confidence grid, in percent.
const CELL_CONFIDENCE_MIN: u32 = 80;

/// Fixed confidence reported for transfer movements.
const TRANSFER_CONFIDENCE: f64 = 0.9;

/// Minutes after the step base at which a cell member reaches the current
/// location.
const CELL_ARRIVAL_MINUTES: RangeInclusive<i64> = 0..=30;

/// Minutes after the step base at which a cell member reaches the next
/// location.
const CELL_DEPARTURE_MINUTES: RangeInclusive<i64> = 45..=90;

/// Minutes between the two halves of a device hand-off.
const TRANSFER_GAP_MINUTES: RangeInclusive<i64> = 15..=30;

/// Hours the base timestamp advances after each cell location step.
const CELL_STEP_HOURS: i64 = 2;

/// Hours the base timestamp advances after each transfer pair.
const TRANSFER_STEP_HOURS: i64 = 3;

/// How many records of each shape a dataset contains.
///
/// The defaults match the standard exercise dataset: 1000 normal movements,
/// one pattern per defined cell, and 10 transfer runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPlan {
    /// Independent random movements to generate.
    pub normal_movements: usize,
    /// Number of cells (taken in cell order) to generate patterns for.
    pub cell_patterns: usize,
    /// Independent transfer-pattern runs to generate.
    pub transfer_runs: usize,
}

impl Default for DatasetPlan {
    fn default() -> Self {
        Self {
            normal_movements: 1000,
            cell_patterns: CELL_COUNT,
            transfer_runs: 10,
        }
    }
}

/// Generates movement records from a fixed set of identity pools.
///
/// The pools and their cell-to-location mappings are fixed at construction;
/// only the per-call device assignments of the cell pattern are ephemeral.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use mockable::DefaultClock;
/// use movement_data::{DatasetPlan, IdentityPools, MovementGenerator};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let mut rng = ChaCha8Rng::seed_from_u64(42);
/// let pools = IdentityPools::new(&mut rng);
/// let generator = MovementGenerator::new(pools, Arc::new(DefaultClock));
///
/// let plan = DatasetPlan {
///     normal_movements: 5,
///     cell_patterns: 0,
///     transfer_runs: 0,
/// };
/// let movements = generator.dataset(&mut rng, &plan);
///
/// assert_eq!(movements.len(), 5);
/// ```
pub struct MovementGenerator {
    pools: IdentityPools,
    clock: Arc<dyn Clock>,
}

impl MovementGenerator {
    /// Creates a generator over the given pools and clock.
    #[must_use]
    pub fn new(pools: IdentityPools, clock: Arc<dyn Clock>) -> Self {
        Self { pools, clock }
    }

    /// Returns the identity pools backing this generator.
    #[must_use]
    pub const fn pools(&self) -> &IdentityPools {
        &self.pools
    }

    /// Generates one independent random movement.
    ///
    /// Device, owner, and location are chosen uniformly from their pools;
    /// the timestamp falls within the last 48 hours.
    pub fn normal_movement(&self, rng: &mut ChaCha8Rng) -> MovementRecord {
        let timestamp = self.recent_timestamp(rng);
        MovementRecord {
            device_id: choose_id(rng, self.pools.device_ids()),
            owner_id: choose_id(rng, self.pools.owner_ids()),
            timestamp,
            location: Location {
                location_id: choose_id(rng, self.pools.location_ids()),
            },
            movement_type: random_movement_type(rng),
            confidence_level: confidence_on_grid(rng, NORMAL_CONFIDENCE_MIN),
        }
    }

    /// Generates a coordinated walk of every cell member through the cell's
    /// location cycle.
    ///
    /// Each member is assigned one to three devices for this call only; at
    /// each of the five location steps every member-device emits an arrival
    /// at the current location and one at the next, so the record count is
    /// `2 x 5 x` the total number of assigned devices.
    pub fn cell_pattern(&self, rng: &mut ChaCha8Rng, cell: &CellProfile) -> Vec<MovementRecord> {
        let mut base = self.recent_timestamp(rng);

        // Ephemeral device assignment, re-sampled on every call.
        let assignments: Vec<(String, Vec<String>)> = cell
            .members()
            .iter()
            .map(|member| {
                let device_count =
                    rng.random_range(MIN_DEVICES_PER_MEMBER..=MAX_DEVICES_PER_MEMBER);
                (
                    member.clone(),
                    sample_distinct(rng, self.pools.device_ids(), device_count),
                )
            })
            .collect();

        let steps: Vec<(&String, &String)> = cell
            .locations()
            .iter()
            .zip(cell.locations().iter().cycle().skip(1))
            .take(cell.locations().len())
            .collect();

        let mut movements = Vec::new();
        for (current_location, next_location) in steps {
            for (member, devices) in &assignments {
                for device in devices {
                    movements.push(cell_step_record(
                        rng,
                        device,
                        member,
                        current_location,
                        base,
                        CELL_ARRIVAL_MINUTES,
                    ));
                    movements.push(cell_step_record(
                        rng,
                        device,
                        member,
                        next_location,
                        base,
                        CELL_DEPARTURE_MINUTES,
                    ));
                }
            }
            base += Duration::hours(CELL_STEP_HOURS);
        }
        movements
    }

    /// Generates a device hand-off sequence around a randomly chosen cell.
    ///
    /// One device (not necessarily cell-affiliated) passes between each
    /// consecutive member pair at a location from the cell's set, producing
    /// exactly two records per pair. Returns an empty list when the pools
    /// define no cells.
    pub fn transfer_pattern(&self, rng: &mut ChaCha8Rng) -> Vec<MovementRecord> {
        let Some(cell) = self.pools.cells().choose(rng) else {
            return Vec::new();
        };
        let device_id = choose_id(rng, self.pools.device_ids());
        let mut base = self.recent_timestamp(rng);

        let pairs: Vec<(&String, &String)> = cell
            .members()
            .iter()
            .zip(cell.members().iter().cycle().skip(1))
            .take(cell.members().len())
            .collect();

        let mut movements = Vec::with_capacity(2 * pairs.len());
        for (current_owner, next_owner) in pairs {
            let location_id = choose_id(rng, cell.locations());
            movements.push(MovementRecord {
                device_id: device_id.clone(),
                owner_id: current_owner.clone(),
                timestamp: base,
                location: Location {
                    location_id: location_id.clone(),
                },
                movement_type: MovementType::Walking,
                confidence_level: TRANSFER_CONFIDENCE,
            });
            movements.push(MovementRecord {
                device_id: device_id.clone(),
                owner_id: next_owner.clone(),
                timestamp: base + Duration::minutes(rng.random_range(TRANSFER_GAP_MINUTES)),
                location: Location { location_id },
                movement_type: MovementType::Walking,
                confidence_level: TRANSFER_CONFIDENCE,
            });
            base += Duration::hours(TRANSFER_STEP_HOURS);
        }
        movements
    }

    /// Assembles a complete dataset: normal movements, then cell patterns in
    /// cell order, then transfer runs, stably sorted by timestamp.
    ///
    /// The stable sort keeps insertion order for equal timestamps, so
    /// collisions are preserved rather than deduplicated.
    pub fn dataset(&self, rng: &mut ChaCha8Rng, plan: &DatasetPlan) -> Vec<MovementRecord> {
        let mut movements = Vec::new();
        for _ in 0..plan.normal_movements {
            movements.push(self.normal_movement(rng));
        }
        for cell in self.pools.cells().iter().take(plan.cell_patterns) {
            movements.extend(self.cell_pattern(rng, cell));
        }
        for _ in 0..plan.transfer_runs {
            movements.extend(self.transfer_pattern(rng));
        }
        movements.sort_by_key(|movement| movement.timestamp);
        movements
    }

    /// Picks a base timestamp a whole number of hours within the lookback
    /// window.
    fn recent_timestamp(&self, rng: &mut ChaCha8Rng) -> DateTime<Utc> {
        self.clock.utc() - Duration::hours(rng.random_range(0..=LOOKBACK_HOURS))
    }
}

/// One record of a cell walk step.
fn cell_step_record(
    rng: &mut ChaCha8Rng,
    device: &str,
    member: &str,
    location: &str,
    base: DateTime<Utc>,
    offset_minutes: RangeInclusive<i64>,
) -> MovementRecord {
    MovementRecord {
        device_id: device.to_owned(),
        owner_id: member.to_owned(),
        timestamp: base + Duration::minutes(rng.random_range(offset_minutes)),
        location: Location {
            location_id: location.to_owned(),
        },
        movement_type: random_movement_type(rng),
        confidence_level: confidence_on_grid(rng, CELL_CONFIDENCE_MIN),
    }
}

/// Chooses one identifier uniformly from a pool.
///
/// Falls back to an empty identifier on an empty slice; pool construction
/// guarantees non-empty inputs.
fn choose_id(rng: &mut ChaCha8Rng, values: &[String]) -> String {
    values.choose(rng).cloned().unwrap_or_default()
}

/// Uniform choice between walking and vehicle movement.
fn random_movement_type(rng: &mut ChaCha8Rng) -> MovementType {
    if rng.random_bool(0.5) {
        MovementType::Walking
    } else {
        MovementType::Vehicle
    }
}

/// Uniform confidence on the two-decimal grid between `min_percent` and 100.
fn confidence_on_grid(rng: &mut ChaCha8Rng, min_percent: u32) -> f64 {
    f64::from(rng.random_range(min_percent..=100)) / 100.0
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "tests fail fast on broken fixtures")]

    use std::collections::HashSet;

    use chrono::{Local, TimeZone};
    use rand::SeedableRng;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::pools::CELL_SIZE;

    /// Location steps in a cell walk; one per cell location.
    const CELL_LOCATION_STEPS: usize = 5;

    struct FixtureClock {
        now: DateTime<Utc>,
    }

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.now.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.now
        }
    }

    fn fixture_clock() -> Arc<dyn Clock> {
        Arc::new(FixtureClock {
            now: Utc.with_ymd_and_hms(2026, 8, 28, 12, 0, 0).single().expect("timestamp"),
        })
    }

    #[fixture]
    fn generator() -> MovementGenerator {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        MovementGenerator::new(IdentityPools::new(&mut rng), fixture_clock())
    }

    fn seeded_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[rstest]
    fn normal_movements_stay_within_pool_and_ranges(generator: MovementGenerator) {
        let mut rng = seeded_rng();
        let now = generator.clock.utc();

        for _ in 0..200 {
            let movement = generator.normal_movement(&mut rng);
            assert!(generator.pools().device_ids().contains(&movement.device_id));
            assert!(generator.pools().owner_ids().contains(&movement.owner_id));
            assert!(
                generator
                    .pools()
                    .location_ids()
                    .contains(&movement.location.location_id)
            );
            assert!(movement.timestamp <= now);
            assert!(movement.timestamp >= now - Duration::hours(LOOKBACK_HOURS));
            assert!((0.70..=1.0).contains(&movement.confidence_level));
        }
    }

    #[rstest]
    fn cell_pattern_count_matches_device_assignment(generator: MovementGenerator) {
        let mut rng = seeded_rng();
        let cell = generator.pools().cells().first().expect("cell").clone();

        let movements = generator.cell_pattern(&mut rng, &cell);

        let pairs: HashSet<(&str, &str)> = movements
            .iter()
            .map(|movement| (movement.owner_id.as_str(), movement.device_id.as_str()))
            .collect();
        // Each member-device pair emits two records at each of the five
        // location steps.
        assert_eq!(movements.len(), 2 * CELL_LOCATION_STEPS * pairs.len());
        assert!(pairs.len() >= cell.members().len() * MIN_DEVICES_PER_MEMBER);
        assert!(pairs.len() <= cell.members().len() * MAX_DEVICES_PER_MEMBER);
    }

    #[rstest]
    fn cell_pattern_stays_within_cell_locations(generator: MovementGenerator) {
        let mut rng = seeded_rng();
        let cell = generator.pools().cells().first().expect("cell").clone();
        let locations: HashSet<&String> = cell.locations().iter().collect();
        let members: HashSet<&String> = cell.members().iter().collect();

        for movement in generator.cell_pattern(&mut rng, &cell) {
            assert!(locations.contains(&movement.location.location_id));
            assert!(members.contains(&movement.owner_id));
            assert!((0.80..=1.0).contains(&movement.confidence_level));
        }
    }

    #[rstest]
    fn transfer_pattern_hands_one_device_around_a_cell(generator: MovementGenerator) {
        let mut rng = seeded_rng();

        let movements = generator.transfer_pattern(&mut rng);

        assert_eq!(movements.len(), 2 * CELL_SIZE);
        let first = movements.first().expect("first record");
        assert!(
            movements
                .iter()
                .all(|movement| movement.device_id == first.device_id)
        );

        let cell = generator
            .pools()
            .cells()
            .iter()
            .find(|cell| cell.members().contains(&first.owner_id))
            .expect("transfer cell")
            .clone();

        for (index, pair) in movements.chunks(2).enumerate() {
            let [given, received] = pair else {
                panic!("records must come in pairs");
            };
            assert_eq!(Some(&given.owner_id), cell.members().get(index));
            assert_eq!(
                Some(&received.owner_id),
                cell.members().get((index + 1) % cell.members().len())
            );
            assert_eq!(given.location, received.location);
            assert!(cell.locations().contains(&given.location.location_id));
            assert!(received.timestamp > given.timestamp);
            for movement in pair {
                assert_eq!(movement.movement_type, MovementType::Walking);
                assert!((movement.confidence_level - TRANSFER_CONFIDENCE).abs() < f64::EPSILON);
            }
        }
    }

    #[rstest]
    fn dataset_is_sorted_by_timestamp(generator: MovementGenerator) {
        let mut rng = seeded_rng();
        let plan = DatasetPlan {
            normal_movements: 50,
            cell_patterns: CELL_COUNT,
            transfer_runs: 3,
        };

        let movements = generator.dataset(&mut rng, &plan);

        assert!(movements.len() > 50);
        for window in movements.windows(2) {
            let [earlier, later] = window else {
                panic!("windows(2) yields pairs");
            };
            assert!(earlier.timestamp <= later.timestamp);
        }
    }

    #[rstest]
    fn normals_only_plan_yields_exactly_that_many(generator: MovementGenerator) {
        let mut rng = seeded_rng();
        let plan = DatasetPlan {
            normal_movements: 5,
            cell_patterns: 0,
            transfer_runs: 0,
        };

        let movements = generator.dataset(&mut rng, &plan);

        assert_eq!(movements.len(), 5);
        for window in movements.windows(2) {
            let [earlier, later] = window else {
                panic!("windows(2) yields pairs");
            };
            assert!(earlier.timestamp <= later.timestamp);
        }
    }

    #[test]
    fn same_seed_and_clock_reproduce_the_dataset() {
        let plan = DatasetPlan {
            normal_movements: 20,
            cell_patterns: 2,
            transfer_runs: 2,
        };

        let datasets: Vec<Vec<MovementRecord>> = (0..2)
            .map(|_| {
                let mut rng = ChaCha8Rng::seed_from_u64(42);
                let generator =
                    MovementGenerator::new(IdentityPools::new(&mut rng), fixture_clock());
                generator.dataset(&mut rng, &plan)
            })
            .collect();

        assert_eq!(datasets.first(), datasets.last());
    }

    #[test]
    fn confidence_on_grid_respects_lower_bound() {
        let mut rng = seeded_rng();
        for _ in 0..100 {
            let value = confidence_on_grid(&mut rng, 80);
            assert!((0.80..=1.0).contains(&value));
            let scaled = value * 100.0;
            assert!((scaled - scaled.round()).abs() < 1e-9, "value must sit on the grid");
        }
    }
}
