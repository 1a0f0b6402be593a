//! Synthetic movement-record datasets for exercising a movement ingestion
//! API.
//!
//! The crate builds deterministic datasets from a seeded random number
//! generator: routine movements across the whole identity pool, coordinated
//! cell patterns where small owner groups cycle through shared locations,
//! and device transfer runs where one device hops between owners. A
//! sequential replay client can then POST the dataset to an HTTP endpoint
//! and collect per-record results.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use mockable::DefaultClock;
//! use movement_data::{DatasetPlan, IdentityPools, MovementGenerator};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let pools = IdentityPools::new(&mut rng);
//! let generator = MovementGenerator::new(pools, Arc::new(DefaultClock));
//!
//! let plan = DatasetPlan {
//!     normal_movements: 10,
//!     cell_patterns: 1,
//!     transfer_runs: 1,
//! };
//! let movements = generator.dataset(&mut rng, &plan);
//!
//! assert!(movements.len() > 10);
//! assert!(movements.is_sorted_by_key(|movement| movement.timestamp));
//! ```

mod error;
mod generator;
mod http;
mod output;
mod pools;
mod record;
mod replay;
pub mod testgen_cli;

pub use error::{OutputError, TransportError};
pub use generator::{DatasetPlan, MovementGenerator};
pub use http::HttpMovementTransport;
pub use output::write_pretty_json;
pub use pools::{
    CELL_COUNT, CELL_LOCATION_COUNT, CELL_SIZE, CellProfile, DEVICE_POOL_SIZE, IdentityPools,
    LOCATION_POOL_SIZE, OWNER_POOL_SIZE,
};
pub use record::{Location, MovementRecord, MovementType};
pub use replay::{
    DEFAULT_REQUEST_DELAY, MovementTransport, ReplayClient, ReplayRecord, ReplaySleeper,
    ReplayStatus, ThreadSleeper, TransportReply,
};
