//! Movement record types.
//!
//! This module defines the wire schema submitted to the movement-tracking
//! API. Records are plain data: once constructed they are never mutated, and
//! dataset ordering is always by timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a movement was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Movement on foot.
    Walking,
    /// Movement by vehicle.
    Vehicle,
}

/// Location reference nested inside a movement record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Identifier drawn from the location pool.
    pub location_id: String,
}

/// One timestamped device/owner/location observation.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use movement_data::{Location, MovementRecord, MovementType};
///
/// let record = MovementRecord {
///     device_id: "D00007".to_owned(),
///     owner_id: "O00003".to_owned(),
///     timestamp: Utc::now(),
///     location: Location {
///         location_id: "L00011".to_owned(),
///     },
///     movement_type: MovementType::Walking,
///     confidence_level: 0.85,
/// };
///
/// let json = serde_json::to_string(&record).expect("serialize");
/// assert!(json.contains("\"movement_type\":\"walking\""));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    /// Identifier drawn from the device pool.
    pub device_id: String,
    /// Identifier drawn from the owner pool.
    pub owner_id: String,
    /// Observation time, serialized as RFC 3339.
    pub timestamp: DateTime<Utc>,
    /// Where the device was observed.
    pub location: Location,
    /// How the movement was made.
    pub movement_type: MovementType,
    /// Confidence in the observation, between 0.0 and 1.0 at two-decimal
    /// precision.
    pub confidence_level: f64,
}
