//! Replay flow checks against the public crate API.

#![expect(clippy::expect_used, reason = "tests fail fast on broken fixtures")]

use std::cell::RefCell;
use std::time::Duration;

use chrono::Utc;
use movement_data::{
    Location, MovementRecord, MovementTransport, MovementType, ReplayClient, ReplaySleeper,
    ReplayStatus, TransportError, TransportReply,
};
use serde_json::json;

fn movement(device: &str) -> MovementRecord {
    MovementRecord {
        device_id: device.to_owned(),
        owner_id: "O00001".to_owned(),
        timestamp: Utc::now(),
        location: Location {
            location_id: "L00002".to_owned(),
        },
        movement_type: MovementType::Vehicle,
        confidence_level: 0.85,
    }
}

/// Transport that fails every other submission.
struct FlakyTransport {
    calls: RefCell<usize>,
}

impl MovementTransport for FlakyTransport {
    fn submit(&self, _movement: &MovementRecord) -> Result<TransportReply, TransportError> {
        let mut calls = self.calls.borrow_mut();
        *calls += 1;
        if calls.is_multiple_of(2) {
            Err(TransportError::Transport {
                message: "connection reset".to_owned(),
            })
        } else {
            Ok(TransportReply {
                status: 201,
                body: json!({"status": "created"}),
            })
        }
    }
}

struct ImmediateSleeper;

impl ReplaySleeper for ImmediateSleeper {
    fn sleep(&self, _duration: Duration) {}
}

#[test]
fn replay_results_serialize_in_submission_order() {
    let client = ReplayClient::with_sleeper(
        Box::new(FlakyTransport {
            calls: RefCell::new(0),
        }),
        Box::new(ImmediateSleeper),
        Duration::ZERO,
    );
    let movements = vec![movement("D00000"), movement("D00001"), movement("D00002")];
    let mut sink = Vec::new();

    let results = client.replay(&movements, &mut sink);

    assert_eq!(results.len(), 3);
    assert_eq!(
        results
            .iter()
            .map(|result| result.movement.device_id.as_str())
            .collect::<Vec<_>>(),
        vec!["D00000", "D00001", "D00002"]
    );
    assert_eq!(
        results
            .iter()
            .map(|result| result.status)
            .collect::<Vec<_>>(),
        vec![
            ReplayStatus::Code(201),
            ReplayStatus::Error,
            ReplayStatus::Code(201)
        ]
    );

    let json = serde_json::to_value(&results).expect("serialize results");
    let entries = json.as_array().expect("results array");
    assert_eq!(entries.len(), 3);

    let success = entries.first().expect("first entry");
    assert_eq!(success.get("status"), Some(&json!(201)));
    assert!(success.get("response").is_some());
    assert!(success.get("error").is_none());

    let failure = entries.get(1).expect("second entry");
    assert_eq!(failure.get("status"), Some(&json!("error")));
    assert!(failure.get("response").is_none());
    assert_eq!(
        failure.get("error"),
        Some(&json!("transport failure: connection reset"))
    );
}
