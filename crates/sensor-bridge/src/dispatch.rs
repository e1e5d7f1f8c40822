//! Per-message dispatch
//!
//! Classify topic -> parse -> decode -> encode -> route -> publish. Every
//! failure is logged and reported as an outcome; nothing here panics or
//! stops the delivery loop.

use can_frame::{CanFrame, DecodedSignal, OutboundResult};
use topic_router::{DropReason, Route, RouteResolver, TopicClass};
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::DispatchError;
use crate::publisher::Publisher;

/// Result of dispatching one inbound message
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Decoded result published
    Published { topic: String },
    /// Raw payload republished unchanged
    Redirected { topic: String },
    /// Nothing published
    Dropped(DropReason),
    /// Decode, encode or publish failed
    Failed(DispatchError),
}

/// Routes inbound bus messages to their outbound topics
pub struct Dispatcher<P, C = SystemClock> {
    resolver: RouteResolver,
    publisher: P,
    clock: C,
}

impl<P: Publisher> Dispatcher<P, SystemClock> {
    /// Create a dispatcher stamping results with the system time
    pub fn new(resolver: RouteResolver, publisher: P) -> Self {
        Self::with_clock(resolver, publisher, SystemClock)
    }
}

impl<P: Publisher, C: Clock> Dispatcher<P, C> {
    pub fn with_clock(resolver: RouteResolver, publisher: P, clock: C) -> Self {
        Self {
            resolver,
            publisher,
            clock,
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Process one message received on `topic`
    pub async fn dispatch(&self, topic: &str, payload: &[u8]) -> DispatchOutcome {
        debug!("Received on {}: {}", topic, String::from_utf8_lossy(payload));

        let class = TopicClass::classify(topic);
        let frame = match class.payload_shape() {
            Some(shape) => match CanFrame::parse(payload, shape) {
                Ok(frame) => {
                    debug!(
                        "Arbitration ID: 0x{:X}, data bytes: {:?}",
                        frame.arbitration_id, frame.data
                    );
                    Some(frame)
                }
                Err(e) => {
                    warn!("Dropping message on {}: {}", topic, e);
                    return DispatchOutcome::Failed(e.into());
                }
            },
            None => None,
        };

        match self.resolver.resolve_class(class, frame.as_ref()) {
            Route::Forward(destination) => match frame {
                Some(frame) => self.forward(&frame, destination).await,
                None => self.drop_message(topic, DropReason::MissingFrame),
            },
            Route::Redirect(destination) => self.redirect(topic, payload, destination).await,
            Route::Drop(reason) => self.drop_message(topic, reason),
        }
    }

    async fn forward(&self, frame: &CanFrame, destination: String) -> DispatchOutcome {
        let signal = DecodedSignal::from_frame(frame);
        let result = OutboundResult::encode(frame, &signal, self.clock.now());

        let body = match result.to_json() {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to encode result for {}: {}", destination, e);
                return DispatchOutcome::Failed(e.into());
            }
        };

        if let Err(e) = self.publisher.publish(&destination, body).await {
            error!("{}", e);
            return DispatchOutcome::Failed(e.into());
        }

        info!("Message forwarded to {}", destination);
        DispatchOutcome::Published { topic: destination }
    }

    async fn redirect(&self, topic: &str, payload: &[u8], destination: String) -> DispatchOutcome {
        if let Err(e) = self.publisher.publish(&destination, payload.to_vec()).await {
            error!("{}", e);
            return DispatchOutcome::Failed(e.into());
        }

        info!("Simulation topic {} redirected to {}", topic, destination);
        DispatchOutcome::Redirected { topic: destination }
    }

    fn drop_message(&self, topic: &str, reason: DropReason) -> DispatchOutcome {
        warn!("Dropping message on {}: {}", topic, reason);
        DispatchOutcome::Dropped(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::PublishError;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Records every publish; optionally refuses them all
    #[derive(Default)]
    struct RecordingPublisher {
        sent: Mutex<Vec<(String, Vec<u8>)>>,
        refuse: bool,
    }

    impl RecordingPublisher {
        fn sent(&self) -> Vec<(String, Vec<u8>)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Publisher for RecordingPublisher {
        async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
            if self.refuse {
                return Err(PublishError::Rejected {
                    topic: topic.to_string(),
                    reason: "event loop stopped".to_string(),
                });
            }
            self.sent.lock().unwrap().push((topic.to_string(), payload));
            Ok(())
        }
    }

    fn dispatcher() -> Dispatcher<RecordingPublisher, FixedClock> {
        let now = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        Dispatcher::with_clock(
            RouteResolver::default(),
            RecordingPublisher::default(),
            FixedClock(now),
        )
    }

    #[tokio::test]
    async fn test_production_frame_end_to_end() {
        let dispatcher = dispatcher();
        let payload = br#"{"AlgorithmID":"BlindSpotDetection","CAN_Message":{"ArbitrationId":256,"Data":[1,50,2,1]}}"#;

        let outcome = dispatcher.dispatch("can/messages", payload).await;
        assert!(matches!(outcome, DispatchOutcome::Published { ref topic } if topic == "sensor/sensordetector"));

        let sent = dispatcher.publisher().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "sensor/sensordetector");

        let body: Value = serde_json::from_slice(&sent[0].1).unwrap();
        assert_eq!(
            body,
            json!({
                "AlgorithmID": "BlindSpotDetection",
                "Timestamp": "2025-01-31T12:00:00Z",
                "Status": true,
                "Data": {"Side": "Direita", "DistanceToVehicle": 5.62}
            })
        );
    }

    #[tokio::test]
    async fn test_simulation_frame_end_to_end() {
        let dispatcher = dispatcher();
        let payload = br#"{"algorithm_id":"Pedestrian","can_message":{"arbitration_id":257,"data":[0,10,0]}}"#;

        let outcome = dispatcher.dispatch("sim/canmessages", payload).await;
        assert!(matches!(outcome, DispatchOutcome::Published { ref topic } if topic == "simsensor/pedestrian"));

        let sent = dispatcher.publisher().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "simsensor/pedestrian");

        let body: Value = serde_json::from_slice(&sent[0].1).unwrap();
        assert_eq!(body["Status"], json!(false));
        assert_eq!(body["Data"], json!({"DistanceToVehicle": 0.1}));
    }

    #[tokio::test]
    async fn test_unmapped_arbitration_id_dropped() {
        let dispatcher = dispatcher();
        let payload = br#"{"algorithm_id":"Pedestrian","can_message":{"arbitration_id":2457,"data":[1]}}"#;

        let outcome = dispatcher.dispatch("sim/canmessages", payload).await;
        assert!(matches!(
            outcome,
            DispatchOutcome::Dropped(DropReason::UnmappedArbitrationId(0x999))
        ));
        assert!(dispatcher.publisher().sent().is_empty());
    }

    #[tokio::test]
    async fn test_simulation_topic_redirected_verbatim() {
        let dispatcher = dispatcher();
        let payload: &[u8] = b"\xff not json {";

        let outcome = dispatcher.dispatch("sim/foo/bar", payload).await;
        assert!(matches!(outcome, DispatchOutcome::Redirected { ref topic } if topic == "moto/foo/bar"));

        let sent = dispatcher.publisher().sent();
        assert_eq!(sent, vec![("moto/foo/bar".to_string(), payload.to_vec())]);
    }

    #[tokio::test]
    async fn test_unrecognized_topic_dropped() {
        let dispatcher = dispatcher();
        let outcome = dispatcher.dispatch("other/topic", b"{}").await;
        assert!(matches!(outcome, DispatchOutcome::Dropped(DropReason::UnrecognizedTopic)));
        assert!(dispatcher.publisher().sent().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_does_not_stop_dispatch() {
        let dispatcher = dispatcher();

        let outcome = dispatcher.dispatch("can/messages", b"{\"AlgorithmID\":").await;
        assert!(matches!(outcome, DispatchOutcome::Failed(DispatchError::Decode(_))));
        assert!(dispatcher.publisher().sent().is_empty());

        // The next message is processed normally
        let payload = br#"{"AlgorithmID":"FrontalCollision","CAN_Message":{"ArbitrationId":258,"Data":[1,0,1]}}"#;
        let outcome = dispatcher.dispatch("can/messages", payload).await;
        assert!(matches!(outcome, DispatchOutcome::Published { .. }));
        assert_eq!(dispatcher.publisher().sent().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_fields_still_published() {
        let dispatcher = dispatcher();
        let outcome = dispatcher.dispatch("can/messages", b"{}").await;
        assert!(matches!(outcome, DispatchOutcome::Published { .. }));

        let sent = dispatcher.publisher().sent();
        let body: Value = serde_json::from_slice(&sent[0].1).unwrap();
        assert_eq!(body["AlgorithmID"], json!("Unknown"));
        assert_eq!(body["Status"], json!(false));
        assert_eq!(body["Data"], json!({"DistanceToVehicle": 0.0}));
    }

    #[tokio::test]
    async fn test_publish_failure_reported() {
        let now = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        let publisher = RecordingPublisher {
            refuse: true,
            ..Default::default()
        };
        let dispatcher = Dispatcher::with_clock(RouteResolver::default(), publisher, FixedClock(now));

        let outcome = dispatcher.dispatch("sim/speed", b"42").await;
        assert!(matches!(outcome, DispatchOutcome::Failed(DispatchError::Publish(_))));
    }

    #[test]
    fn test_encode_failure_is_not_a_decode_failure() {
        // Non-string map keys cannot be written as JSON
        let mut unencodable = std::collections::HashMap::new();
        unencodable.insert(vec![1u8], 1);

        let err: DispatchError = serde_json::to_vec(&unencodable).unwrap_err().into();
        assert!(matches!(err, DispatchError::Encode(_)));
        assert!(err.to_string().starts_with("Result encode failed"));
    }
}
