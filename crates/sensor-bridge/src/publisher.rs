//! Outbound publish capability

use std::future::Future;

use crate::error::PublishError;

/// Sink for outbound bus messages
///
/// Implementations deliver at-least-once and retain the last message per
/// topic. The returned future resolves once the transport has accepted the
/// message (waiting for queue space if needed), not when the broker
/// acknowledges it.
pub trait Publisher: Send + Sync {
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;
}
