//! MQTT transport
//!
//! Thin adapter over `rumqttc`: connection handling, reconnects and
//! acknowledgements stay with the client library. The event loop is polled
//! on its own task; inbound publishes are handed to a single dispatch loop
//! so messages are still processed one at a time.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Packet, Publish, QoS};
use tokio::sync::mpsc;
use topic_router::RouteResolver;
use tracing::{debug, error, info};

use crate::clock::{Clock, SystemClock};
use crate::config::MqttSettings;
use crate::dispatch::Dispatcher;
use crate::error::PublishError;
use crate::publisher::Publisher;

/// Pause after an event loop error before polling again
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Publishes through an MQTT client at QoS 1 with the retain flag set
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

impl Publisher for MqttPublisher {
    /// Waits for room in the request channel, never for the broker's ack
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, true, payload)
            .await
            .map_err(|e| PublishError::Rejected {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Subscribes to the sensor bus and feeds every message to a [`Dispatcher`]
pub struct MqttBridge<C = SystemClock> {
    settings: MqttSettings,
    client: AsyncClient,
    eventloop: EventLoop,
    dispatcher: Dispatcher<MqttPublisher, C>,
}

impl MqttBridge<SystemClock> {
    pub fn new(settings: MqttSettings, resolver: RouteResolver) -> Self {
        Self::with_clock(settings, resolver, SystemClock)
    }
}

impl<C: Clock> MqttBridge<C> {
    pub fn with_clock(settings: MqttSettings, resolver: RouteResolver, clock: C) -> Self {
        let (client, eventloop) =
            AsyncClient::new(settings.mqtt_options(), settings.channel_capacity);
        let publisher = MqttPublisher::new(client.clone());

        Self {
            settings,
            client,
            eventloop,
            dispatcher: Dispatcher::with_clock(resolver, publisher, clock),
        }
    }

    /// Run until the event loop task ends
    pub async fn run(self) {
        let Self {
            settings,
            client,
            eventloop,
            dispatcher,
        } = self;

        info!(
            "Connecting to MQTT broker {}:{} as {}",
            settings.host, settings.port, settings.client_id
        );

        // Unbounded: the poller must never wait on the dispatcher, which
        // itself waits on the poller to drain outbound publishes
        let (incoming_tx, mut incoming_rx) = mpsc::unbounded_channel();
        tokio::spawn(poll_events(
            eventloop,
            client,
            settings.subscriptions,
            incoming_tx,
        ));

        while let Some(publish) = incoming_rx.recv().await {
            dispatcher.dispatch(&publish.topic, &publish.payload).await;
        }
    }
}

async fn poll_events(
    mut eventloop: EventLoop,
    client: AsyncClient,
    subscriptions: Vec<String>,
    incoming: mpsc::UnboundedSender<Publish>,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                info!("Connected to MQTT broker: {:?}", ack.code);
                subscribe(client.clone(), subscriptions.clone());
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if incoming.send(publish).is_err() {
                    debug!("Dispatch loop stopped, leaving MQTT event loop");
                    return;
                }
            }
            Ok(Event::Incoming(Packet::SubAck(ack))) => {
                debug!("Subscription acknowledged: {:?}", ack.return_codes);
            }
            Ok(_) => {}
            Err(e) => {
                error!("MQTT error: {}", e);
                tokio::time::sleep(ERROR_BACKOFF).await;
            }
        }
    }
}

// Runs on every ConnAck: clean sessions start with no subscriptions.
// Spawned because the request it enqueues is drained by the poller itself.
fn subscribe(client: AsyncClient, filters: Vec<String>) {
    tokio::spawn(async move {
        for filter in filters {
            match client.subscribe(filter.as_str(), QoS::AtLeastOnce).await {
                Ok(()) => info!("Subscribing to {}", filter),
                Err(e) => error!("Failed to subscribe to {}: {}", filter, e),
            }
        }
    });
}
