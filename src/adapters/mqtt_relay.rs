//! MQTT relay adapter.
//!
//! Publishes events to `linkedbench/<bench_id>/events` (QoS 1) and health
//! snapshots to `linkedbench/<bench_id>/status` (QoS 0), JSON encoded.
//!
//! The blocking `rumqttc` client is driven by a background thread that
//! iterates the connection and tracks connect/disconnect in an atomic
//! flag.  Publishing uses `try_publish`, so a slow or absent broker can
//! never stall the drain task; while disconnected, publishes fail fast
//! with [`RelayError::NotConnected`].

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};

use crate::app::events::BenchEvent;
use crate::app::ports::{EventRelay, EventSink, RelayError, SinkError};
use crate::config::MqttConfig;
use crate::diagnostics::HealthSnapshot;
use crate::drivers::task::{DEFAULT_STACK_KB, spawn_named};

/// Outgoing request buffer of the client.
const REQUEST_CAPACITY: usize = 64;
/// Pause between reconnect attempts.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub fn events_topic(bench_id: &str) -> String {
    format!("linkedbench/{bench_id}/events")
}

pub fn status_topic(bench_id: &str) -> String {
    format!("linkedbench/{bench_id}/status")
}

pub struct MqttRelay {
    client: Client,
    connected: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    events_topic: String,
    status_topic: String,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MqttRelay {
    /// Create the client and start the connection thread.
    ///
    /// Returns immediately; the broker connection is established in the
    /// background.
    pub fn connect(config: &MqttConfig, bench_id: &str) -> std::io::Result<Self> {
        let mut options = MqttOptions::new(
            config.client_id_for(bench_id),
            config.host.clone(),
            config.port,
        );
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));

        let (client, connection) = Client::new(options, REQUEST_CAPACITY);
        let connected = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));

        info!("Connecting to MQTT broker {}:{}", config.host, config.port);
        let worker = {
            let connected = Arc::clone(&connected);
            let running = Arc::clone(&running);
            spawn_named("mqtt-conn", DEFAULT_STACK_KB, move || {
                drive_connection(connection, &connected, &running);
            })?
        };

        Ok(Self {
            client,
            connected,
            running,
            events_topic: events_topic(bench_id),
            status_topic: status_topic(bench_id),
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Disconnect and join the connection thread.
    pub fn close(&self) {
        self.running.store(false, Ordering::Release);
        if let Err(e) = self.client.disconnect() {
            debug!("MQTT disconnect request failed: {}", e);
        }
        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                error!("MQTT connection thread panicked");
            }
        }
        self.connected.store(false, Ordering::Release);
        info!("Disconnected from MQTT broker");
    }

    fn send(&self, topic: &str, qos: QoS, payload: String) -> Result<(), RelayError> {
        if !self.is_connected() {
            return Err(RelayError::NotConnected);
        }
        self.client
            .try_publish(topic, qos, false, payload.into_bytes())
            .map_err(|e| RelayError::Publish(e.to_string()))
    }
}

impl Drop for MqttRelay {
    fn drop(&mut self) {
        if self.running.load(Ordering::Acquire) {
            self.close();
        }
    }
}

fn drive_connection(mut connection: Connection, connected: &AtomicBool, running: &AtomicBool) {
    for notification in connection.iter() {
        match notification {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                connected.store(true, Ordering::Release);
                info!("Connected to MQTT broker");
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                connected.store(false, Ordering::Release);
                warn!("Broker closed the MQTT session");
            }
            Ok(_) => {}
            Err(e) => {
                connected.store(false, Ordering::Release);
                if !running.load(Ordering::Acquire) {
                    break;
                }
                warn!("MQTT connection error: {}", e);
                pause_unless_stopped(running, RECONNECT_DELAY);
            }
        }
        if !running.load(Ordering::Acquire) {
            break;
        }
    }
    debug!("MQTT connection thread exiting");
}

fn pause_unless_stopped(running: &AtomicBool, total: Duration) {
    const STEP: Duration = Duration::from_millis(100);
    let mut waited = Duration::ZERO;
    while waited < total && running.load(Ordering::Acquire) {
        std::thread::sleep(STEP);
        waited += STEP;
    }
}

impl EventRelay for MqttRelay {
    fn publish(&self, event: &BenchEvent) -> Result<(), RelayError> {
        let payload = event.to_json().map_err(RelayError::Serialize)?;
        self.send(&self.events_topic, QoS::AtLeastOnce, payload)?;
        debug!("Published event to {}", self.events_topic);
        Ok(())
    }

    fn publish_status(&self, snapshot: &HealthSnapshot) -> Result<(), RelayError> {
        let payload = serde_json::to_string(snapshot).map_err(RelayError::Serialize)?;
        self.send(&self.status_topic, QoS::AtMostOnce, payload)
    }
}

/// Drain-side adapter forwarding every event to an [`EventRelay`].
pub struct RelaySink<R: ?Sized> {
    relay: Arc<R>,
}

impl<R: EventRelay + ?Sized> RelaySink<R> {
    pub fn new(relay: Arc<R>) -> Self {
        Self { relay }
    }
}

impl<R: EventRelay + ?Sized> EventSink for RelaySink<R> {
    fn name(&self) -> &'static str {
        "relay"
    }

    fn emit(&mut self, event: &BenchEvent) -> Result<(), SinkError> {
        self.relay.publish(event)?;
        Ok(())
    }
}
