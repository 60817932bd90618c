//! Controller layer: folds orientation samples into a bounded rotation and
//! publishes it over a managed socket session. Async stays at the edges.

use std::sync::Arc;

use shared::domain::{Channel, OrientationSample, StatusTone};
use shared::protocol::{StatusKind, WheelMessage};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

pub mod clock;
pub mod connection;
pub mod error;
pub mod rotation;
pub mod sensor;
pub mod throttle;
pub mod transport;

use crate::clock::Clock;
use crate::connection::{ConnectionMachine, LinkPhase};
use crate::error::SocketError;
use crate::rotation::{format_readout, RotationTracker};
use crate::sensor::SensorAccess;
use crate::throttle::{PublishThrottle, PUBLISH_INTERVAL};
use crate::transport::{SessionEvent, SessionId, SocketEvent, SocketHandle, Transport};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

const STATUS_DISCONNECTED: &str = "Disconnected";
const STATUS_CONNECTING: &str = "Connecting…";
const STATUS_CONNECTED: &str = "Connected";
const STATUS_PAUSED: &str = "Paused";
const STATUS_ERROR: &str = "Error";

const SENSOR_IDLE: &str = "Enable Gyroscope";
const SENSOR_ACTIVE: &str = "Gyroscope Active";
const SENSOR_DENIED: &str = "Permission Needed";
const SENSOR_UNSUPPORTED: &str = "Unsupported";

const PAUSE_LABEL: &str = "Pause";
const RESUME_LABEL: &str = "Resume";

/// The URL is read when a connect starts; the channel is read live as each
/// message is built, so changing it applies without a reconnect.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    url: String,
    channel: Channel,
}

impl SocketConfig {
    pub fn new(url: &str, channel: &str) -> Self {
        Self {
            url: url.trim().to_string(),
            channel: Channel::parse(channel),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            channel: Channel::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    Rotation { degrees: f64, readout: String },
    Status {
        label: &'static str,
        tone: StatusTone,
    },
    /// Empty text clears the inline error line.
    SocketNotice { text: String },
    PauseControl {
        label: &'static str,
        enabled: bool,
    },
    SensorControl {
        label: &'static str,
        enabled: bool,
    },
}

pub struct WheelController {
    config: SocketConfig,
    tracker: RotationTracker,
    throttle: PublishThrottle,
    machine: ConnectionMachine,
    paused: bool,
    sensor_active: bool,
    sensor_label: &'static str,
    sensor_enabled: bool,
    session: Option<SessionId>,
    handle: Option<Box<dyn SocketHandle>>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<ControllerEvent>,
    socket_events: mpsc::UnboundedSender<SessionEvent>,
}

impl WheelController {
    /// The caller's event loop drains the receiver half of `socket_events`
    /// back into [`Self::handle_socket_event`].
    pub fn new(
        config: SocketConfig,
        span_deg: f64,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        socket_events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            tracker: RotationTracker::new(span_deg),
            throttle: PublishThrottle::new(PUBLISH_INTERVAL),
            machine: ConnectionMachine::new(),
            paused: false,
            sensor_active: false,
            sensor_label: SENSOR_IDLE,
            sensor_enabled: true,
            session: None,
            handle: None,
            transport,
            clock,
            events,
            socket_events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> LinkPhase {
        self.machine.phase()
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn rotation(&self) -> f64 {
        self.tracker.rotation()
    }

    pub fn sensor_active(&self) -> bool {
        self.sensor_active
    }

    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    /// Call once after subscribing so a fresh surface starts in sync.
    pub fn emit_snapshot(&self) {
        self.emit_rotation();
        self.emit_status();
        self.emit_notice(String::new());
        self.emit_pause_control();
        self.send_event(ControllerEvent::SensorControl {
            label: self.sensor_label,
            enabled: self.sensor_enabled,
        });
    }

    pub fn set_socket_config(&mut self, url: &str, channel: &str) {
        self.config = SocketConfig::new(url, channel);
        self.emit_notice(String::new());
    }

    pub fn connect(&mut self) {
        if self.config.url.is_empty() {
            self.emit_notice(SocketError::MissingUrl.to_string());
            return;
        }
        self.teardown_session();
        self.emit_notice(String::new());
        self.machine.begin_connect();
        self.emit_status();
        self.emit_pause_control();

        let session = SessionId::new();
        info!(url = %self.config.url, session = %session, "wheel: connecting");
        match self
            .transport
            .open(&self.config.url, session, self.socket_events.clone())
        {
            Ok(handle) => {
                self.session = Some(session);
                self.handle = Some(handle);
            }
            Err(err) => {
                warn!(error = %err, "wheel: transport construction failed");
                self.machine.construction_failed();
                self.emit_notice(SocketError::Construction(err.to_string()).to_string());
                self.emit_status();
            }
        }
    }

    pub fn disconnect(&mut self) {
        info!("wheel: disconnect");
        self.teardown_session();
        self.machine.reset();
        self.emit_status();
        self.emit_notice(String::new());
        self.emit_pause_control();
    }

    /// Best-effort close for process exit; no display traffic.
    pub fn shutdown(&mut self) {
        self.teardown_session();
        self.machine.reset();
    }

    /// The paused flag is independent of the link; it survives reconnects
    /// and only masks publishing while Connected.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        match self.machine.phase() {
            LinkPhase::Connected => {
                self.emit_status();
                let kind = if self.paused {
                    StatusKind::Paused
                } else {
                    StatusKind::Resumed
                };
                self.send_status(kind);
            }
            // Mid-dial the flag is merely stored; it applies at open.
            LinkPhase::Connecting => {}
            // No live connection: nothing to mask, and a leftover Error
            // display reads Disconnected again.
            LinkPhase::Disconnected | LinkPhase::Error => {
                self.machine.reset();
                self.emit_status();
            }
        }
        self.emit_pause_control();
    }

    pub fn recenter(&mut self) {
        self.tracker.recenter();
        self.emit_rotation();
        self.throttle.reset();
        self.maybe_publish();
    }

    pub fn set_span(&mut self, span_deg: f64) {
        if !self.tracker.set_span(span_deg) {
            debug!(span = span_deg, "wheel: ignoring non-finite span");
            return;
        }
        self.emit_rotation();
        self.maybe_publish();
    }

    pub fn handle_sample(&mut self, sample: OrientationSample) {
        if !sample.absolute && sample.alpha.is_none() {
            return;
        }
        let raw = sample.alpha.unwrap_or(0.0);
        self.tracker.observe(raw);
        self.emit_rotation();
        self.maybe_publish();
    }

    pub fn handle_sensor_access(&mut self, outcome: SensorAccess) {
        match outcome {
            SensorAccess::Granted => {
                info!("wheel: sensor access granted");
                self.sensor_active = true;
                // Re-anchor on the next sample.
                self.tracker.clear_reference();
                self.set_sensor_control(SENSOR_ACTIVE, false);
            }
            SensorAccess::Denied => {
                warn!("wheel: sensor permission denied");
                self.set_sensor_control(SENSOR_DENIED, true);
            }
            SensorAccess::Unsupported => {
                warn!("wheel: orientation sensor unsupported");
                self.set_sensor_control(SENSOR_UNSUPPORTED, false);
            }
        }
    }

    /// Events from superseded sessions are dropped.
    pub fn handle_socket_event(&mut self, event: SessionEvent) {
        if self.session != Some(event.session) {
            debug!(session = %event.session, "wheel: ignoring event from stale session");
            return;
        }
        match event.event {
            SocketEvent::Opened => self.on_opened(),
            SocketEvent::Errored(detail) => self.on_errored(detail),
            SocketEvent::Closed => self.on_closed(),
        }
    }

    fn on_opened(&mut self) {
        info!("wheel: socket open");
        self.machine.opened();
        self.emit_status();
        self.emit_pause_control();
        self.send_status(StatusKind::Connected);
        // The first rotation frame goes out immediately on a fresh link.
        self.throttle.reset();
        self.maybe_publish();
    }

    fn on_errored(&mut self, detail: String) {
        warn!(detail = %detail, "wheel: socket error");
        self.machine.errored();
        self.emit_notice(SocketError::Runtime.to_string());
        self.emit_status();
        self.emit_pause_control();
        // Ask the session to wind down; harmless if it already has.
        if let Some(handle) = &self.handle {
            handle.close();
        }
    }

    fn on_closed(&mut self) {
        info!("wheel: socket closed");
        self.session = None;
        self.handle = None;
        if self.machine.closed() {
            self.emit_status();
        }
        self.emit_pause_control();
    }

    fn teardown_session(&mut self) {
        self.session = None;
        if let Some(handle) = self.handle.take() {
            debug!(session = %handle.session(), "wheel: closing socket session");
            handle.close();
        }
    }

    fn maybe_publish(&mut self) {
        if self.paused || self.machine.phase() != LinkPhase::Connected {
            return;
        }
        if !self.throttle.try_acquire(self.clock.elapsed()) {
            return;
        }
        let message = WheelMessage::rotation(
            self.clock.now_utc(),
            self.config.channel.clone(),
            self.tracker.rotation(),
        );
        self.send_message(&message);
    }

    // Status frames bypass the throttle.
    fn send_status(&mut self, status: StatusKind) {
        let message =
            WheelMessage::status(self.clock.now_utc(), self.config.channel.clone(), status);
        self.send_message(&message);
    }

    fn send_message(&mut self, message: &WheelMessage) {
        let Some(handle) = &self.handle else {
            return;
        };
        match serde_json::to_string(message) {
            Ok(text) => handle.send(text),
            Err(err) => warn!(error = %err, "wheel: failed to encode message"),
        }
    }

    fn current_status(&self) -> (&'static str, StatusTone) {
        match self.machine.phase() {
            LinkPhase::Disconnected => (STATUS_DISCONNECTED, StatusTone::Default),
            LinkPhase::Connecting => (STATUS_CONNECTING, StatusTone::Connecting),
            LinkPhase::Connected if self.paused => (STATUS_PAUSED, StatusTone::Paused),
            LinkPhase::Connected => (STATUS_CONNECTED, StatusTone::Connected),
            LinkPhase::Error => (STATUS_ERROR, StatusTone::Error),
        }
    }

    fn set_sensor_control(&mut self, label: &'static str, enabled: bool) {
        self.sensor_label = label;
        self.sensor_enabled = enabled;
        self.send_event(ControllerEvent::SensorControl { label, enabled });
    }

    fn emit_rotation(&self) {
        let degrees = self.tracker.rotation();
        self.send_event(ControllerEvent::Rotation {
            degrees,
            readout: format_readout(degrees),
        });
    }

    fn emit_status(&self) {
        let (label, tone) = self.current_status();
        self.send_event(ControllerEvent::Status { label, tone });
    }

    fn emit_notice(&self, text: String) {
        self.send_event(ControllerEvent::SocketNotice { text });
    }

    fn emit_pause_control(&self) {
        self.send_event(ControllerEvent::PauseControl {
            label: if self.paused { RESUME_LABEL } else { PAUSE_LABEL },
            enabled: self.machine.phase() == LinkPhase::Connected,
        });
    }

    fn send_event(&self, event: ControllerEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
