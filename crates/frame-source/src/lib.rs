//! LeapMove Frame Source
//!
//! Bridges an event-driven hand-tracking sensor to a pull model. A sensor
//! driver delivers events from its own threads into a bounded listener
//! buffer; the scheduler drains that buffer once per tick with
//! [`FrameSource::poll`], which never waits for future events.
//!
//! Drivers are pluggable:
//!
//! - **Simulated:** a synthetic hand orbiting inside the tracking volume
//! - **Stub:** scripted events for tests and recorded-frame playback

pub mod backends;
pub mod buffer;

use serde::Serialize;

use leapmove_common::error::{LeapmoveError, LeapmoveResult};
use leapmove_scene_model::frame::Frame;

use crate::buffer::{EventSink, Listener};

/// Default listener buffer capacity, in events.
pub const DEFAULT_BUFFER_CAPACITY: usize = 500;

/// Entry point of a sensor driver library.
pub trait SensorDriver: Send {
    /// Driver name for logging.
    fn name(&self) -> &str;

    /// Check if the device and its runtime are present.
    fn is_available(&self) -> bool;

    /// Open a connection to the device.
    fn connect(&mut self) -> LeapmoveResult<Box<dyn SensorConnection>>;
}

/// An open connection to the sensor service.
///
/// Calls arrive in the order `add_listener`, `enable_background`, then
/// `remove_listener` and `close` during teardown.
pub trait SensorConnection: Send {
    /// Register a listener; the connection delivers events into `sink`.
    fn add_listener(&mut self, sink: EventSink) -> LeapmoveResult<()>;

    /// Deliver frames even when the host application is not focused.
    fn enable_background(&mut self) -> LeapmoveResult<()>;

    /// Stop delivering into the registered listener.
    fn remove_listener(&mut self);

    /// Release the connection.
    fn close(&mut self);
}

/// Counters describing a frame source's traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    /// Events the driver delivered into the buffer.
    pub events_received: u64,
    /// Events lost to buffer overflow.
    pub events_dropped: u64,
    /// Frames handed to consumers.
    pub frames_yielded: u64,
    /// Non-frame events discarded while draining.
    pub events_discarded: u64,
    /// Number of `poll` calls.
    pub polls: u64,
}

/// A started sensor connection plus its buffered listener.
///
/// Constructed alive by [`FrameSource::start`]; becomes dead exactly once
/// on [`FrameSource::shutdown`]. Callers must stop polling once
/// [`FrameSource::is_dead`] reports true.
pub struct FrameSource {
    driver_name: String,
    connection: Option<Box<dyn SensorConnection>>,
    listener: Option<Listener>,
    dead: bool,
    stats: SourceStats,
}

impl FrameSource {
    /// Connect through `driver`, attach a listener with room for `capacity`
    /// events, and enable background delivery.
    ///
    /// On failure nothing stays attached: a connection whose listener could
    /// not be registered is closed before the error is returned.
    pub fn start(driver: &mut dyn SensorDriver, capacity: usize) -> LeapmoveResult<Self> {
        let driver_name = driver.name().to_string();

        if !driver.is_available() {
            return Err(LeapmoveError::connection(format!(
                "sensor driver '{driver_name}' is not available"
            )));
        }

        let mut connection = driver.connect().map_err(|e| match e {
            LeapmoveError::Connection { .. } => e,
            other => LeapmoveError::connection(format!("{driver_name}: {other}")),
        })?;

        let listener = Listener::new(capacity);

        if let Err(e) = connection.add_listener(listener.sink()) {
            connection.close();
            return Err(LeapmoveError::connection(format!(
                "{driver_name}: failed to register listener: {e}"
            )));
        }

        if let Err(e) = connection.enable_background() {
            connection.remove_listener();
            drop(listener);
            connection.close();
            return Err(LeapmoveError::connection(format!(
                "{driver_name}: failed to enable background delivery: {e}"
            )));
        }

        tracing::info!(
            driver = %driver_name,
            capacity = listener.buffer().capacity(),
            "Frame source started"
        );

        Ok(Self {
            driver_name,
            connection: Some(connection),
            listener: Some(listener),
            dead: false,
            stats: SourceStats::default(),
        })
    }

    /// Drain the frames buffered so far, in arrival order.
    ///
    /// Non-frame events are discarded. The returned iterator ends as soon as
    /// the buffer is empty; each call starts a fresh drain.
    pub fn poll(&mut self) -> Drain<'_> {
        self.stats.polls += 1;
        if self.dead {
            tracing::warn!(driver = %self.driver_name, "poll called on a dead frame source");
        }
        Drain {
            listener: self.listener.as_ref(),
            stats: &mut self.stats,
        }
    }

    /// Detach and release the listener, then the connection, and mark the
    /// source dead.
    pub fn shutdown(&mut self) {
        if self.dead {
            tracing::warn!(driver = %self.driver_name, "Frame source already shut down");
            return;
        }

        if let Some(connection) = self.connection.as_mut() {
            connection.remove_listener();
        }
        if let Some(listener) = self.listener.take() {
            self.absorb_counters(&listener);
        }
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        self.dead = true;

        tracing::info!(
            driver = %self.driver_name,
            frames = self.stats.frames_yielded,
            dropped = self.stats.events_dropped,
            "Frame source shut down"
        );
    }

    /// Whether the source has been shut down.
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Name of the driver backing this source.
    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    /// Current traffic counters.
    pub fn stats(&self) -> SourceStats {
        let mut stats = self.stats;
        if let Some(listener) = &self.listener {
            let counters = listener.buffer().counters();
            stats.events_received = counters.received;
            stats.events_dropped = counters.dropped;
        }
        stats
    }

    fn absorb_counters(&mut self, listener: &Listener) {
        let counters = listener.buffer().counters();
        self.stats.events_received = counters.received;
        self.stats.events_dropped = counters.dropped;
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        if !self.dead {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for FrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSource")
            .field("driver", &self.driver_name)
            .field("dead", &self.dead)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Non-blocking drain over a frame source's buffer.
pub struct Drain<'a> {
    listener: Option<&'a Listener>,
    stats: &'a mut SourceStats,
}

impl Iterator for Drain<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let listener = self.listener?;
        loop {
            let event = listener.poll()?;
            let kind = event.kind();
            match event.into_frame() {
                Some(frame) => {
                    self.stats.frames_yielded += 1;
                    return Some(frame);
                }
                None => {
                    self.stats.events_discarded += 1;
                    tracing::debug!(event = kind, "Discarding non-frame sensor event");
                }
            }
        }
    }
}
