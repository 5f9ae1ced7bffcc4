//! Sensor driver implementations.
//!
//! Real device runtimes plug in through [`SensorDriver`]; the drivers here
//! cover simulation and scripted playback.

use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use leapmove_common::config::{DriverKind, TrackingConfig};
use leapmove_common::error::{LeapmoveError, LeapmoveResult};
use leapmove_scene_model::frame::{BoundingVolume, Finger, Frame, Hand, SensorEvent};
use leapmove_scene_model::math::Vec3;

use crate::buffer::EventSink;
use crate::{SensorConnection, SensorDriver};

/// Seconds for the simulated fingertip to complete one orbit.
const ORBIT_PERIOD_SECS: f64 = 4.0;

/// Orbit radius as a fraction of the tracking volume width.
const ORBIT_RADIUS_FRACTION: f64 = 0.35;

// ── Stub driver ──────────────────────────────────────────────────────────────

/// Scripted driver for tests and recorded-frame playback.
///
/// Scripted events are delivered as soon as a listener is attached, after an
/// initial [`SensorEvent::Init`]. More can be pushed later through a
/// [`StubHandle`].
pub struct StubDriver {
    events: Vec<SensorEvent>,
    available: bool,
    fail_listener: bool,
    handle: StubHandle,
}

/// Shared view into a stub driver's connection, used to inject events and
/// observe lifecycle calls.
#[derive(Debug, Clone, Default)]
pub struct StubHandle {
    state: Arc<Mutex<StubState>>,
}

#[derive(Debug, Default)]
struct StubState {
    sink: Option<EventSink>,
    background: bool,
    closed: bool,
    calls: Vec<&'static str>,
}

impl StubDriver {
    /// Create a stub driver with pre-loaded events.
    pub fn new(events: Vec<SensorEvent>) -> Self {
        Self {
            events,
            available: true,
            fail_listener: false,
            handle: StubHandle::default(),
        }
    }

    /// Create a stub driver that delivers recorded frames.
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self::new(frames.into_iter().map(SensorEvent::Frame).collect())
    }

    /// Create an empty stub that never produces events on its own.
    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// A stub whose device is absent.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::empty()
        }
    }

    /// Make listener registration fail.
    pub fn with_listener_failure(mut self) -> Self {
        self.fail_listener = true;
        self
    }

    pub fn handle(&self) -> StubHandle {
        self.handle.clone()
    }
}

impl SensorDriver for StubDriver {
    fn name(&self) -> &str {
        "stub"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn connect(&mut self) -> LeapmoveResult<Box<dyn SensorConnection>> {
        if !self.available {
            return Err(LeapmoveError::connection("stub device is absent"));
        }
        self.handle.lock().calls.push("connect");
        Ok(Box::new(StubConnection {
            pending: std::mem::take(&mut self.events),
            fail_listener: self.fail_listener,
            handle: self.handle.clone(),
        }))
    }
}

struct StubConnection {
    pending: Vec<SensorEvent>,
    fail_listener: bool,
    handle: StubHandle,
}

impl SensorConnection for StubConnection {
    fn add_listener(&mut self, sink: EventSink) -> LeapmoveResult<()> {
        let mut state = self.handle.lock();
        state.calls.push("add_listener");
        if self.fail_listener {
            return Err(LeapmoveError::driver("listener rejected"));
        }
        sink.send(SensorEvent::Init);
        for event in self.pending.drain(..) {
            sink.send(event);
        }
        state.sink = Some(sink);
        Ok(())
    }

    fn enable_background(&mut self) -> LeapmoveResult<()> {
        let mut state = self.handle.lock();
        state.calls.push("enable_background");
        state.background = true;
        Ok(())
    }

    fn remove_listener(&mut self) {
        let mut state = self.handle.lock();
        state.calls.push("remove_listener");
        if let Some(sink) = state.sink.take() {
            sink.send(SensorEvent::Exit);
        }
    }

    fn close(&mut self) {
        let mut state = self.handle.lock();
        state.calls.push("close");
        state.sink = None;
        state.closed = true;
    }
}

impl StubHandle {
    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Deliver an event as the driver would. Returns `false` when no
    /// listener is attached.
    pub fn push(&self, event: SensorEvent) -> bool {
        match &self.lock().sink {
            Some(sink) => sink.send(event),
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.lock().sink.is_some()
    }

    pub fn background_enabled(&self) -> bool {
        self.lock().background
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Lifecycle calls received so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }
}

// ── Simulated driver ─────────────────────────────────────────────────────────

/// Driver that synthesizes one hand with one finger orbiting the centre of
/// the tracking volume, delivered from a background thread.
pub struct SimulatedDriver {
    rate_hz: u32,
    bounds: BoundingVolume,
}

impl SimulatedDriver {
    pub fn new(rate_hz: u32) -> Self {
        Self {
            rate_hz: rate_hz.max(1),
            bounds: BoundingVolume::default(),
        }
    }
}

impl SensorDriver for SimulatedDriver {
    fn name(&self) -> &str {
        "simulated"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn connect(&mut self) -> LeapmoveResult<Box<dyn SensorConnection>> {
        Ok(Box::new(SimulatedConnection {
            rate_hz: self.rate_hz,
            bounds: self.bounds,
            sink: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
        }))
    }
}

struct SimulatedConnection {
    rate_hz: u32,
    bounds: BoundingVolume,
    sink: Option<EventSink>,
    stop_flag: Arc<AtomicBool>,
    worker: Option<JoinHandle<u64>>,
}

impl SimulatedConnection {
    fn stop_worker(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(frames) => tracing::debug!(frames, "Simulated sensor thread stopped"),
                Err(_) => tracing::warn!("Simulated sensor thread panicked"),
            }
        }
    }
}

impl SensorConnection for SimulatedConnection {
    fn add_listener(&mut self, sink: EventSink) -> LeapmoveResult<()> {
        sink.send(SensorEvent::Init);
        sink.send(SensorEvent::Connect);
        self.sink = Some(sink);
        Ok(())
    }

    fn enable_background(&mut self) -> LeapmoveResult<()> {
        if self.worker.is_some() {
            return Ok(());
        }
        let sink = self
            .sink
            .clone()
            .ok_or_else(|| LeapmoveError::driver("no listener attached"))?;
        let stop_flag = Arc::clone(&self.stop_flag);
        let bounds = self.bounds;
        let interval = Duration::from_secs_f64(1.0 / self.rate_hz as f64);

        let worker = std::thread::Builder::new()
            .name("leapmove-sim".to_string())
            .spawn(move || {
                let epoch = Instant::now();
                let mut id = 0u64;
                while !stop_flag.load(Ordering::Relaxed) {
                    let elapsed = epoch.elapsed();
                    let frame = Frame::new(
                        id,
                        elapsed.as_micros() as u64,
                        vec![Hand::new(
                            1,
                            vec![Finger::new(1, orbit_position(&bounds, elapsed.as_secs_f64()))],
                        )],
                        bounds,
                    );
                    if !sink.send(SensorEvent::Frame(frame)) {
                        break;
                    }
                    id += 1;
                    std::thread::sleep(interval);
                }
                id
            })
            .map_err(|e| LeapmoveError::driver(format!("failed to spawn sensor thread: {e}")))?;

        self.worker = Some(worker);
        tracing::debug!(rate_hz = self.rate_hz, "Simulated sensor streaming");
        Ok(())
    }

    fn remove_listener(&mut self) {
        self.stop_worker();
        if let Some(sink) = self.sink.take() {
            sink.send(SensorEvent::Exit);
        }
    }

    fn close(&mut self) {
        self.stop_worker();
        self.sink = None;
    }
}

impl Drop for SimulatedConnection {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

/// Fingertip position of the simulated hand `t_secs` into the stream.
///
/// Orbits in the XY plane around the volume centre while bobbing along Z.
pub fn orbit_position(bounds: &BoundingVolume, t_secs: f64) -> Vec3 {
    let phase = TAU * t_secs / ORBIT_PERIOD_SECS;
    let radius = bounds.size.x.abs() * ORBIT_RADIUS_FRACTION;
    let depth = bounds.size.z.abs() * 0.25;
    bounds.center
        + Vec3::new(
            radius * phase.cos(),
            radius * phase.sin(),
            depth * (phase / 2.0).sin(),
        )
}

/// Pick the driver named by configuration.
pub fn detect_best_driver(config: &TrackingConfig) -> Box<dyn SensorDriver> {
    match config.driver {
        DriverKind::Simulated => {
            tracing::info!(rate_hz = config.simulated_rate_hz, "Using simulated sensor driver");
            Box::new(SimulatedDriver::new(config.simulated_rate_hz))
        }
        DriverKind::Stub => {
            tracing::warn!("Using stub sensor driver — no frames will arrive");
            Box::new(StubDriver::empty())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Listener;
    use crate::FrameSource;

    #[test]
    fn test_orbit_stays_inside_bounds() {
        let bounds = BoundingVolume::default();
        for step in 0..100 {
            let p = orbit_position(&bounds, step as f64 * 0.1);
            assert!(bounds.contains(&p), "{p:?} escaped {bounds:?}");
        }
    }

    #[test]
    fn test_orbit_starts_right_of_centre() {
        let bounds = BoundingVolume::new(Vec3::ZERO, Vec3::new(100.0, 100.0, 100.0));
        let p = orbit_position(&bounds, 0.0);
        assert!((p.x - 35.0).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
        assert!(p.z.abs() < 1e-9);
    }

    #[test]
    fn test_simulated_driver_streams_in_background() {
        let mut driver = SimulatedDriver::new(500);
        let mut source = FrameSource::start(&mut driver, 500).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut frames = Vec::new();
        while frames.len() < 3 && Instant::now() < deadline {
            frames.extend(source.poll());
            std::thread::sleep(Duration::from_millis(5));
        }
        source.shutdown();

        assert!(frames.len() >= 3);
        assert!(frames.windows(2).all(|w| w[0].id < w[1].id));
        assert!(frames.iter().all(|f| f.sole_finger().is_some()));
    }

    #[test]
    fn test_stub_from_frames_delivers_after_init() {
        let frames = vec![Frame::new(3, 0, vec![], BoundingVolume::default())];
        let mut driver = StubDriver::from_frames(frames);
        let mut source = FrameSource::start(&mut driver, 8).unwrap();
        assert_eq!(source.poll().map(|f| f.id).collect::<Vec<_>>(), vec![3]);
    }

    fn drain(listener: &Listener) -> Vec<&'static str> {
        std::iter::from_fn(|| listener.poll())
            .map(|event| event.kind())
            .collect()
    }

    #[test]
    fn test_stub_sends_exit_when_listener_removed() {
        let mut driver = StubDriver::empty();
        let mut connection = driver.connect().unwrap();
        let listener = Listener::new(8);

        connection.add_listener(listener.sink()).unwrap();
        connection.remove_listener();

        assert_eq!(drain(&listener), vec!["init", "exit"]);
        assert!(!driver.handle().is_attached());
    }

    #[test]
    fn test_simulated_sends_exit_after_last_frame() {
        let mut driver = SimulatedDriver::new(500);
        let mut connection = driver.connect().unwrap();
        let listener = Listener::new(4096);

        connection.add_listener(listener.sink()).unwrap();
        connection.enable_background().unwrap();
        std::thread::sleep(Duration::from_millis(20));
        connection.remove_listener();
        connection.close();

        let kinds = drain(&listener);
        assert_eq!(&kinds[..2], &["init", "connect"]);
        assert_eq!(kinds.last(), Some(&"exit"));
        assert_eq!(kinds.iter().filter(|k| **k == "exit").count(), 1);
    }

    #[test]
    fn test_detect_best_driver_follows_config() {
        let mut config = TrackingConfig::default();
        assert_eq!(detect_best_driver(&config).name(), "simulated");
        config.driver = DriverKind::Stub;
        assert_eq!(detect_best_driver(&config).name(), "stub");
    }
}
