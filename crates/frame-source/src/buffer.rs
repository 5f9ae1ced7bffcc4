//! Bounded event ring shared between driver threads and the tick thread.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use leapmove_scene_model::frame::SensorEvent;

/// Fixed-capacity FIFO of sensor events.
///
/// When full, pushing overwrites the oldest buffered event.
#[derive(Debug)]
pub struct EventBuffer {
    ring: Mutex<Ring>,
    capacity: usize,
    closed: AtomicBool,
}

#[derive(Debug, Default)]
struct Ring {
    events: VecDeque<SensorEvent>,
    received: u64,
    dropped: u64,
}

/// Counters kept by an [`EventBuffer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferCounters {
    /// Events accepted since creation.
    pub received: u64,
    /// Events overwritten because the ring was full.
    pub dropped: u64,
}

impl EventBuffer {
    /// Create a buffer holding at most `capacity` events (minimum 1).
    /// Storage grows on demand up to that bound.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Mutex::new(Ring::default()),
            capacity,
            closed: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ring> {
        // A producer panicking mid-push leaves the ring structurally valid.
        self.ring.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append an event. Returns `false` if the buffer is closed.
    pub fn push(&self, event: SensorEvent) -> bool {
        if self.is_closed() {
            return false;
        }
        let mut ring = self.lock();
        if ring.events.len() == self.capacity {
            ring.events.pop_front();
            ring.dropped += 1;
        }
        ring.events.push_back(event);
        ring.received += 1;
        true
    }

    /// Remove the oldest event, if any. Never blocks on future events.
    pub fn pop(&self) -> Option<SensorEvent> {
        self.lock().events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn counters(&self) -> BufferCounters {
        let ring = self.lock();
        BufferCounters {
            received: ring.received,
            dropped: ring.dropped,
        }
    }

    /// Reject all further pushes and discard anything still buffered.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.lock().events.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Producer handle given to a sensor connection.
#[derive(Debug, Clone)]
pub struct EventSink {
    buffer: Arc<EventBuffer>,
}

impl EventSink {
    /// Deliver an event. Returns `false` once the owning listener is gone.
    pub fn send(&self, event: SensorEvent) -> bool {
        self.buffer.push(event)
    }

    pub fn is_closed(&self) -> bool {
        self.buffer.is_closed()
    }
}

/// Consumer end owned by the frame source.
///
/// Dropping the listener closes its buffer so late driver callbacks are
/// discarded instead of queued.
#[derive(Debug)]
pub struct Listener {
    buffer: Arc<EventBuffer>,
}

impl Listener {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(EventBuffer::new(capacity)),
        }
    }

    /// A new producer handle for this listener's buffer.
    pub fn sink(&self) -> EventSink {
        EventSink {
            buffer: Arc::clone(&self.buffer),
        }
    }

    pub fn poll(&self) -> Option<SensorEvent> {
        self.buffer.pop()
    }

    pub fn buffer(&self) -> &EventBuffer {
        &self.buffer
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.buffer.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame_event(id: u64) -> SensorEvent {
        use leapmove_scene_model::frame::{BoundingVolume, Frame};
        SensorEvent::Frame(Frame::new(id, 0, vec![], BoundingVolume::default()))
    }

    fn frame_id(event: SensorEvent) -> u64 {
        event.into_frame().map(|f| f.id).unwrap_or(u64::MAX)
    }

    #[test]
    fn test_fifo_order() {
        let buffer = EventBuffer::new(4);
        buffer.push(frame_event(1));
        buffer.push(SensorEvent::Connect);
        buffer.push(frame_event(2));

        assert_eq!(buffer.len(), 3);
        assert_eq!(frame_id(buffer.pop().unwrap()), 1);
        assert_eq!(buffer.pop().unwrap(), SensorEvent::Connect);
        assert_eq!(frame_id(buffer.pop().unwrap()), 2);
        assert!(buffer.pop().is_none());
    }

    #[test]
    fn test_full_ring_overwrites_oldest() {
        let buffer = EventBuffer::new(2);
        for id in 0..5 {
            buffer.push(frame_event(id));
        }
        assert_eq!(buffer.len(), 2);
        assert_eq!(
            buffer.counters(),
            BufferCounters {
                received: 5,
                dropped: 3
            }
        );
        assert_eq!(frame_id(buffer.pop().unwrap()), 3);
        assert_eq!(frame_id(buffer.pop().unwrap()), 4);
    }

    #[test]
    fn test_huge_capacity_allocates_on_demand() {
        let buffer = EventBuffer::new(usize::MAX);
        assert_eq!(buffer.capacity(), usize::MAX);
        assert!(buffer.is_empty());

        buffer.push(frame_event(7));
        assert_eq!(frame_id(buffer.pop().unwrap()), 7);
    }

    #[test]
    fn test_dropping_listener_closes_sinks() {
        let listener = Listener::new(8);
        let sink = listener.sink();
        assert!(sink.send(SensorEvent::Init));
        assert_eq!(listener.buffer().len(), 1);

        drop(listener);
        assert!(sink.is_closed());
        assert!(!sink.send(SensorEvent::Connect));
    }

    #[test]
    fn test_concurrent_producer() {
        let listener = Listener::new(1000);
        let sink = listener.sink();
        let producer = std::thread::spawn(move || {
            for id in 0..200 {
                sink.send(frame_event(id));
            }
        });
        producer.join().unwrap();

        let ids: Vec<u64> = std::iter::from_fn(|| listener.poll()).map(frame_id).collect();
        assert_eq!(ids, (0..200).collect::<Vec<_>>());
    }

    proptest! {
        #[test]
        fn ring_keeps_newest_events(capacity in 1usize..16, count in 0u64..64) {
            let buffer = EventBuffer::new(capacity);
            for id in 0..count {
                buffer.push(frame_event(id));
            }

            let kept = count.min(capacity as u64);
            let ids: Vec<u64> = std::iter::from_fn(|| buffer.pop()).map(frame_id).collect();
            prop_assert_eq!(ids, ((count - kept)..count).collect::<Vec<_>>());
            prop_assert_eq!(buffer.counters().dropped, count - kept);
        }
    }
}
