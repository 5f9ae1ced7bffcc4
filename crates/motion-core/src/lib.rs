//! LeapMove Motion Core
//!
//! Turns sensor frames into object motion:
//! - **Mapper:** Normalize fingertip input and project it onto a camera basis
//! - **Strategies:** Decide per frame whether and how to move the selection
//! - **Session:** One scheduler tick = drain the frame source, feed the strategy
//!
//! The mapper is pure computation. Only strategies write to the host scene.

pub mod mapper;
pub mod session;
pub mod strategy;

pub use mapper::Basis;
pub use session::{TickOutcome, TrackingSession};
pub use strategy::{build_strategy, FrameOutcome, InteractionStrategy, ObjectMove};
