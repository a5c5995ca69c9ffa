//! Engine crate: lifecycle, event bus, background updaters, and the
//! cancellation workflow.

pub mod cancellation;
pub mod engine;
pub mod error;
pub mod event_bus;
pub mod lifecycle;
mod updaters;

pub use cancellation::{CancellationState, CancellationWorkflow};
pub use engine::{Engine, EngineBuilder, EngineContext};
pub use error::CoreError;
pub use event_bus::EventBus;
pub use lifecycle::{LifecycleManager, LifecycleState};
