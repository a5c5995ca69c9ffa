//! Order lifecycle subsystem: classification of backend records, the
//! single-writer order store and its reconciler, and the block-driven poll
//! scheduler.

pub mod classification;
pub mod reconciler;
pub mod registry;
pub mod scheduler;
pub mod store;
pub mod summary;

pub use classification::{classify, is_order_unfillable, to_local_status};
pub use reconciler::{reconcile_orders, ReconcileOutcome};
pub use registry::TokenRegistry;
pub use scheduler::{should_check, PollRegistry, PollState};
pub use store::{OrderStore, ReconcileStats};
