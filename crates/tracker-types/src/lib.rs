pub mod api;
pub mod appdata;
pub mod common;
pub mod errors;
pub mod events;
pub mod orders;
pub mod quotes;
pub mod serde_helpers;
pub mod tokens;

pub use api::*;
pub use common::*;
pub use errors::*;
pub use events::*;
pub use orders::*;
pub use quotes::*;
pub use tokens::*;
