//! HTTP collaborators consumed by the tracker: the orderbook/quote backend
//! and a JSON-RPC block-number source.

pub mod blocks;
pub mod error;
pub mod orderbook;

pub use blocks::{block_stream, BlockSource, BlockSourceError, RpcBlockSource};
pub use error::ApiClientError;
pub use orderbook::{ChainEndpoints, OrderApi, OrderbookClient, QuoteApi};
