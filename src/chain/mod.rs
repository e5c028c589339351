//! Chain connectivity module for registry watching
//!
//! This module provides:
//! - Event types and log decoding for NewItem/RequestSubmitted/Dispute
//! - A polling log reader with bounded sub-range splitting
//! - A read-only market contract client for display-name lookups

mod errors;
mod events;
mod market_client;
mod reader;

pub use errors::ChainError;
pub use events::{
    decode_log, DecodeError, Dispute, DisputeEvent, EventSignatures, NewItem, NewItemEvent,
    RegistryEvent, RequestSubmitted, RequestSubmittedEvent,
};
pub use market_client::MarketClient;
pub use reader::{split_ranges, ChainReader, ChainReaderConfig};
