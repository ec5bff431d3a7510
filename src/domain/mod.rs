//! Domain modules: one vertical slice per exchange concept.
//!
//! Each slice holds its wire types, validation and state; HTTP-backed slices
//! also carry a `client.rs` sub-client.

pub mod order;
pub mod orderbook;
pub mod wallet;
