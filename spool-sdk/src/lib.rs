//! Types shared between the share pool indexer server and its consumers.

pub mod objects;

#[cfg(feature = "client")]
pub mod client;
