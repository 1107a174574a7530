//! HTTP API handlers.

pub mod read;
