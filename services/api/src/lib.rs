//! services/api/src/lib.rs
//!
//! The HTTP service for the Q&A relay: configuration, adapters for the store,
//! session tokens and the pub/sub relay, and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
