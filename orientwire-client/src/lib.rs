//! # orientwire-client
//!
//! Async client for the OrientDB binary protocol (version 15).
//!
//! This crate provides:
//! - Session state tracking with handshake and session-id handling
//! - One request/response exchange at a time per session
//! - Typed methods for every catalog operation

pub mod client;
pub mod connection;
pub mod error;

pub use client::{Client, ClusterInfo, DataRange, DatabaseInfo};
pub use connection::{Connection, ConnectionConfig, ResponseBody, SessionState};
pub use error::ClientError;
