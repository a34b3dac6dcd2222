//! A key-value server speaking the Redis serialization protocol.
//!
//! The server supports:
//!
//! - Point reads and writes with optional expiry (GET, SET with PX/EX)
//! - Loading an RDB snapshot at startup as a read-only fallback layer
//! - Master/replica replication with a full-resync handshake and write fan-out
//! - Administrative commands (PING, ECHO, CONFIG GET, KEYS, INFO)
//!
//! Each connection runs as its own Tokio task against a shared
//! [`key_value_store::KeyValueStore`].

pub mod commands;
pub mod connection;
pub mod expiry;
pub mod input;
pub mod key_value_store;
pub mod rdb;
pub mod replication;
pub mod resp;
pub mod server;
