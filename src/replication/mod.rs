//! Master/replica replication.
//!
//! A master keeps a registry of replica connections and forwards every
//! accepted write to them. A replica performs the handshake against its
//! master once at startup and then applies the writes streamed to it.

mod handshake;
mod manager;

pub use handshake::{connect_to_master, handshake, FullResync, HandshakeError};
pub use manager::{Replica, ReplicationManager};
