//! Client library for a multi-agent roundtable discussion platform.
//!
//! Users group agent profiles into chatrooms and watch a live multi-party
//! discussion unfold. This crate implements the realtime side of that view:
//! the discussion socket codec, the single-connection lifecycle, the session
//! state machine with server-authoritative status, the ordered message log,
//! and the control policy derived from status. Agent and chatroom records are
//! owned by the Directory Service and consumed over HTTP.

pub mod connection;
pub mod directory;
pub mod display;
pub mod error;
pub mod log;
pub mod logger;
pub mod policy;
pub mod protocol;
pub mod session;
pub mod time;
pub mod types;
