//! Datalyst - data analyst AI agent
//!
//! Wires a Gemini-backed agent to two local OAuth handshake tools and a
//! remote tool-set whose HTTP transport relays a per-conversation OAuth
//! authorization code as a bearer token.

pub mod agent;
pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod tools;
pub mod toolset;

pub use error::{Error, Result};
