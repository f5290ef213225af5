//! Application layer
//!
//! Orchestrates use cases and coordinates domain objects.

pub mod commands;
pub mod dto;
pub mod session;

pub use commands::FormService;
pub use dto::*;
pub use session::{FormSession, SessionError};
