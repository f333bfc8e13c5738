//! Base types and error handling.
//!
//! Provides the crate's single error taxonomy:
//! - [`error::ChannelError`]: the unified error every connect-time and
//!   transport-time failure is translated into before it reaches a caller.

pub mod error;
