//! Session and identity management for MedVision.
//!
//! A local stand-in for a hosted auth provider: registered users and the
//! current session live in the key-value substrate, and auth state
//! transitions are pushed synchronously to subscribers. There are exactly
//! two states, anonymous and authenticated; the persisted session slot
//! decides which one a fresh process starts in.

mod error;
mod store;
mod subscription;

pub use error::*;
pub use store::*;
pub use subscription::*;
