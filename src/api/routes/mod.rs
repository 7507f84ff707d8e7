//! API Routes
//!
//! Route handlers organized by functionality.

pub mod aggregate;
pub mod events;
pub mod health;
pub mod messages;
