//! HTTP handlers.

pub mod events;
pub mod menu;
pub mod orders;
pub mod status;
