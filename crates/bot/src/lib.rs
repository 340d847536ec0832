//! Action-event router for the chat commerce bot.
//!
//! Every inbound user action passes through [`BotService::handle`], which:
//! 1. rate-limits the actor
//! 2. resolves button payloads into actions
//! 3. refuses admin actions from anyone but the administrator
//! 4. runs the action against the engines and phrases the outcome

pub mod action;
pub mod error;
pub mod rate_limit;
pub mod service;

pub use action::{Action, ActionEvent, Actor};
pub use error::CallbackError;
pub use rate_limit::RateLimiter;
pub use service::{BotService, BotSettings, Reply};
