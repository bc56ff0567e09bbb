//! prompt-relay - forward a prompt to a local or OpenAI-compatible LLM
//!
//! This library provides the relay core (provider dispatch and response
//! unwrapping), its configuration, and the HTTP surface that exposes it.

pub mod config;
pub mod error;
pub mod proxy;
pub mod relay;

pub use config::{Config, Provider};
pub use error::{Error, Result};
pub use relay::Relay;
