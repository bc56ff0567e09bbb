//! Relay module: provider dispatch and response unwrapping.
//!
//! A [`Relay`] forwards one prompt to the configured upstream provider and
//! returns the generated text:
//! - `ollama`: `POST {base_url}/api/generate`, text from `response`
//! - `openai`: `POST {base_url}/chat/completions`, text from
//!   `choices[0].message.content`

mod dispatcher;
pub mod upstream;

pub use dispatcher::{build_http_client, Relay, CHAT_TEMPERATURE, FALLBACK_MESSAGE};
