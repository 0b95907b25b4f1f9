//! HTTP relay between a chat front-end and the upstream agent API.
//!
//! The relay exposes `create-conversation` and `create-response`, plus the
//! feedback passthrough endpoints. Streamed responses are re-framed by
//! [`relay::relay`], see that module for the failure semantics once a stream
//! is committed.

mod api;
mod error;
pub mod relay;
mod server;
mod state;

pub use error::{Error, ErrorBody};
pub use server::{router, serve};
pub use state::AppState;
