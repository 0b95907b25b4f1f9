//! Client for the hosted conversational-AI API the relay forwards to.

mod client;
mod error;
mod frames;

pub use client::{Client, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_FRAME_BYTES, FrameStream};
pub use error::Error;
