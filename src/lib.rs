//! Mock data generator backed by a hosted generative model
//!
//! Turns a natural-language instruction plus a declared output shape into
//! typed domain records (profiles, chats, canvases, vault nodes, integrations),
//! and wraps the model's multimodal calls for image description and editing.

pub mod ai;
pub mod app;
pub mod error;
pub mod models;
pub mod prompts;
pub mod schema;

pub use error::{Error, Result};
