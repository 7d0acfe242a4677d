pub mod client;
pub mod types;

pub use client::GeminiHttpClient;
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    InlineData, Part,
};
