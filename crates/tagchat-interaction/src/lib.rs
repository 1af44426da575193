//! Remote chat-completion clients.

pub mod openai_api_client;

pub use openai_api_client::{DEFAULT_BASE_URL, OpenAIApiClient};
