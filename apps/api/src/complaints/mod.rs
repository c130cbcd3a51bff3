pub mod embeddings;
pub mod handlers;
pub mod priority;
pub mod prompts;
pub mod service;
pub mod similarity;
pub mod triage;
