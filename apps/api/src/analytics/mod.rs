pub mod handlers;
pub mod prompts;
pub mod rollup;
pub mod service;
