pub mod flow;
pub mod handlers;
pub mod loader;
pub mod prompts;
pub mod validation;
