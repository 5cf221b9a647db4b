mod client;
mod repo_context;

pub use client::*;
pub use repo_context::*;
