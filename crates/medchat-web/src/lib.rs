//! HTTP chat front-end for medchat

mod error;
mod server;

#[cfg(test)]
mod tests;

pub use error::ChatError;
pub use server::{AppContext, CHAT_PAGE, router, serve};

// Re-export core types
pub use medchat_core::{Error, Result};
