pub mod chat;
pub mod config;
pub mod error;
pub mod server;
pub mod testing;

pub mod prelude {
    pub use crate::chat::{ChatReply, ChatService, ChatSettings, Message, SessionRegistry};
    pub use crate::chat::{CompletionBackend, CompletionClient};
    pub use crate::error::{ChatError, Result};
}
