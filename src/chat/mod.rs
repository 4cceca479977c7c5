//! 会话核心：配置、记录、请求组装、补全客户端与编排

pub mod client;
pub mod history;
pub mod prompts;
pub mod request;
pub mod service;
pub mod session;
pub mod settings;
pub mod types;

pub use client::{CompletionBackend, CompletionClient};
pub use history::Transcript;
pub use service::ChatService;
pub use session::SessionRegistry;
pub use settings::{ChatSettings, SettingsPatch};
pub use types::{ChatReply, Citation, Message, Role};
