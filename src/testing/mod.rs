//! 测试辅助组件

mod mock_backend;

pub use mock_backend::MockBackend;
