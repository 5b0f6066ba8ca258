//! 内置健康检查

pub mod cache;
pub mod env;
pub mod http;
pub mod log;
pub mod scheduler;
pub mod storage;

pub use self::cache::CacheCheck;
pub use self::env::EnvCheck;
pub use self::http::HttpCheck;
pub use self::log::LogCheck;
pub use self::scheduler::SchedulerCheck;
pub use self::storage::StorageCheck;
