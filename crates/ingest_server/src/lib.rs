//! # Ingest Server
//!
//! 服务端接收模块。
//!
//! 负责：
//! - 接收采集端投递的样本 (`/api/sensor-data`, `/submit-sensor`)
//! - 按 schema1 / schema2 / batch 三种模式组装仓库行
//! - 写入进程级共享、首次使用时初始化的仓库 sink
//! - 对调用方隐藏 sink 内部错误

pub mod error;
pub mod ingest;
pub mod lazy;
pub mod routes;
pub mod server;
pub mod sinks;

pub use error::{BodyShape, IngestError, ServeError};
pub use ingest::{IngestMode, TableNames};
pub use lazy::LazySink;
pub use routes::{router, AppState};
pub use server::{bind, serve, serve_on};
pub use sinks::{FileWarehouse, LogWarehouse, MemoryWarehouse, Warehouse};
