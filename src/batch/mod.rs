//! # 批量处理模块
//!
//! 目录模式下按文件名模式收集扫描文件并并行换算。
//!
//! ## 功能
//! - 收集匹配文件列表
//! - 并行处理，结果保持输入顺序
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchResult, BatchRunner, ProcessResult};
