//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `spectrometer/`, `lookup/`, `utils/`
//! - 子模块: pipeline, calibrate, convert, ka_yield

pub mod calibrate;
pub mod convert;
pub mod ka_yield;
pub mod pipeline;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Calibrate(args) => calibrate::execute(args),
        Commands::Convert(args) => convert::execute(args),
        Commands::Yield(args) => ka_yield::execute(args),
    }
}
