//! # hopg - HOPG X 射线晶体谱仪 IP 数据处理工具
//!
//! 把 HOPG 谱仪成像板 (IP) 的扫描数据换算成绝对标定的光子能谱，
//! 并计算 Cu Kα 线的产额。
//!
//! ## 子命令
//! - `calibrate` - 双基准标定，并换算该扫描
//! - `convert`   - 单基准换算（单文件或批量目录）
//! - `yield`     - 按打靶编号范围计算 Kα 产额
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/          (命令行参数定义)
//!   ├── commands/     (命令执行逻辑)
//!   │     ├── spectrometer/ (几何、标定、校正、换算、积分、输出)
//!   │     ├── parsers/      (扫描、滤片、能谱文件)
//!   │     ├── lookup/       (打靶时刻、基准线位置)
//!   │     ├── batch/        (批量并行)
//!   │     ├── store.rs      (标定记录)
//!   │     └── models/       (数据模型)
//!   ├── config.rs     (仪器配置)
//!   ├── utils/        (终端输出)
//!   └── error.rs      (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod config;
mod error;
mod lookup;
mod models;
mod parsers;
mod spectrometer;
mod store;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
