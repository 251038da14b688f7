//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `calibrate`: 双基准标定 + 能谱换算，保存标定结果
//! - `convert`: 单基准换算（单文件或目录批量）
//! - `yield`: 按打靶编号范围计算 Kα 产额
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: pipeline, calibrate, convert, ka_yield

pub mod calibrate;
pub mod convert;
pub mod ka_yield;
pub mod pipeline;

use clap::{Parser, Subcommand};

/// hopg - HOPG X 射线晶体谱仪 IP 数据处理工具
#[derive(Parser)]
#[command(name = "hopg")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "HOPG crystal spectrometer toolkit: imaging-plate scans to calibrated photon spectra and Ka yields",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Two-reference calibration of a scan, then convert it to a photon spectrum
    Calibrate(calibrate::CalibrateArgs),

    /// Convert IP scans to photon spectra using a single reference line
    Convert(convert::ConvertArgs),

    /// Integrate Ka yields over a range of shots
    Yield(ka_yield::YieldArgs),
}
