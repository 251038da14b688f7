//! # yield 子命令 CLI 定义
//!
//! 对已换算的能谱 `HOPG_<shot>.csv` 逐发计算 Kα 产额。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/ka_yield.rs`

use crate::models::LaserType;

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 激光装置
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "UPPER")]
pub enum LaserArg {
    /// GXII
    #[default]
    G,
    /// LFEX
    L,
}

impl From<LaserArg> for LaserType {
    fn from(arg: LaserArg) -> Self {
        match arg {
            LaserArg::G => LaserType::Gxii,
            LaserArg::L => LaserType::Lfex,
        }
    }
}

/// yield 子命令参数
#[derive(Args, Debug)]
pub struct YieldArgs {
    /// Directory containing HOPG_<shot>.csv spectra
    #[arg(default_value = "data")]
    pub data_dir: PathBuf,

    /// Shot number range, inclusive (e.g. "43775-43803" or "43798")
    #[arg(short, long)]
    pub shots: String,

    /// Laser facility prefix of the shot ids
    #[arg(short, long, value_enum, ignore_case = true, default_value = "G")]
    pub laser: LaserArg,

    /// Integration window in keV (e.g. "8.0-8.1")
    #[arg(long)]
    pub window: Option<String>,

    /// Background window in keV (e.g. "7.9-7.99")
    #[arg(long)]
    pub background: Option<String>,

    /// Crystal integrated reflectivity
    #[arg(long)]
    pub reflectivity: Option<f64>,

    /// Append result lines to this log file
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Instrument configuration file (YAML)
    #[arg(short, long, env = "HOPG_CONFIG")]
    pub config: Option<PathBuf>,
}
