//! # calibrate 子命令 CLI 定义
//!
//! 用两条已知能量的基准线同时确定 s0, s1，换算该扫描并保存标定结果。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/calibrate.rs`

use crate::cli::pipeline::PipelineArgs;
use crate::models::CalibrationReference;

use clap::Args;
use std::path::PathBuf;

/// calibrate 子命令参数
#[derive(Args, Debug)]
pub struct CalibrateArgs {
    /// IP scan CSV (e.g. profile/200910_G43798_HOPG_1530.csv)
    pub scan: PathBuf,

    /// Reference line as ENERGY_KEV:POSITION_CM, given twice
    /// (default: 8.048:1.005 and 8.391012:1.52)
    #[arg(long = "ref", value_name = "E:POS")]
    pub references: Vec<CalibrationReference>,

    /// Do not record the solution in the calibration store
    #[arg(long, default_value_t = false)]
    pub no_save: bool,

    #[command(flatten)]
    pub common: PipelineArgs,
}
