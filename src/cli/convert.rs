//! # convert 子命令 CLI 定义
//!
//! 以标定记录（或默认值）为先验，用单条基准线修正 s0 后换算扫描。
//! 输入为单个扫描文件或包含扫描文件的目录。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/convert.rs`

use crate::batch::collector::DEFAULT_SCAN_PATTERN;
use crate::cli::pipeline::PipelineArgs;

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 基准线位置的选择方式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum PickerKind {
    /// Fixed position (--reference-position, default 1.005 cm)
    #[default]
    Fixed,
    /// Position of the maximum intensity
    Max,
    /// Ask on the terminal for each scan
    Prompt,
}

impl std::fmt::Display for PickerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickerKind::Fixed => write!(f, "fixed"),
            PickerKind::Max => write!(f, "max"),
            PickerKind::Prompt => write!(f, "prompt"),
        }
    }
}

/// convert 子命令参数
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input: IP scan CSV or directory containing scans
    pub input: PathBuf,

    /// How to locate the reference line on each scan
    #[arg(long, value_enum, default_value = "fixed")]
    pub picker: PickerKind,

    /// Reference line energy in keV (Cu Ka1 by default)
    #[arg(long, default_value_t = 8.048)]
    pub reference_energy: f64,

    /// Reference line position in cm for the fixed picker
    #[arg(long, default_value_t = 1.005)]
    pub reference_position: f64,

    /// Position range searched by the max picker (e.g. "0.5-1.5")
    #[arg(long)]
    pub search_range: Option<String>,

    /// Use the stored calibration as is, without the single-reference shift
    #[arg(long, default_value_t = false)]
    pub no_recalibrate: bool,

    // ─────────────────────────────────────────────────────────────
    // 批量处理参数
    // ─────────────────────────────────────────────────────────────
    /// Glob pattern for scan files (directory mode, comma-separated)
    #[arg(long, default_value = DEFAULT_SCAN_PATTERN)]
    pub pattern: String,

    /// Number of parallel jobs (0 = all cores, directory mode only)
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Recurse into subdirectories (directory mode)
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Overwrite existing spectra
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    #[command(flatten)]
    pub common: PipelineArgs,
}
