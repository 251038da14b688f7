//! # 换算流程的公共参数
//!
//! `calibrate` 与 `convert` 共用：配置、标定记录、时间延迟来源、输出。
//!
//! ## 依赖关系
//! - 被 `cli/calibrate.rs`, `cli/convert.rs` 通过 `#[command(flatten)]` 使用
//! - 参数传递给 `commands/pipeline.rs`

use crate::store::DEFAULT_STORE_FILE;

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// CSV spectrum + PNG plot
    #[default]
    Png,
    /// CSV spectrum + SVG plot
    Svg,
    /// CSV spectrum only
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Png => write!(f, "png"),
            OutputFormat::Svg => write!(f, "svg"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// 公共参数
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Instrument configuration file (YAML); built-in constants when omitted
    #[arg(short, long, env = "HOPG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Calibration record file (YAML)
    #[arg(long, default_value = DEFAULT_STORE_FILE)]
    pub store: PathBuf,

    /// Output directory for spectra and plots
    #[arg(short, long, default_value = "data")]
    pub output_dir: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "png")]
    pub format: OutputFormat,

    /// Skip plot generation
    #[arg(long, default_value_t = false)]
    pub no_plot: bool,

    /// Figure width in pixels (PNG) or points (SVG)
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Figure height in pixels (PNG) or points (SVG)
    #[arg(long, default_value_t = 800)]
    pub height: u32,

    // ─────────────────────────────────────────────────────────────
    // 时间延迟
    // ─────────────────────────────────────────────────────────────
    /// Delay between shot and IP reading, in minutes (overrides shot time lookup)
    #[arg(short = 't', long)]
    pub time_delay: Option<f64>,

    /// Shot time (HH:MM) used for every scan; delay = IP reading time in the file name - shot time
    #[arg(long, conflicts_with = "shot_times")]
    pub shot_time: Option<String>,

    /// CSV table of shot times (columns: shot,HH:MM)
    #[arg(long)]
    pub shot_times: Option<PathBuf>,

    /// Never ask on the terminal; fall back to the configured default delay
    #[arg(long, default_value_t = false)]
    pub no_prompt: bool,

    // ─────────────────────────────────────────────────────────────
    // 校正
    // ─────────────────────────────────────────────────────────────
    /// Leave out the crystal reflectivity (relative spectrum)
    #[arg(long, default_value_t = false)]
    pub relative: bool,

    /// Drive laser energy in kJ; also writes a per-kJ spectrum
    #[arg(long)]
    pub drive_energy: Option<f64>,
}
