//! # 统一错误处理模块
//!
//! 定义 hopg 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// hopg 统一错误类型
#[derive(Error, Debug)]
pub enum HopgError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error(
        "Cannot extract shot number from file name: {name}\n\
         Expected format: XXX_G12345_... (GXII) or XXX_L12345_... (LFEX)"
    )]
    InvalidShotId { name: String },

    #[error("Invalid clock time '{0}' (expected HH:MM, 00:00-23:59)")]
    InvalidClockTime(String),

    // ─────────────────────────────────────────────────────────────
    // 几何 / 标定错误
    // ─────────────────────────────────────────────────────────────
    #[error("Geometry domain error in {operation}: {detail}")]
    GeometryDomain { operation: String, detail: String },

    #[error(
        "Singular calibration: reference angles coincide (θ1 = {theta1:.6} rad, θ2 = {theta2:.6} rad)"
    )]
    SingularCalibration { theta1: f64, theta2: f64 },

    // ─────────────────────────────────────────────────────────────
    // 插值 / 积分错误
    // ─────────────────────────────────────────────────────────────
    #[error("Energy {energy:.4} keV is outside the {filter} table ({min:.4} - {max:.4} keV)")]
    InterpolationOutOfRange {
        filter: String,
        energy: f64,
        min: f64,
        max: f64,
    },

    #[error("Not enough samples: need at least {needed}, got {got}")]
    InsufficientSamples { needed: usize, got: usize },

    #[error("No samples inside energy window {min:.4} - {max:.4} keV")]
    EmptyWindow { min: f64, max: f64 },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid range format: {0}")]
    InvalidRange(String),

    // ─────────────────────────────────────────────────────────────
    // CSV / YAML 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    // ─────────────────────────────────────────────────────────────
    // 处理流程
    // ─────────────────────────────────────────────────────────────
    #[error("{stage} failed: {source}")]
    StageFailed {
        stage: String,
        #[source]
        source: Box<HopgError>,
    },

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("Plot rendering failed: {0}")]
    PlotError(String),

    #[error("{0}")]
    Other(String),
}

impl HopgError {
    /// 构造几何定义域错误
    pub fn domain(operation: &str, detail: impl Into<String>) -> Self {
        HopgError::GeometryDomain {
            operation: operation.to_string(),
            detail: detail.into(),
        }
    }
}

/// 为错误标注所处的处理阶段
pub trait StageContext<T> {
    fn stage(self, stage: &str) -> Result<T>;
}

impl<T> StageContext<T> for Result<T> {
    fn stage(self, stage: &str) -> Result<T> {
        self.map_err(|e| match e {
            HopgError::StageFailed { .. } => e,
            other => HopgError::StageFailed {
                stage: stage.to_string(),
                source: Box::new(other),
            },
        })
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, HopgError>;
