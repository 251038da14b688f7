//! # 解析器模块
//!
//! 读取 IP 扫描 CSV、滤片透过率表和已换算的能谱 CSV。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: scan, spectrum, transmittance

pub mod scan;
pub mod spectrum;
pub mod transmittance;

pub use scan::parse_scan_file;
pub use spectrum::parse_spectrum_file;
pub use transmittance::{load_filters, parse_transmittance_file};

use crate::error::{HopgError, Result};
use std::path::Path;

/// 读取整个文本文件；不存在时返回 FileNotFound
pub(crate) fn read_text(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(HopgError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    std::fs::read_to_string(path).map_err(|e| HopgError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 解析数值字段，失败时带上行号
pub(crate) fn parse_number(
    field: Option<&str>,
    format: &str,
    source_name: &str,
    line: u64,
) -> Result<f64> {
    let field = field.ok_or_else(|| HopgError::ParseError {
        format: format.to_string(),
        path: source_name.to_string(),
        reason: format!("line {}: expected two columns", line),
    })?;

    field.trim().parse::<f64>().map_err(|_| HopgError::ParseError {
        format: format.to_string(),
        path: source_name.to_string(),
        reason: format!("line {}: '{}' is not a number", line, field.trim()),
    })
}
