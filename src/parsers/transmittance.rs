//! # 滤片透过率表解析器
//!
//! ## 格式说明
//! ```text
//! Be Density=1.848 Thickness=500. microns
//!  Photon Energy (eV), Transmission
//!     1000.00      1.2345E-20
//!     1010.00      2.3456E-20
//! ...
//! ```
//! 前两行为表头，之后每行两列（空白分隔）。能量列乘以 `energy_scale` 得到 keV。
//!
//! ## 依赖关系
//! - 被 `commands/pipeline.rs` 使用
//! - 使用 `spectrometer/correction.rs` 的 FilterTransmittance

use crate::config::{FilterConfig, FilterTable};
use crate::error::{HopgError, Result};
use crate::parsers::{parse_number, read_text};
use crate::spectrometer::FilterTransmittance;
use std::path::Path;

const FORMAT: &str = "filter transmittance";
const HEADER_LINES: usize = 2;

/// 解析透过率表文件
pub fn parse_transmittance_file(
    path: &Path,
    name: &str,
    energy_scale: f64,
) -> Result<FilterTransmittance> {
    let content = read_text(path)?;
    parse_transmittance_content(&content, name, energy_scale, &path.display().to_string())
}

/// 从字符串内容解析透过率表
pub fn parse_transmittance_content(
    content: &str,
    name: &str,
    energy_scale: f64,
    source_name: &str,
) -> Result<FilterTransmittance> {
    let mut energies = Vec::new();
    let mut values = Vec::new();

    for (idx, line) in content.lines().enumerate().skip(HEADER_LINES) {
        let line_no = idx as u64 + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let energy = parse_number(parts.next(), FORMAT, source_name, line_no)?;
        let value = parse_number(parts.next(), FORMAT, source_name, line_no)?;
        energies.push(energy * energy_scale);
        values.push(value);
    }

    FilterTransmittance::tabulated(name, energies, values).map_err(|e| HopgError::ParseError {
        format: FORMAT.to_string(),
        path: source_name.to_string(),
        reason: e.to_string(),
    })
}

fn load_table(table: &FilterTable) -> Result<FilterTransmittance> {
    parse_transmittance_file(&table.path, &table.name, table.energy_scale)
}

/// 按配置载入两片滤片
pub fn load_filters(config: &FilterConfig) -> Result<(FilterTransmittance, FilterTransmittance)> {
    Ok((load_table(&config.primary)?, load_table(&config.secondary)?))
}
