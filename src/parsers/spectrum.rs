//! # 能谱 CSV 解析器
//!
//! 读取 `HOPG_<shot>.csv`：两列 (能量 keV, 光子数密度)，无表头。
//!
//! ## 依赖关系
//! - 被 `commands/ka_yield.rs` 使用
//! - 使用 `models/scan.rs` 的 Spectrum

use crate::error::{HopgError, Result};
use crate::models::Spectrum;
use crate::parsers::{parse_number, read_text};
use std::path::Path;

const FORMAT: &str = "spectrum CSV";

/// 解析能谱文件
pub fn parse_spectrum_file(path: &Path) -> Result<Spectrum> {
    let content = read_text(path)?;
    parse_spectrum_content(&content, &path.display().to_string())
}

/// 从字符串内容解析能谱
pub fn parse_spectrum_content(content: &str, source_name: &str) -> Result<Spectrum> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut pairs = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let energy = parse_number(record.get(0), FORMAT, source_name, line)?;
        let density = parse_number(record.get(1), FORMAT, source_name, line)?;
        pairs.push((energy, density));
    }

    if pairs.is_empty() {
        return Err(HopgError::ParseError {
            format: FORMAT.to_string(),
            path: source_name.to_string(),
            reason: "no data rows".to_string(),
        });
    }

    Ok(Spectrum::from_pairs(pairs))
}
