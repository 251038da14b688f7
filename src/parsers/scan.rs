//! # IP 扫描 CSV 解析器
//!
//! ## 格式说明
//! ```text
//! position,intensity
//! 0.000, 12.5
//! 0.005, 13.1
//! ...
//! ```
//! 一行表头，逗号分隔，两端空白自动去除；多余的列忽略。
//!
//! ## 依赖关系
//! - 被 `commands/pipeline.rs` 使用
//! - 使用 `models/scan.rs`, `csv`

use crate::error::{HopgError, Result};
use crate::models::ScanSample;
use crate::parsers::{parse_number, read_text};
use std::path::Path;

const FORMAT: &str = "IP scan CSV";

/// 解析扫描文件
pub fn parse_scan_file(path: &Path) -> Result<Vec<ScanSample>> {
    let content = read_text(path)?;
    parse_scan_content(&content, &path.display().to_string())
}

/// 从字符串内容解析扫描数据
pub fn parse_scan_content(content: &str, source_name: &str) -> Result<Vec<ScanSample>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut samples = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        // 空行
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }

        let position = parse_number(record.get(0), FORMAT, source_name, line)?;
        let intensity = parse_number(record.get(1), FORMAT, source_name, line)?;
        samples.push(ScanSample::new(position, intensity));
    }

    if samples.is_empty() {
        return Err(HopgError::ParseError {
            format: FORMAT.to_string(),
            path: source_name.to_string(),
            reason: "no data rows".to_string(),
        });
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan_basic() {
        let content = "x,PSL\n 0.0 , 10.5\n0.01,11\n0.02, 12.25 \n";
        let samples = parse_scan_content(content, "test").unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], ScanSample::new(0.0, 10.5));
        assert_eq!(samples[2], ScanSample::new(0.02, 12.25));
    }

    #[test]
    fn test_parse_scan_extra_columns_ignored() {
        let content = "x,PSL,note\n1.0,2.0,abc\n";
        let samples = parse_scan_content(content, "test").unwrap();
        assert_eq!(samples, vec![ScanSample::new(1.0, 2.0)]);
    }

    #[test]
    fn test_parse_scan_bad_number_reports_line() {
        let content = "x,PSL\n0.0,1.0\n0.1,oops\n";
        match parse_scan_content(content, "scan.csv") {
            Err(HopgError::ParseError { reason, path, .. }) => {
                assert_eq!(path, "scan.csv");
                assert!(reason.contains("line 3"), "{}", reason);
                assert!(reason.contains("oops"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_scan_missing_column() {
        let content = "x,PSL\n0.0\n";
        assert!(parse_scan_content(content, "test").is_err());
    }

    #[test]
    fn test_parse_scan_header_only() {
        assert!(parse_scan_content("x,PSL\n", "test").is_err());
    }

    #[test]
    fn test_missing_file() {
        let path = Path::new("/nonexistent/IP_G43798_HOPG_1530.csv");
        assert!(matches!(
            parse_scan_file(path),
            Err(HopgError::FileNotFound { .. })
        ));
    }
}
