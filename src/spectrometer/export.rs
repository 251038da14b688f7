//! # 能谱与产额导出
//!
//! 写出换算后的能谱 CSV 和 Kα 产额日志行。
//!
//! ## 格式
//! - 能谱: `HOPG_<shot>.csv`，两列 (能量 keV, 光子数密度)，无表头
//! - 按驱动能量归一化: `HOPG_<shot>_per_kJ.csv`
//! - 产额日志: `Ka yield of <shot> is 1.23E+05 [Photon/str]`
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{HopgError, Result};
use crate::models::{Spectrum, YieldResult};

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// 能谱输出路径
pub fn spectrum_path(output_dir: &Path, shot: &str) -> PathBuf {
    output_dir.join(format!("HOPG_{}.csv", shot))
}

/// 归一化能谱输出路径
pub fn normalized_spectrum_path(output_dir: &Path, shot: &str) -> PathBuf {
    output_dir.join(format!("HOPG_{}_per_kJ.csv", shot))
}

/// 导出能谱为无表头 CSV
pub fn spectrum_to_csv(spectrum: &Spectrum, output_path: &Path) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(output_path)?;

    for p in &spectrum.points {
        wtr.write_record(&[p.energy_kev.to_string(), p.photon_density.to_string()])?;
    }

    wtr.flush().map_err(|e| HopgError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 科学计数法，指数带符号且至少两位，如 `1.23E+05`
pub fn format_sci(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let raw = format!("{:.*E}", precision, value);
    match raw.split_once('E') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exponent),
            };
            format!("{}E{}{:0>2}", mantissa, sign, digits)
        }
        None => raw,
    }
}

/// 产额日志行
pub fn yield_line(result: &YieldResult) -> String {
    format!(
        "Ka yield of {} is {} [Photon/str]",
        result.shot_id,
        format_sci(result.yield_photons_per_steradian, 2)
    )
}

/// 追加一行产额日志
pub fn append_yield_log(result: &YieldResult, log_path: &Path) -> Result<()> {
    let write_err = |e| HopgError::FileWriteError {
        path: log_path.display().to_string(),
        source: e,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(write_err)?;

    writeln!(file, "{}", yield_line(result)).map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hopg_export_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_format_sci() {
        assert_eq!(format_sci(123456.0, 2), "1.23E+05");
        assert_eq!(format_sci(0.000123, 2), "1.23E-04");
        assert_eq!(format_sci(1.0, 2), "1.00E+00");
        assert_eq!(format_sci(-2.5e12, 2), "-2.50E+12");
        assert_eq!(format_sci(0.0, 2), "0.00E+00");
        assert_eq!(format_sci(9.9e123, 1), "9.9E+123");
    }

    #[test]
    fn test_yield_line() {
        let result = YieldResult {
            shot_id: "G43798".to_string(),
            yield_photons_per_steradian: 3.456e10,
        };
        assert_eq!(
            yield_line(&result),
            "Ka yield of G43798 is 3.46E+10 [Photon/str]"
        );
    }

    #[test]
    fn test_spectrum_csv_has_no_header() {
        let path = temp_path("spectrum.csv");
        let spectrum = Spectrum::from_pairs(vec![(8.0, 1.5), (8.1, 2.5)]);
        spectrum_to_csv(&spectrum, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["8,1.5", "8.1,2.5"]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_yield_log_appends() {
        let path = temp_path("yield.log");
        std::fs::remove_file(&path).ok();

        for (shot, y) in [("G1", 1.0e5), ("G2", 2.0e5)] {
            let result = YieldResult {
                shot_id: shot.to_string(),
                yield_photons_per_steradian: y,
            };
            append_yield_log(&result, &path).unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.starts_with("Ka yield of G1 is 1.00E+05"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_output_paths() {
        let dir = Path::new("out");
        assert_eq!(spectrum_path(dir, "L4012"), PathBuf::from("out/HOPG_L4012.csv"));
        assert_eq!(
            normalized_spectrum_path(dir, "L4012"),
            PathBuf::from("out/HOPG_L4012_per_kJ.csv")
        );
    }
}
