//! # yield 子命令实现
//!
//! 逐发读取 `HOPG_<shot>.csv`，扣除本底后在 Kα 窗口内积分，
//! 输出 `Ka yield of <shot> is 1.23E+05 [Photon/str]`。
//!
//! - 能谱文件不存在的打靶跳过，并逐发输出跳过原因
//! - 单发失败不影响其他打靶，带编号与阶段输出
//!
//! ## 依赖关系
//! - 使用 `cli/ka_yield.rs` 定义的 YieldArgs
//! - 使用 `spectrometer/integrate.rs`, `spectrometer/export.rs`, `parsers/spectrum.rs`

use crate::cli::ka_yield::YieldArgs;
use crate::commands::pipeline::parse_range;
use crate::config::{InstrumentConfig, YieldConfig};
use crate::error::{HopgError, Result};
use crate::models::{LaserType, ShotId, YieldResult};
use crate::parsers;
use crate::spectrometer::{export, YieldIntegrator};
use crate::utils::{output, progress};

use std::path::{Path, PathBuf};

/// 执行 Kα 产额计算
pub fn execute(args: YieldArgs) -> Result<()> {
    output::print_header("HOPG Ka Yield");

    if !args.data_dir.is_dir() {
        return Err(HopgError::DirectoryNotFound {
            path: args.data_dir.display().to_string(),
        });
    }

    let config = InstrumentConfig::load(args.config.as_deref())?;
    let yield_config = apply_overrides(config.yield_, &args)?;
    let integrator = YieldIntegrator::from_config(&yield_config)?;

    let laser: LaserType = args.laser.into();
    let shots = ShotRange::parse(laser, &args.shots)?;

    output::print_info(&format!(
        "Shots {} - {} ({} candidates)",
        shots.first(),
        shots.last(),
        shots.len()
    ));
    output::print_info(&format!(
        "Window {:.3} - {:.3} keV, background {:.3} - {:.3} keV",
        integrator.window.min_kev,
        integrator.window.max_kev,
        integrator.background.min_kev,
        integrator.background.max_kev
    ));
    output::print_info(&format!(
        "Reflectivity {}, geometric acceptance {:.4e}, solid angle {:.4e} sr",
        integrator.geometry.reflectivity,
        integrator.geometry.reflectivity2,
        integrator.geometry.solid_angle
    ));

    let pb = progress::create_shot_bar(shots.len());
    let mut results = Vec::new();
    let mut missing = 0usize;
    let mut failed = 0usize;

    for shot in shots.iter() {
        pb.set_message(shot.to_string());
        let path = match locate_spectrum(&args.data_dir, &shot) {
            Ok(path) => path,
            Err(reason) => {
                missing += 1;
                pb.suspend(|| output::print_skip(&reason));
                pb.inc(1);
                continue;
            }
        };

        match yield_for_shot(&integrator, &shot, &path) {
            Ok(result) => {
                let line = export::yield_line(&result);
                pb.suspend(|| println!("{}", line));
                if let Some(log) = &args.log {
                    if let Err(e) = export::append_yield_log(&result, log) {
                        pb.suspend(|| {
                            output::print_stage_failure(&result.shot_id, "write log", &e.to_string())
                        });
                    }
                }
                results.push(result);
            }
            Err((stage, e)) => {
                failed += 1;
                pb.suspend(|| output::print_stage_failure(&shot.to_string(), stage, &e.to_string()));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    output::print_separator();
    print_yield_table(&results);
    output::print_success(&format!(
        "{} yields, {} without spectrum, {} failed",
        results.len(),
        missing,
        failed
    ));
    if let Some(log) = &args.log {
        output::print_info(&format!("Appended to '{}'", log.display()));
    }

    Ok(())
}

/// 命令行覆盖配置中的窗口与反射率
fn apply_overrides(mut config: YieldConfig, args: &YieldArgs) -> Result<YieldConfig> {
    if let Some(window) = &args.window {
        config.window_kev = parse_range(window)?;
    }
    if let Some(background) = &args.background {
        config.background_kev = parse_range(background)?;
    }
    if let Some(reflectivity) = args.reflectivity {
        if !(reflectivity > 0.0) {
            return Err(HopgError::InvalidArgument(format!(
                "--reflectivity must be positive, got {}",
                reflectivity
            )));
        }
        config.reflectivity = reflectivity;
    }
    Ok(config)
}

/// 闭区间内的打靶编号，按需逐个生成
#[derive(Debug, Clone, Copy, PartialEq)]
struct ShotRange {
    laser: LaserType,
    first: u32,
    last: u32,
}

impl ShotRange {
    /// 解析 "43775-43803" 或单个编号
    fn parse(laser: LaserType, range: &str) -> Result<Self> {
        let parse = |s: &str| {
            s.trim()
                .parse::<u32>()
                .map_err(|_| HopgError::InvalidRange(range.to_string()))
        };

        let (first, last) = match range.split_once('-') {
            Some((a, b)) => (parse(a)?, parse(b)?),
            None => {
                let n = parse(range)?;
                (n, n)
            }
        };

        if last < first {
            return Err(HopgError::InvalidRange(format!(
                "{} (first shot must not exceed last)",
                range
            )));
        }

        Ok(Self { laser, first, last })
    }

    fn first(&self) -> ShotId {
        ShotId::new(self.laser, self.first)
    }

    fn last(&self) -> ShotId {
        ShotId::new(self.laser, self.last)
    }

    fn len(&self) -> u64 {
        u64::from(self.last - self.first) + 1
    }

    fn iter(&self) -> impl Iterator<Item = ShotId> {
        let laser = self.laser;
        (self.first..=self.last).map(move |n| ShotId::new(laser, n))
    }
}

fn spectrum_file(data_dir: &Path, shot: &ShotId) -> PathBuf {
    export::spectrum_path(data_dir, &shot.to_string())
}

/// 能谱文件路径；不存在时返回跳过原因
fn locate_spectrum(data_dir: &Path, shot: &ShotId) -> std::result::Result<PathBuf, String> {
    let path = spectrum_file(data_dir, shot);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!(
            "{}: spectrum file not found ({})",
            shot,
            path.display()
        ))
    }
}

fn yield_for_shot(
    integrator: &YieldIntegrator,
    shot: &ShotId,
    path: &Path,
) -> std::result::Result<YieldResult, (&'static str, HopgError)> {
    let spectrum = parsers::parse_spectrum_file(path).map_err(|e| ("read spectrum", e))?;
    integrator
        .compute(&shot.to_string(), &spectrum)
        .map_err(|e| ("integrate", e))
}

/// 打印产额汇总
fn print_yield_table(results: &[YieldResult]) {
    use tabled::{Table, Tabled};

    #[derive(Tabled)]
    struct YieldRow {
        #[tabled(rename = "Shot")]
        shot: String,
        #[tabled(rename = "Ka yield (photon/sr)")]
        value: String,
    }

    let rows: Vec<YieldRow> = results
        .iter()
        .map(|r| YieldRow {
            shot: r.shot_id.clone(),
            value: export::format_sci(r.yield_photons_per_steradian, 2),
        })
        .collect();

    if !rows.is_empty() {
        println!("{}", Table::new(&rows));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Spectrum;

    #[test]
    fn test_shot_range_is_inclusive() {
        let shots = ShotRange::parse(LaserType::Gxii, "43775-43777").unwrap();
        let names: Vec<String> = shots.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["G43775", "G43776", "G43777"]);
        assert_eq!(shots.len(), 3);

        let single = ShotRange::parse(LaserType::Lfex, "4012").unwrap();
        assert_eq!(
            single.iter().collect::<Vec<_>>(),
            vec![ShotId::new(LaserType::Lfex, 4012)]
        );

        assert!(ShotRange::parse(LaserType::Gxii, "43803-43775").is_err());
        assert!(ShotRange::parse(LaserType::Gxii, "G43775").is_err());
    }

    #[test]
    fn test_wide_shot_range_is_lazy() {
        let shots = ShotRange::parse(LaserType::Gxii, "0-4000000000").unwrap();
        assert_eq!(shots.len(), 4_000_000_001);
        assert_eq!(shots.last(), ShotId::new(LaserType::Gxii, 4_000_000_000));
        let head: Vec<ShotId> = shots.iter().take(2).collect();
        assert_eq!(
            head,
            vec![ShotId::new(LaserType::Gxii, 0), ShotId::new(LaserType::Gxii, 1)]
        );

        let full = ShotRange::parse(LaserType::Gxii, "0-4294967295").unwrap();
        assert_eq!(full.len(), 4_294_967_296);
    }

    #[test]
    fn test_missing_spectrum_gives_skip_reason() {
        let dir = std::env::temp_dir().join(format!("hopg_locate_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let present = ShotId::new(LaserType::Gxii, 43798);
        let absent = ShotId::new(LaserType::Gxii, 43799);
        std::fs::write(spectrum_file(&dir, &present), "8.0,1.0\n").unwrap();

        assert_eq!(
            locate_spectrum(&dir, &present).unwrap(),
            dir.join("HOPG_G43798.csv")
        );
        let reason = locate_spectrum(&dir, &absent).unwrap_err();
        assert!(reason.starts_with("G43799: spectrum file not found"));
        assert!(reason.contains("HOPG_G43799.csv"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_spectrum_file_name() {
        let shot = ShotId::new(LaserType::Gxii, 43798);
        assert_eq!(
            spectrum_file(Path::new("data"), &shot),
            PathBuf::from("data/HOPG_G43798.csv")
        );
    }

    #[test]
    fn test_yield_for_shot_stages() {
        let integrator = YieldIntegrator::from_config(&YieldConfig::default()).unwrap();
        let shot = ShotId::new(LaserType::Gxii, 1);

        let missing = yield_for_shot(&integrator, &shot, Path::new("/nonexistent/HOPG_G1.csv"));
        assert_eq!(missing.unwrap_err().0, "read spectrum");

        let path = std::env::temp_dir().join(format!("hopg_yield_{}.csv", std::process::id()));
        // 没有本底窗口内的采样点
        let spectrum = Spectrum::from_pairs(vec![(8.0, 1.0), (8.05, 2.0), (8.1, 1.0)]);
        export::spectrum_to_csv(&spectrum, &path).unwrap();
        assert_eq!(
            yield_for_shot(&integrator, &shot, &path).unwrap_err().0,
            "integrate"
        );
        std::fs::remove_file(&path).ok();
    }
}
