//! # 换算流程公共部分
//!
//! `calibrate` 与 `convert` 共用的准备与输出步骤：
//! - 读取仪器配置、滤片透过率表，构造几何与校正模型
//! - 选择打靶时刻来源，解析时间延迟
//! - 换算能谱，写出 CSV / 归一化 CSV / 图像
//!
//! 构造完成后只含只读数据，可在批量任务之间共享。
//!
//! ## 依赖关系
//! - 被 `commands/calibrate.rs`, `commands/convert.rs` 使用
//! - 使用 `spectrometer/`, `parsers/`, `lookup/`

use crate::cli::pipeline::{OutputFormat, PipelineArgs};
use crate::config::InstrumentConfig;
use crate::error::{HopgError, Result, StageContext};
use crate::lookup::{
    DelayResolver, FixedShotTime, NoShotTimeLookup, ResolvedDelay, ShotTimeLookup, ShotTimeTable,
};
use crate::models::{CalibrationParams, ClockTime, ScanSample, ShotId, Spectrum, TimeDelay};
use crate::parsers;
use crate::spectrometer::{
    export, normalize_by_drive_energy, plot, CorrectionModel, Geometry, SpectrumConverter,
};

use std::fs;
use std::path::{Path, PathBuf};

/// 换算流程上下文
pub struct Pipeline {
    pub config: InstrumentConfig,
    pub geometry: Geometry,
    pub correction: CorrectionModel,
    pub output_dir: PathBuf,
    /// None 表示不出图；Some(true) 为 SVG
    pub plot_svg: Option<bool>,
    pub width: u32,
    pub height: u32,
    pub drive_energy_kj: Option<f64>,
    explicit_delay: Option<TimeDelay>,
    lookup: Box<dyn ShotTimeLookup>,
    interactive: bool,
}

/// 单发打靶写出的文件
#[derive(Debug, Clone, Default)]
pub struct WrittenFiles {
    pub spectrum: PathBuf,
    pub normalized: Option<PathBuf>,
    pub plot: Option<PathBuf>,
}

impl WrittenFiles {
    pub fn all(&self) -> Vec<&Path> {
        std::iter::once(self.spectrum.as_path())
            .chain(self.normalized.as_deref())
            .chain(self.plot.as_deref())
            .collect()
    }
}

impl Pipeline {
    pub fn from_args(args: &PipelineArgs) -> Result<Self> {
        let config = InstrumentConfig::load(args.config.as_deref()).stage("load config")?;
        let geometry = Geometry::new(&config.geometry);

        let (filter1, filter2) = parsers::load_filters(&config.filters).stage("load filters")?;
        let mut correction = CorrectionModel::new(&config.correction, filter1, filter2);
        if args.relative {
            correction = correction.without_reflectivity();
        }

        let explicit_delay = args
            .time_delay
            .map(TimeDelay::from_minutes)
            .transpose()?;

        let lookup: Box<dyn ShotTimeLookup> = match (&args.shot_time, &args.shot_times) {
            (Some(time), _) => Box::new(FixedShotTime(time.parse::<ClockTime>()?)),
            (None, Some(table)) => Box::new(ShotTimeTable::from_file(table).stage("load shot times")?),
            (None, None) => Box::new(NoShotTimeLookup),
        };

        if let Some(kj) = args.drive_energy {
            if !(kj > 0.0) {
                return Err(HopgError::InvalidArgument(format!(
                    "--drive-energy must be positive, got {}",
                    kj
                )));
            }
        }

        let plot_svg = match (args.no_plot, args.format) {
            (true, _) | (false, OutputFormat::Csv) => None,
            (false, OutputFormat::Png) => Some(false),
            (false, OutputFormat::Svg) => Some(true),
        };

        Ok(Self {
            config,
            geometry,
            correction,
            output_dir: args.output_dir.clone(),
            plot_svg,
            width: args.width,
            height: args.height,
            drive_energy_kj: args.drive_energy,
            explicit_delay,
            lookup,
            interactive: !args.no_prompt,
        })
    }

    /// 滤片说明，如 `Be 500um (1.000 - 30.000 keV)`
    pub fn filter_summary(&self) -> String {
        [&self.correction.filter1, &self.correction.filter2]
            .iter()
            .map(|f| match f.domain() {
                Some((lo, hi)) => format!("{} ({:.3} - {:.3} keV)", f.name(), lo, hi),
                None => f.name().to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 批量并行时关闭终端交互
    pub fn set_interactive(&mut self, enabled: bool) {
        self.interactive = enabled;
    }

    pub fn prepare_output_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).map_err(|e| HopgError::FileWriteError {
            path: self.output_dir.display().to_string(),
            source: e,
        })
    }

    /// 时间延迟：命令行 → 打靶时刻 → 终端输入 → 配置默认值
    pub fn resolve_delay(&self, shot: &ShotId, scan_path: &Path) -> Result<ResolvedDelay> {
        let fallback = TimeDelay::from_hours(self.config.default_time_delay_hours)?;
        let resolver =
            DelayResolver::new(self.lookup.as_ref(), fallback).interactive(self.interactive);
        Ok(resolver.resolve(self.explicit_delay, shot, scan_path))
    }

    pub fn convert(
        &self,
        scan: &[ScanSample],
        params: &CalibrationParams,
        delay: TimeDelay,
    ) -> Result<Spectrum> {
        SpectrumConverter::new(&self.geometry, &self.correction).convert(scan, params, delay)
    }

    /// 该打靶的能谱是否已存在
    pub fn output_exists(&self, shot: &ShotId) -> bool {
        export::spectrum_path(&self.output_dir, &shot.to_string()).exists()
    }

    /// 写出 CSV、可选的归一化 CSV 和图像
    pub fn write_outputs(&self, shot: &ShotId, spectrum: &Spectrum) -> Result<WrittenFiles> {
        let shot = shot.to_string();

        let spectrum_path = export::spectrum_path(&self.output_dir, &shot);
        export::spectrum_to_csv(spectrum, &spectrum_path)?;

        let normalized = match self.drive_energy_kj {
            Some(kj) => {
                let path = export::normalized_spectrum_path(&self.output_dir, &shot);
                export::spectrum_to_csv(&normalize_by_drive_energy(spectrum, kj)?, &path)?;
                Some(path)
            }
            None => None,
        };

        let plot = match self.plot_svg {
            Some(use_svg) => {
                let path = plot::plot_path(&self.output_dir, &shot, use_svg);
                plot::generate_spectrum_plot(
                    spectrum,
                    &shot,
                    &path,
                    self.width,
                    self.height,
                    use_svg,
                )?;
                Some(path)
            }
            None => None,
        };

        Ok(WrittenFiles {
            spectrum: spectrum_path,
            normalized,
            plot,
        })
    }
}

/// 解析 "min-max" 形式的数值区间
pub fn parse_range(range: &str) -> Result<(f64, f64)> {
    let (min, max) = range
        .split_once('-')
        .ok_or_else(|| HopgError::InvalidRange(range.to_string()))?;

    let min: f64 = min
        .trim()
        .parse()
        .map_err(|_| HopgError::InvalidRange(range.to_string()))?;
    let max: f64 = max
        .trim()
        .parse()
        .map_err(|_| HopgError::InvalidRange(range.to_string()))?;

    if !(max > min) {
        return Err(HopgError::InvalidRange(format!(
            "{} (must be min < max)",
            range
        )));
    }

    Ok((min, max))
}
