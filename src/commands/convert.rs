//! # convert 子命令实现
//!
//! 单基准换算：以标定记录中的 s 为先验，按选定的基准线位置修正 s0，
//! 再把扫描换算为光子能谱。
//!
//! ## 功能
//! - 支持单文件和批量目录处理
//! - 批量模式并行（rayon），结果按文件顺序汇总
//! - 每个阶段的失败都带打靶编号与阶段名输出
//!
//! ## 依赖关系
//! - 使用 `cli/convert.rs` 定义的 ConvertArgs
//! - 使用 `batch/` 模块进行批量处理
//! - 使用 `commands/pipeline.rs`, `lookup/`, `store.rs`

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::convert::{ConvertArgs, PickerKind};
use crate::commands::pipeline::{parse_range, Pipeline, WrittenFiles};
use crate::error::{HopgError, Result, StageContext};
use crate::lookup::{
    pick_reference_position, FixedPosition, MaxIntensityPicker, PickSource, PromptPicker,
    ReferencePicker, ResolvedDelay,
};
use crate::models::{CalibrationParams, CalibrationReference, ShotId};
use crate::parsers;
use crate::spectrometer::calibrate_single;
use crate::store::CalibrationStore;
use crate::utils::output;

use std::path::{Path, PathBuf};

/// 所有扫描共享的只读设置
struct ConvertContext {
    pipeline: Pipeline,
    prior: CalibrationParams,
    picker: Box<dyn ReferencePicker>,
    reference_energy: f64,
    recalibrate: bool,
    overwrite: bool,
}

/// 单个扫描的换算结果
#[derive(Debug)]
struct ConvertOutcome {
    shot: ShotId,
    params: CalibrationParams,
    reference: Option<(f64, PickSource)>,
    delay: ResolvedDelay,
    samples: usize,
    energy_range: Option<(f64, f64)>,
    peak: Option<f64>,
    total_photons: f64,
    written: WrittenFiles,
    notes: Vec<String>,
}

/// 执行单基准换算
pub fn execute(args: ConvertArgs) -> Result<()> {
    output::print_header("HOPG Spectrum Conversion");

    if args.input.is_file() {
        let context = build_context(&args, true)?;
        execute_single_file(&args.input, &context)
    } else if args.input.is_dir() {
        // 终端交互只在串行时可用
        let interactive = args.jobs == 1;
        if args.picker == PickerKind::Prompt && !interactive {
            return Err(HopgError::InvalidArgument(
                "--picker prompt needs --jobs 1".to_string(),
            ));
        }
        let context = build_context(&args, interactive)?;
        execute_batch(&args, &context)
    } else {
        Err(HopgError::FileNotFound {
            path: args.input.display().to_string(),
        })
    }
}

fn build_context(args: &ConvertArgs, interactive: bool) -> Result<ConvertContext> {
    let mut pipeline = Pipeline::from_args(&args.common)?;
    output::print_info(&format!("Filters: {}", pipeline.filter_summary()));
    if !interactive {
        pipeline.set_interactive(false);
    }

    let store = CalibrationStore::load(&args.common.store).stage("load calibration store")?;
    let prior = store.prior();
    match store.latest() {
        Some(record) => output::print_info(&format!(
            "Prior from {} ({} calibration, {}): {}",
            record.shot_id,
            record.mode,
            record.created_at.format("%Y-%m-%d %H:%M"),
            prior
        )),
        None => output::print_info(&format!("Prior (built-in default): {}", prior)),
    }

    let picker: Box<dyn ReferencePicker> = match args.picker {
        PickerKind::Fixed => Box::new(FixedPosition(args.reference_position)),
        PickerKind::Max => match &args.search_range {
            Some(range) => {
                let (lo, hi) = parse_range(range)?;
                Box::new(MaxIntensityPicker::within(lo, hi))
            }
            None => Box::new(MaxIntensityPicker::default()),
        },
        PickerKind::Prompt => Box::new(PromptPicker),
    };

    if args.reference_energy <= 0.0 {
        return Err(HopgError::InvalidArgument(format!(
            "--reference-energy must be positive, got {}",
            args.reference_energy
        )));
    }

    pipeline.prepare_output_dir()?;

    Ok(ConvertContext {
        pipeline,
        prior,
        picker,
        reference_energy: args.reference_energy,
        recalibrate: !args.no_recalibrate,
        overwrite: args.overwrite,
    })
}

/// 单文件模式
fn execute_single_file(input: &Path, context: &ConvertContext) -> Result<()> {
    output::print_info(&format!("Single file mode: '{}'", input.display()));

    let outcome = process_scan(input, context)?;
    for note in &outcome.notes {
        output::print_warning(note);
    }
    print_outcome(&outcome);
    output::print_done("Conversion complete");
    Ok(())
}

/// 批量处理模式
fn execute_batch(args: &ConvertArgs, context: &ConvertContext) -> Result<()> {
    output::print_info(&format!("Batch mode: directory '{}'", args.input.display()));

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect();

    if files.is_empty() {
        output::print_warning(&format!(
            "No matching files found with pattern '{}'",
            args.pattern
        ));
        return Ok(());
    }

    output::print_info(&format!("Found {} scan files", files.len()));

    let runner = BatchRunner::new(args.jobs);
    let result = runner.run(files, |file: &PathBuf, pb| {
        let shot = match ShotId::from_path(file) {
            Ok(shot) => shot,
            Err(e) => return ProcessResult::Failed(file.display().to_string(), e.to_string()),
        };

        if !context.overwrite && context.pipeline.output_exists(&shot) {
            pb.suspend(|| output::print_skip(&format!("{}: spectrum exists", shot)));
            return ProcessResult::Skipped(shot.to_string());
        }

        match process_scan(file, context) {
            Ok(outcome) => {
                pb.suspend(|| {
                    for note in &outcome.notes {
                        output::print_warning(note);
                    }
                    output::print_written(&shot.to_string(), &outcome.written.spectrum);
                });
                ProcessResult::Success(outcome)
            }
            Err(e) => {
                pb.suspend(|| output::print_error(&format!("{}: {}", shot, e)));
                ProcessResult::Failed(shot.to_string(), e.to_string())
            }
        }
    })?;

    output::print_separator();
    output::print_success(&format!(
        "Batch complete: {} success, {} skipped, {} failed",
        result.success, result.skipped, result.failed
    ));

    print_summary_table(&result.outputs);

    if !result.failures.is_empty() {
        output::print_warning("Failed scans:");
        for (shot, err) in result.failures.iter().take(10) {
            output::print_error(&format!("  {}: {}", shot, err));
        }
        if result.failures.len() > 10 {
            output::print_warning(&format!("  ... and {} more", result.failures.len() - 10));
        }
    }

    Ok(())
}

/// 处理单个扫描：读取 → 定位基准线 → 修正 s0 → 时间延迟 → 换算 → 写出
fn process_scan(path: &Path, context: &ConvertContext) -> Result<ConvertOutcome> {
    let shot = ShotId::from_path(path).stage("shot id")?;
    let scan = parsers::parse_scan_file(path).stage("read scan")?;
    let mut notes = Vec::new();

    let (params, reference) = if context.recalibrate {
        let (position, source) = pick_reference_position(context.picker.as_ref(), &scan);
        if source != PickSource::Picker {
            notes.push(format!(
                "{}: picker '{}' gave no position, using {} at {:.4} cm",
                shot,
                context.picker.name(),
                source,
                position
            ));
        }
        let reference = CalibrationReference::new(context.reference_energy, position);
        let solution = calibrate_single(&context.pipeline.geometry, &context.prior, &reference)
            .stage("calibrate")?;
        (solution.params, Some((position, source)))
    } else {
        (context.prior, None)
    };

    let delay = context
        .pipeline
        .resolve_delay(&shot, path)
        .stage("time delay")?;
    notes.extend(delay.notes.iter().cloned());

    let spectrum = context
        .pipeline
        .convert(&scan, &params, delay.delay)
        .stage("convert")?;

    let written = context
        .pipeline
        .write_outputs(&shot, &spectrum)
        .stage("write")?;

    Ok(ConvertOutcome {
        shot,
        params,
        reference,
        delay,
        samples: spectrum.len(),
        energy_range: spectrum.energy_range(),
        peak: spectrum.peak_density(),
        total_photons: spectrum.integrated_photons(),
        written,
        notes,
    })
}

/// 打印单个扫描的结果
fn print_outcome(outcome: &ConvertOutcome) {
    let shot = outcome.shot.to_string();
    if let Some((position, source)) = outcome.reference {
        output::print_info(&format!(
            "Reference line at {:.4} cm ({})",
            position, source
        ));
    }
    output::print_info(&format!("{}", outcome.params));
    output::print_info(&format!(
        "Time delay: {} [{}]",
        outcome.delay.delay, outcome.delay.source
    ));
    if let Some((lo, hi)) = outcome.energy_range {
        output::print_info(&format!(
            "{} samples, {:.4} - {:.4} keV, {:.3e} photons",
            outcome.samples, lo, hi, outcome.total_photons
        ));
    }
    for path in outcome.written.all() {
        output::print_written(&shot, path);
    }
}

/// 打印批量结果汇总
fn print_summary_table(outcomes: &[ConvertOutcome]) {
    use tabled::{Table, Tabled};

    #[derive(Tabled)]
    struct SummaryRow {
        #[tabled(rename = "Shot")]
        shot: String,
        #[tabled(rename = "s0 (cm)")]
        s0: String,
        #[tabled(rename = "Delay (min)")]
        delay: String,
        #[tabled(rename = "E range (keV)")]
        range: String,
        #[tabled(rename = "Peak (/keV)")]
        peak: String,
    }

    let rows: Vec<SummaryRow> = outcomes
        .iter()
        .map(|o| SummaryRow {
            shot: o.shot.to_string(),
            s0: format!("{:.6}", o.params.s0),
            delay: format!("{:.1}", o.delay.delay.minutes()),
            range: o
                .energy_range
                .map(|(lo, hi)| format!("{:.3} - {:.3}", lo, hi))
                .unwrap_or_else(|| "-".to_string()),
            peak: o
                .peak
                .map(|p| format!("{:.3e}", p))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    if !rows.is_empty() {
        println!("{}", Table::new(&rows));
    }
}
