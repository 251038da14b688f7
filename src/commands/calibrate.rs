//! # calibrate 子命令实现
//!
//! 双基准标定：由两条基准线求出 s0, s1，用新的标定换算该扫描，
//! 换算与写出成功后再记录到标定文件。
//!
//! ## 依赖关系
//! - 使用 `cli/calibrate.rs` 定义的 CalibrateArgs
//! - 使用 `commands/pipeline.rs`, `spectrometer/calibration.rs`, `store.rs`

use crate::cli::calibrate::CalibrateArgs;
use crate::commands::pipeline::Pipeline;
use crate::error::{HopgError, Result, StageContext};
use crate::models::{CalibrationReference, ShotId};
use crate::parsers;
use crate::spectrometer::{calibrate_two, CalibrationSolution, Geometry};
use crate::store::{CalibrationRecord, CalibrationStore};
use crate::utils::output;

/// 执行双基准标定
pub fn execute(args: CalibrateArgs) -> Result<()> {
    output::print_header("HOPG Two-Reference Calibration");

    if !args.scan.is_file() {
        return Err(HopgError::FileNotFound {
            path: args.scan.display().to_string(),
        });
    }

    let shot = ShotId::from_path(&args.scan)?;
    output::print_info(&format!("Shot {} ({})", shot, shot.laser));

    let [first, second] = reference_pair(&args.references)?;
    let pipeline = Pipeline::from_args(&args.common)?;
    output::print_info(&format!(
        "Geometry: d = {} A, b = {} cm, c = {} cm",
        pipeline.geometry.lattice_spacing(),
        pipeline.geometry.origin_offset(),
        pipeline.geometry.arm_length()
    ));
    output::print_info(&format!("Filters: {}", pipeline.filter_summary()));

    let solution = calibrate_two(&pipeline.geometry, &first, &second).stage("calibrate")?;
    print_solution_table(&pipeline.geometry, &solution);
    output::print_success(&format!("{}", solution.params));

    let scan = parsers::parse_scan_file(&args.scan).stage("read scan")?;
    output::print_info(&format!("Loaded {} scan samples", scan.len()));
    if let Some((lo, hi)) = pipeline
        .geometry
        .energy_range(&scan, &solution.params)
        .stage("convert")?
    {
        output::print_info(&format!("Scan covers {:.4} - {:.4} keV", lo, hi));
    }

    let resolved = pipeline.resolve_delay(&shot, &args.scan)?;
    for note in &resolved.notes {
        output::print_warning(note);
    }
    output::print_info(&format!(
        "Time delay: {} [{}]",
        resolved.delay, resolved.source
    ));

    let spectrum = pipeline
        .convert(&scan, &solution.params, resolved.delay)
        .stage("convert")?;

    output::print_info(&format!(
        "Integrated photon number: {:.3e}",
        spectrum.integrated_photons()
    ));

    pipeline.prepare_output_dir()?;
    let written = pipeline.write_outputs(&shot, &spectrum).stage("write")?;
    for path in written.all() {
        output::print_written(&shot.to_string(), path);
    }

    // 换算完成后才作为后续换算的先验
    if !args.no_save {
        let mut store = CalibrationStore::load(&args.common.store).stage("load calibration store")?;
        if let Some(previous) = store.for_shot(&shot.to_string()) {
            output::print_warning(&format!(
                "Previous calibration of {} ({}): {}",
                previous.shot_id,
                previous.created_at.format("%Y-%m-%d %H:%M"),
                previous.params
            ));
        }
        store.record(CalibrationRecord::new(shot.to_string(), &solution));
        store
            .save(&args.common.store)
            .stage("save calibration store")?;
        output::print_info(&format!(
            "Calibration recorded in '{}' ({} entries)",
            args.common.store.display(),
            store.history.len()
        ));
    }

    output::print_done("Calibration complete");
    Ok(())
}

/// 命令行给出的两条基准线；未给出时使用默认基准对
fn reference_pair(references: &[CalibrationReference]) -> Result<[CalibrationReference; 2]> {
    match references {
        [] => Ok(CalibrationReference::default_pair()),
        [a, b] => Ok([*a, *b]),
        other => Err(HopgError::InvalidArgument(format!(
            "two-reference calibration needs exactly two --ref values, got {}",
            other.len()
        ))),
    }
}

/// 打印基准线与标定结果
fn print_solution_table(geometry: &Geometry, solution: &CalibrationSolution) {
    use tabled::{Table, Tabled};

    #[derive(Tabled)]
    struct ReferenceRow {
        #[tabled(rename = "E (keV)")]
        energy: String,
        #[tabled(rename = "x (cm)")]
        position: String,
        #[tabled(rename = "θ (°)")]
        theta: String,
        #[tabled(rename = "E(x) (keV)")]
        reproduced: String,
    }

    let rows: Vec<ReferenceRow> = solution
        .references
        .iter()
        .map(|r| ReferenceRow {
            energy: format!("{:.6}", r.energy_kev),
            position: format!("{:.4}", r.position_cm),
            theta: geometry
                .energy_to_angle(r.energy_kev)
                .map(|t| format!("{:.4}", t.to_degrees()))
                .unwrap_or_else(|_| "-".to_string()),
            reproduced: geometry
                .position_to_energy(r.position_cm, &solution.params)
                .map(|e| format!("{:.6}", e))
                .unwrap_or_else(|_| "-".to_string()),
        })
        .collect();

    println!("{}", Table::new(&rows));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_pair() {
        assert_eq!(
            reference_pair(&[]).unwrap(),
            CalibrationReference::default_pair()
        );
        let a = CalibrationReference::new(6.4, 0.2);
        let b = CalibrationReference::new(7.0, 0.9);
        assert_eq!(reference_pair(&[a, b]).unwrap(), [a, b]);
        assert!(reference_pair(&[a]).is_err());
        assert!(reference_pair(&[a, b, a]).is_err());
    }

    #[test]
    fn test_failed_conversion_leaves_store_untouched() {
        use crate::cli::{Cli, Commands};
        use clap::Parser;

        let dir = std::env::temp_dir().join(format!("hopg_calibrate_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let table = "Filter\n Photon Energy (eV), Transmission\n 1000.0 0.5\n 8000.0 0.7\n 30000.0 0.9\n";
        std::fs::write(dir.join("be.dat"), table).unwrap();
        std::fs::write(dir.join("ch2.dat"), table).unwrap();
        let config = format!(
            "filters:\n  primary:\n    name: Be\n    path: {}\n  secondary:\n    name: CH2\n    path: {}\n",
            dir.join("be.dat").display(),
            dir.join("ch2.dat").display()
        );
        let config_path = dir.join("hopg.yaml");
        std::fs::write(&config_path, config).unwrap();

        // 只有表头，读取扫描阶段失败
        let scan = dir.join("run_G43798_HOPG_1542.csv");
        std::fs::write(&scan, "position,intensity\n").unwrap();
        let store = dir.join("store.yaml");

        let cli = Cli::try_parse_from([
            "hopg".to_string(),
            "calibrate".to_string(),
            scan.display().to_string(),
            "--config".to_string(),
            config_path.display().to_string(),
            "--store".to_string(),
            store.display().to_string(),
            "--output-dir".to_string(),
            dir.join("out").display().to_string(),
            "--no-plot".to_string(),
            "--no-prompt".to_string(),
            "--time-delay".to_string(),
            "0".to_string(),
        ])
        .unwrap();
        let Commands::Calibrate(args) = cli.command else {
            panic!("expected calibrate");
        };

        let err = execute(args).unwrap_err();
        assert!(err.to_string().contains("read scan"), "got {}", err);
        assert!(!store.exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
