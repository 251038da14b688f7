//! # 能谱绘图
//!
//! 使用 `plotters` 绘制 能量 [keV] - 绝对光子数 [/keV] 曲线，并标注打靶编号。
//! 支持 PNG 和 SVG 输出。
//!
//! ## 依赖关系
//! - 被 `commands/pipeline.rs` 调用
//! - 使用 `models/scan.rs` 的 Spectrum

use crate::error::{HopgError, Result};
use crate::models::Spectrum;

use plotters::prelude::*;
use std::path::{Path, PathBuf};

/// 图像输出路径
pub fn plot_path(output_dir: &Path, shot: &str, use_svg: bool) -> PathBuf {
    let ext = if use_svg { "svg" } else { "png" };
    output_dir.join(format!("HOPG_{}.{}", shot, ext))
}

/// 生成能谱图
pub fn generate_spectrum_plot(
    spectrum: &Spectrum,
    shot: &str,
    output_path: &Path,
    width: u32,
    height: u32,
    use_svg: bool,
) -> Result<()> {
    if spectrum.len() < 2 {
        return Err(HopgError::InsufficientSamples {
            needed: 2,
            got: spectrum.len(),
        });
    }

    if use_svg {
        let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
        draw_spectrum_chart(&root, spectrum, shot)?;
        root.present()
            .map_err(|e| HopgError::PlotError(e.to_string()))?;
    } else {
        let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
        draw_spectrum_chart(&root, spectrum, shot)?;
        root.present()
            .map_err(|e| HopgError::PlotError(e.to_string()))?;
    }
    Ok(())
}

fn draw_spectrum_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    spectrum: &Spectrum,
    shot: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| HopgError::PlotError(format!("{:?}", e)))?;

    let sorted = spectrum.sorted_ascending();
    let (x_min, x_max) = sorted.energy_range().unwrap_or((7.5, 8.5));
    let y_max = sorted.peak_density().unwrap_or(1.0).max(f64::MIN_POSITIVE) * 1.1;
    let y_min = sorted
        .points
        .iter()
        .map(|p| p.photon_density)
        .fold(0.0, f64::min);

    let mut chart = ChartBuilder::on(root)
        .caption(format!("HOPG {}", shot), ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| HopgError::PlotError(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .x_desc("Energy [keV]")
        .y_desc("Absolute Photon Number [/keV]")
        .y_label_formatter(&|v| format!("{:.1e}", v))
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| HopgError::PlotError(format!("{:?}", e)))?;

    let line_color = RGBColor(0, 102, 204);
    chart
        .draw_series(LineSeries::new(
            sorted.points.iter().map(|p| (p.energy_kev, p.photon_density)),
            line_color.stroke_width(2),
        ))
        .map_err(|e| HopgError::PlotError(format!("{:?}", e)))?;

    // 右上角打靶编号
    let label_x = x_max - (x_max - x_min) * 0.2;
    let label_y = y_min + (y_max - y_min) * 0.93;
    chart
        .draw_series(std::iter::once(Text::new(
            format!("Shot {}", shot),
            (label_x, label_y),
            ("sans-serif", 16).into_font().color(&BLACK),
        )))
        .map_err(|e| HopgError::PlotError(format!("{:?}", e)))?;

    Ok(())
}
