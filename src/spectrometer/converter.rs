//! # 能谱换算
//!
//! 将 IP 扫描 (位置, 强度) 换算为 (能量, 绝对光子数密度) 能谱。
//!
//! ## 步骤
//! 1. 位置 → 能量（几何模型）
//! 2. 每个采样点的 dE/dx
//! 3. 组合校正因子
//! 4. 强度 / 校正因子 → 光子数密度
//! 5. 可选：按驱动激光能量 (kJ) 归一化
//!
//! 输出与输入一一对应并保持原顺序；不做任何 I/O。
//!
//! ## 依赖关系
//! - 被 `commands/calibrate.rs`, `commands/convert.rs` 调用
//! - 使用 `spectrometer/geometry.rs`, `spectrometer/correction.rs`

use crate::error::{HopgError, Result};
use crate::models::{CalibrationParams, ScanSample, Spectrum, SpectrumPoint, TimeDelay};
use crate::spectrometer::{CorrectionModel, Geometry};

/// 能谱换算器
pub struct SpectrumConverter<'a> {
    geometry: &'a Geometry,
    correction: &'a CorrectionModel,
}

impl<'a> SpectrumConverter<'a> {
    pub fn new(geometry: &'a Geometry, correction: &'a CorrectionModel) -> Self {
        Self {
            geometry,
            correction,
        }
    }

    /// 换算整条扫描；任一点出现定义域错误即中止
    pub fn convert(
        &self,
        scan: &[ScanSample],
        params: &CalibrationParams,
        delay: TimeDelay,
    ) -> Result<Spectrum> {
        let points = scan
            .iter()
            .map(|sample| self.convert_sample(sample, params, delay))
            .collect::<Result<Vec<_>>>()?;

        Ok(Spectrum::new(points))
    }

    fn convert_sample(
        &self,
        sample: &ScanSample,
        params: &CalibrationParams,
        delay: TimeDelay,
    ) -> Result<SpectrumPoint> {
        let energy_kev = self.geometry.position_to_energy(sample.position_cm, params)?;
        let dedx = self.geometry.dedx(sample.position_cm, params)?;
        let photon_density =
            self.correction
                .photon_density(sample.intensity_psl, energy_kev, dedx, delay)?;

        if !photon_density.is_finite() {
            return Err(HopgError::domain(
                "convert",
                format!(
                    "non-finite photon density at x = {:.4} cm ({:.4} keV)",
                    sample.position_cm, energy_kev
                ),
            ));
        }

        Ok(SpectrumPoint {
            energy_kev,
            photon_density,
        })
    }
}

/// 按驱动激光能量 (kJ) 归一化
pub fn normalize_by_drive_energy(spectrum: &Spectrum, drive_energy_kj: f64) -> Result<Spectrum> {
    if !(drive_energy_kj > 0.0) || !drive_energy_kj.is_finite() {
        return Err(HopgError::InvalidArgument(format!(
            "drive energy must be positive, got {} kJ",
            drive_energy_kj
        )));
    }

    Ok(Spectrum::new(
        spectrum
            .points
            .iter()
            .map(|p| SpectrumPoint {
                energy_kev: p.energy_kev,
                photon_density: p.photon_density / drive_energy_kj,
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorrectionConfig;
    use crate::spectrometer::FilterTransmittance;

    fn synthetic_scan() -> Vec<ScanSample> {
        (0..10).map(|i| ScanSample::new(i as f64, 100.0)).collect()
    }

    #[test]
    fn test_end_to_end_synthetic_scan() {
        let geometry = Geometry::default();
        let correction = CorrectionModel::default();
        let converter = SpectrumConverter::new(&geometry, &correction);
        let s = CalibrationParams::new(0.0, 0.0);

        let spectrum = converter.convert(&synthetic_scan(), &s, TimeDelay::ZERO).unwrap();

        assert_eq!(spectrum.len(), 10);
        for p in &spectrum.points {
            assert!(p.energy_kev.is_finite());
            assert!(p.photon_density.is_finite());
            assert!(p.photon_density > 0.0);
        }
        // θ = atan((13 - x)/50) 随 x 增大而减小，E ∝ 1/sinθ 随之增大
        for w in spectrum.points.windows(2) {
            assert!(w[1].energy_kev > w[0].energy_kev);
        }
    }

    #[test]
    fn test_preserves_order_and_length() {
        let geometry = Geometry::default();
        let correction = CorrectionModel::default();
        let converter = SpectrumConverter::new(&geometry, &correction);
        let s = CalibrationParams::default_prior();

        let mut scan = synthetic_scan();
        scan.reverse();
        let spectrum = converter.convert(&scan, &s, TimeDelay::ZERO).unwrap();
        assert_eq!(spectrum.len(), scan.len());
        for (sample, point) in scan.iter().zip(&spectrum.points) {
            let e = geometry.position_to_energy(sample.position_cm, &s).unwrap();
            assert_eq!(point.energy_kev, e);
        }
    }

    #[test]
    fn test_density_matches_manual_chain() {
        let geometry = Geometry::default();
        let correction = CorrectionModel::default();
        let converter = SpectrumConverter::new(&geometry, &correction);
        let s = CalibrationParams::default_prior();
        let delay = TimeDelay::from_minutes(45.0).unwrap();

        let sample = ScanSample::new(1.005, 42.0);
        let spectrum = converter.convert(&[sample], &s, delay).unwrap();

        let e = geometry.position_to_energy(1.005, &s).unwrap();
        let dedx = geometry.dedx(1.005, &s).unwrap();
        let expected = 42.0 * 1000.0
            / (correction.time_response.at(delay)
                * correction.energy_response.at(e)
                * 0.0025
                * dedx
                * 5.0e-8);
        let got = spectrum.points[0].photon_density;
        assert!(((got - expected) / expected).abs() < 1e-12);
    }

    #[test]
    fn test_filter_domain_error_aborts_conversion() {
        let geometry = Geometry::default();
        let narrow = FilterTransmittance::tabulated("narrow", vec![7.0, 7.5, 8.0], vec![0.5, 0.6, 0.7])
            .unwrap();
        let correction = CorrectionModel::new(
            &CorrectionConfig::default(),
            narrow,
            FilterTransmittance::unity(),
        );
        let converter = SpectrumConverter::new(&geometry, &correction);
        let s = CalibrationParams::new(0.0, 0.0);
        assert!(matches!(
            converter.convert(&synthetic_scan(), &s, TimeDelay::ZERO),
            Err(HopgError::InterpolationOutOfRange { .. })
        ));
    }

    #[test]
    fn test_singular_position_aborts_conversion() {
        let geometry = Geometry::default();
        let correction = CorrectionModel::default();
        let converter = SpectrumConverter::new(&geometry, &correction);
        let s = CalibrationParams::new(0.0, 0.0);
        let scan = vec![ScanSample::new(1.0, 1.0), ScanSample::new(13.0, 1.0)];
        assert!(matches!(
            converter.convert(&scan, &s, TimeDelay::ZERO),
            Err(HopgError::GeometryDomain { .. })
        ));
    }

    #[test]
    fn test_normalize_by_drive_energy() {
        let spectrum = Spectrum::from_pairs(vec![(8.0, 10.0), (8.1, 20.0)]);
        let normalized = normalize_by_drive_energy(&spectrum, 2.0).unwrap();
        assert_eq!(normalized.densities(), vec![5.0, 10.0]);
        assert_eq!(normalized.energies(), spectrum.energies());
        assert!(normalize_by_drive_energy(&spectrum, 0.0).is_err());
        assert!(normalize_by_drive_energy(&spectrum, -1.0).is_err());
    }
}
