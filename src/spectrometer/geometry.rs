//! # 布拉格几何模型
//!
//! IP 位置 ↔ 布拉格角 ↔ 光子能量 的换算，以及能量分辨 dE/dx。
//!
//! ## 公式
//! ```text
//! θ(x)   = atan((b - x) / c),   b = origin + s0,  c = arm - s1
//! E(θ)   = hc / (2 d sinθ)
//! θ(E)   = asin(hc / (2 d E))
//! dE/dx  = (hc / 2d) · 2cosθ / (cos2θ - 1) · dθ/dx
//! dθ/dx  = -c / (c² + (b - x)²)
//! ```
//!
//! θ → 0 时 cos2θ - 1 → 0，dE/dx 发散；此时返回定义域错误而不是 Inf/NaN。
//!
//! ## 依赖关系
//! - 被 `spectrometer/calibration.rs`, `spectrometer/converter.rs` 使用
//! - 使用 `config.rs` 的 GeometryConfig

use crate::config::GeometryConfig;
use crate::error::{HopgError, Result};
use crate::models::{CalibrationParams, ScanSample};

/// cos2θ - 1 的最小允许绝对值
const SINGULARITY_EPS: f64 = 1e-12;

/// 谱仪几何（构造后不可变）
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// 晶面间距 d (Å)
    lattice_spacing: f64,
    /// hc (keV·Å)
    hc: f64,
    /// IP 原点偏移 (cm)
    origin_offset: f64,
    /// 臂长 (cm)
    arm_length: f64,
}

impl Geometry {
    pub fn new(config: &GeometryConfig) -> Self {
        Self {
            lattice_spacing: config.lattice_spacing,
            hc: config.hc,
            origin_offset: config.origin_offset_cm,
            arm_length: config.arm_length_cm,
        }
    }

    pub fn lattice_spacing(&self) -> f64 {
        self.lattice_spacing
    }

    pub fn origin_offset(&self) -> f64 {
        self.origin_offset
    }

    pub fn arm_length(&self) -> f64 {
        self.arm_length
    }

    /// b = origin + s0
    pub fn offset(&self, s: &CalibrationParams) -> f64 {
        self.origin_offset + s.s0
    }

    /// c = arm - s1
    pub fn effective_arm(&self, s: &CalibrationParams) -> f64 {
        self.arm_length - s.s1
    }

    /// IP 位置 → 布拉格角 (rad)
    pub fn position_to_angle(&self, position_cm: f64, s: &CalibrationParams) -> Result<f64> {
        let c = self.effective_arm(s);
        if c == 0.0 || !c.is_finite() {
            return Err(HopgError::domain(
                "position_to_angle",
                format!("effective arm length is {} (s1 = {})", c, s.s1),
            ));
        }
        Ok(((self.offset(s) - position_cm) / c).atan())
    }

    /// 布拉格角 → IP 位置 (cm)
    pub fn angle_to_position(&self, theta: f64, s: &CalibrationParams) -> f64 {
        self.offset(s) - self.effective_arm(s) * theta.tan()
    }

    /// 布拉格角 → 光子能量 (keV)
    pub fn angle_to_energy(&self, theta: f64) -> Result<f64> {
        let sin_theta = theta.sin();
        if !(sin_theta > 0.0) {
            return Err(HopgError::domain(
                "angle_to_energy",
                format!("sin(θ) = {:.3e} must be positive (θ = {:.6} rad)", sin_theta, theta),
            ));
        }
        Ok(self.hc / (2.0 * self.lattice_spacing * sin_theta))
    }

    /// 光子能量 → 布拉格角 (rad)
    pub fn energy_to_angle(&self, energy_kev: f64) -> Result<f64> {
        if !(energy_kev > 0.0) {
            return Err(HopgError::domain(
                "energy_to_angle",
                format!("energy must be positive, got {} keV", energy_kev),
            ));
        }
        let arg = self.hc / (2.0 * self.lattice_spacing * energy_kev);
        if arg > 1.0 {
            return Err(HopgError::domain(
                "energy_to_angle",
                format!(
                    "{:.4} keV is below the minimum measurable energy {:.4} keV (asin argument {:.6} > 1)",
                    energy_kev,
                    self.minimum_energy(),
                    arg
                ),
            ));
        }
        Ok(arg.asin())
    }

    /// 该几何可测的最低能量（θ = 90°）
    pub fn minimum_energy(&self) -> f64 {
        self.hc / (2.0 * self.lattice_spacing)
    }

    /// IP 位置 → 光子能量 (keV)
    pub fn position_to_energy(&self, position_cm: f64, s: &CalibrationParams) -> Result<f64> {
        let theta = self.position_to_angle(position_cm, s)?;
        self.angle_to_energy(theta)
    }

    /// 能量分辨 dE/dx (keV/cm)
    pub fn dedx(&self, position_cm: f64, s: &CalibrationParams) -> Result<f64> {
        let b = self.offset(s);
        let c = self.effective_arm(s);
        let theta = self.position_to_angle(position_cm, s)?;

        let denom = (2.0 * theta).cos() - 1.0;
        if denom.abs() < SINGULARITY_EPS {
            return Err(HopgError::domain(
                "dedx",
                format!(
                    "near-normal singularity at x = {:.4} cm (θ = {:.3e} rad)",
                    position_cm, theta
                ),
            ));
        }

        let dtheta_dx = -c / (c * c + (b - position_cm).powi(2));
        Ok((self.hc / (2.0 * self.lattice_spacing)) * (2.0 * theta.cos()) / denom * dtheta_dx)
    }

    /// 扫描覆盖的能量范围 (min, max)
    pub fn energy_range(
        &self,
        scan: &[ScanSample],
        s: &CalibrationParams,
    ) -> Result<Option<(f64, f64)>> {
        let mut range: Option<(f64, f64)> = None;
        for sample in scan {
            let e = self.position_to_energy(sample.position_cm, s)?;
            range = Some(match range {
                None => (e, e),
                Some((lo, hi)) => (lo.min(e), hi.max(e)),
            });
        }
        Ok(range)
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(&GeometryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> Geometry {
        Geometry::default()
    }

    #[test]
    fn test_energy_angle_round_trip() {
        let g = geometry();
        for &e in &[1.9, 2.5, 4.51, 8.048, 8.391012, 12.0, 20.0, 50.0] {
            let theta = g.energy_to_angle(e).unwrap();
            let back = g.angle_to_energy(theta).unwrap();
            assert!((back - e).abs() < 1e-9, "E = {}: got {}", e, back);
        }
    }

    #[test]
    fn test_position_angle_round_trip() {
        let g = geometry();
        let params = [
            CalibrationParams::new(0.0, 0.0),
            CalibrationParams::default_prior(),
            CalibrationParams::new(0.3, 2.0),
        ];
        for s in &params {
            for i in 0..20 {
                let x = -2.0 + i as f64 * 0.7;
                let theta = g.position_to_angle(x, s).unwrap();
                let back = g.angle_to_position(theta, s);
                assert!((back - x).abs() < 1e-9, "x = {}: got {}", x, back);
            }
        }
    }

    #[test]
    fn test_energy_below_minimum_is_domain_error() {
        let g = geometry();
        // hc / 2d ≈ 1.8467 keV
        let e_min = g.minimum_energy();
        assert!((e_min - 12.3984 / (2.0 * 3.357)).abs() < 1e-12);
        assert!(matches!(
            g.energy_to_angle(e_min * 0.9),
            Err(HopgError::GeometryDomain { .. })
        ));
        assert!(matches!(
            g.energy_to_angle(0.0),
            Err(HopgError::GeometryDomain { .. })
        ));
        assert!(matches!(
            g.energy_to_angle(-8.0),
            Err(HopgError::GeometryDomain { .. })
        ));
    }

    #[test]
    fn test_non_positive_angle_is_domain_error() {
        let g = geometry();
        assert!(g.angle_to_energy(0.0).is_err());
        assert!(g.angle_to_energy(-0.1).is_err());
    }

    #[test]
    fn test_zero_arm_is_domain_error() {
        let g = geometry();
        let s = CalibrationParams::new(0.0, 50.0);
        assert!(matches!(
            g.position_to_angle(1.0, &s),
            Err(HopgError::GeometryDomain { .. })
        ));
    }

    #[test]
    fn test_dedx_matches_finite_difference() {
        let g = geometry();
        let s = CalibrationParams::default_prior();
        let h = 1e-6;
        for &x in &[0.5, 1.0, 2.0, 5.0, 9.0] {
            let analytic = g.dedx(x, &s).unwrap();
            let numeric = (g.position_to_energy(x + h, &s).unwrap()
                - g.position_to_energy(x - h, &s).unwrap())
                / (2.0 * h);
            let rel = ((analytic - numeric) / numeric).abs();
            assert!(rel < 1e-5, "x = {}: analytic {} vs numeric {}", x, analytic, numeric);
            // 位置增大 → θ 减小 → E 增大
            assert!(analytic > 0.0);
        }
    }

    #[test]
    fn test_dedx_singularity_reported() {
        let g = geometry();
        let s = CalibrationParams::new(0.0, 0.0);
        // x = b 处 θ = 0
        assert!(matches!(
            g.dedx(13.0, &s),
            Err(HopgError::GeometryDomain { .. })
        ));
    }

    #[test]
    fn test_energy_range() {
        let g = geometry();
        let s = CalibrationParams::new(0.0, 0.0);
        let scan: Vec<ScanSample> = (0..10).map(|i| ScanSample::new(i as f64, 1.0)).collect();
        let (lo, hi) = g.energy_range(&scan, &s).unwrap().unwrap();
        assert!((lo - g.position_to_energy(0.0, &s).unwrap()).abs() < 1e-12);
        assert!((hi - g.position_to_energy(9.0, &s).unwrap()).abs() < 1e-12);
        assert_eq!(g.energy_range(&[], &s).unwrap(), None);
    }
}
