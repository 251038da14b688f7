//! # Kα 产额积分
//!
//! 对换算后的能谱扣除本底，在能量窗口内积分光子数，再除以晶体反射率、
//! 几何接收比和立体角，得到每球面度的光子数。
//!
//! ## 步骤
//! 1. 统一为能量升序
//! 2. 本底：窗口 (bg_min, bg_max) 内光子数密度的平均值，从每个点扣除
//! 3. 窗口内少于两个采样点时为 0（没有采样点为错误）；否则边界取最近采样点的下标（距离相同时取较小下标）
//! 4. Σ P_i · (E_{i+1} - E_i)，i ∈ [lo, hi)
//! 5. 除以 reflectivity · reflectivity2 · solid_angle
//!
//! ## 依赖关系
//! - 被 `commands/ka_yield.rs` 调用
//! - 使用 `config.rs` 的 YieldConfig

use crate::config::YieldConfig;
use crate::error::{HopgError, Result};
use crate::models::{Spectrum, YieldResult};

/// 能量窗口
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyWindow {
    pub min_kev: f64,
    pub max_kev: f64,
}

impl EnergyWindow {
    pub fn new(min_kev: f64, max_kev: f64) -> Result<Self> {
        if !(max_kev > min_kev) {
            return Err(HopgError::InvalidRange(format!(
                "{}-{} (max must exceed min)",
                min_kev, max_kev
            )));
        }
        Ok(Self { min_kev, max_kev })
    }

    /// 半开区间 [min, max)
    pub fn contains(&self, energy_kev: f64) -> bool {
        energy_kev >= self.min_kev && energy_kev < self.max_kev
    }

    /// 开区间 (min, max)，用于本底窗口
    pub fn contains_open(&self, energy_kev: f64) -> bool {
        energy_kev > self.min_kev && energy_kev < self.max_kev
    }
}

/// 谱仪接收几何
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldGeometry {
    /// 晶体积分反射率
    pub reflectivity: f64,
    /// 几何接收比
    pub reflectivity2: f64,
    /// 立体角 (sr)
    pub solid_angle: f64,
}

impl YieldGeometry {
    /// 立体角: 4·asin(sin(α/2)·sin(β/2))，α = 2.23°, β = 0.4426°
    pub fn default_solid_angle() -> f64 {
        let a = (2.23_f64 / 2.0).to_radians();
        let b = (0.4426_f64 / 2.0).to_radians();
        4.0 * (a.sin() * b.sin()).asin()
    }

    /// 几何接收比: 0.025 / (500/cos(13.27°) · 2·tan(2.23°/2))
    pub fn default_reflectivity2() -> f64 {
        let path = 500.0 / 13.27_f64.to_radians().cos();
        0.025 / (path * 2.0 * (2.23_f64 / 2.0).to_radians().tan())
    }

    pub fn from_config(config: &YieldConfig) -> Self {
        Self {
            reflectivity: config.reflectivity,
            reflectivity2: config
                .reflectivity2
                .unwrap_or_else(Self::default_reflectivity2),
            solid_angle: config.solid_angle.unwrap_or_else(Self::default_solid_angle),
        }
    }

    pub fn normalization(&self) -> f64 {
        self.reflectivity * self.reflectivity2 * self.solid_angle
    }
}

/// Kα 产额积分器
#[derive(Debug, Clone, PartialEq)]
pub struct YieldIntegrator {
    pub window: EnergyWindow,
    pub background: EnergyWindow,
    pub geometry: YieldGeometry,
}

impl YieldIntegrator {
    pub fn new(window: EnergyWindow, background: EnergyWindow, geometry: YieldGeometry) -> Self {
        Self {
            window,
            background,
            geometry,
        }
    }

    pub fn from_config(config: &YieldConfig) -> Result<Self> {
        Ok(Self::new(
            EnergyWindow::new(config.window_kev.0, config.window_kev.1)?,
            EnergyWindow::new(config.background_kev.0, config.background_kev.1)?,
            YieldGeometry::from_config(config),
        ))
    }

    /// 扣除本底后的能谱（能量升序）
    pub fn subtract_background(&self, spectrum: &Spectrum) -> Result<Spectrum> {
        let sorted = spectrum.sorted_ascending();

        let (sum, count) = sorted
            .points
            .iter()
            .filter(|p| self.background.contains_open(p.energy_kev))
            .fold((0.0, 0usize), |(s, n), p| (s + p.photon_density, n + 1));

        if count == 0 {
            return Err(HopgError::EmptyWindow {
                min: self.background.min_kev,
                max: self.background.max_kev,
            });
        }

        let mean = sum / count as f64;
        Ok(Spectrum::from_pairs(
            sorted
                .points
                .iter()
                .map(|p| (p.energy_kev, p.photon_density - mean)),
        ))
    }

    /// 窗口内光子数（未做立体角归一化）
    pub fn window_photons(&self, spectrum: &Spectrum) -> Result<f64> {
        if spectrum.len() < 2 {
            return Err(HopgError::InsufficientSamples {
                needed: 2,
                got: spectrum.len(),
            });
        }

        let subtracted = self.subtract_background(spectrum)?;
        let energies = subtracted.energies();

        match energies.iter().filter(|&&e| self.window.contains(e)).count() {
            0 => {
                return Err(HopgError::EmptyWindow {
                    min: self.window.min_kev,
                    max: self.window.max_kev,
                })
            }
            // 窗口内只有一个采样点时积分宽度为零
            1 => return Ok(0.0),
            _ => {}
        }

        let lo = nearest_index(&energies, self.window.min_kev);
        let hi = nearest_index(&energies, self.window.max_kev);
        if hi <= lo {
            return Ok(0.0);
        }

        Ok((lo..hi)
            .map(|i| subtracted.points[i].photon_density * (energies[i + 1] - energies[i]))
            .sum())
    }

    /// 产额 (photons/sr)
    pub fn integrate(&self, spectrum: &Spectrum) -> Result<f64> {
        Ok(self.window_photons(spectrum)? / self.geometry.normalization())
    }

    pub fn compute(&self, shot_id: &str, spectrum: &Spectrum) -> Result<YieldResult> {
        Ok(YieldResult {
            shot_id: shot_id.to_string(),
            yield_photons_per_steradian: self.integrate(spectrum)?,
        })
    }
}

/// 最近邻下标，距离相同取较小下标
pub fn nearest_index(values: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, v) in values.iter().enumerate() {
        let dist = (v - target).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integrator() -> YieldIntegrator {
        YieldIntegrator::from_config(&YieldConfig::default()).unwrap()
    }

    /// 7.80 - 8.30 keV，步长 0.01 keV
    fn grid() -> Vec<f64> {
        (0..=50).map(|i| 7.8 + i as f64 * 0.01).collect()
    }

    #[test]
    fn test_default_geometry_constants() {
        let g = YieldGeometry::from_config(&YieldConfig::default());
        let expected_omega =
            4.0 * ((2.23f64 / 2.0 * std::f64::consts::PI / 180.0).sin()
                * (0.4426f64 / 2.0 * std::f64::consts::PI / 180.0).sin())
            .asin();
        assert!((g.solid_angle - expected_omega).abs() < 1e-15);
        assert!(g.solid_angle > 0.0 && g.solid_angle < 1e-3);
        assert!(g.reflectivity2 > 0.0 && g.reflectivity2 < 1.0);
        assert_eq!(g.reflectivity, 0.3019);
    }

    #[test]
    fn test_nearest_index_tie_breaks_low() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(nearest_index(&values, 1.5), 0);
        assert_eq!(nearest_index(&values, 2.5), 1);
        assert_eq!(nearest_index(&values, 2.9), 2);
        assert_eq!(nearest_index(&values, -10.0), 0);
        assert_eq!(nearest_index(&values, 10.0), 2);
    }

    #[test]
    fn test_flat_spectrum_background_subtracts_to_zero() {
        let spectrum = Spectrum::from_pairs(grid().into_iter().map(|e| (e, 123.0)));
        let subtracted = integrator().subtract_background(&spectrum).unwrap();
        let total: f64 = subtracted.densities().iter().sum();
        assert!(total.abs() < 1e-9);
        assert!(integrator().integrate(&spectrum).unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_zero_inside_window_yields_zero() {
        // 窗口内为 0，本底窗口内也为 0，窗口外有信号
        let spectrum = Spectrum::from_pairs(
            grid()
                .into_iter()
                .map(|e| (e, if e > 8.15 { 500.0 } else { 0.0 })),
        );
        assert_eq!(integrator().integrate(&spectrum).unwrap(), 0.0);
    }

    #[test]
    fn test_box_line_integral() {
        // 8.00 ≤ E < 8.10 内高出本底 1000
        let spectrum = Spectrum::from_pairs(grid().into_iter().map(|e| {
            let inside = e >= 8.0 - 1e-9 && e < 8.1 - 1e-9;
            (e, if inside { 1010.0 } else { 10.0 })
        }));
        let it = integrator();
        let photons = it.window_photons(&spectrum).unwrap();
        assert!((photons - 1000.0 * 0.1).abs() < 1e-6, "got {}", photons);

        let y = it.integrate(&spectrum).unwrap();
        assert!((y - photons / it.geometry.normalization()).abs() / y < 1e-12);
    }

    #[test]
    fn test_descending_spectrum_gives_same_result() {
        let ascending = Spectrum::from_pairs(
            grid()
                .into_iter()
                .map(|e| (e, 50.0 + 400.0 * (-(e - 8.048).powi(2) / 0.0004).exp())),
        );
        let mut descending = ascending.clone();
        descending.points.reverse();

        let it = integrator();
        let a = it.integrate(&ascending).unwrap();
        let d = it.integrate(&descending).unwrap();
        assert!(a > 0.0);
        assert!((a - d).abs() / a < 1e-12);
    }

    #[test]
    fn test_single_sample_window_returns_zero() {
        // 只有 8.03 落在 [8.0, 8.1) 内，两端最近点都是它
        let spectrum = Spectrum::from_pairs(vec![
            (7.5, 1.0),
            (7.93, 1.0),
            (8.03, 900.0),
            (8.6, 1.0),
        ]);
        assert_eq!(integrator().integrate(&spectrum).unwrap(), 0.0);
    }

    #[test]
    fn test_single_sample_window_ignores_neighbours() {
        // 8.05 是窗口内唯一的点，最近边界点 7.99 与 8.11 落在窗口外
        let spectrum = Spectrum::from_pairs(vec![
            (7.95, 1.0),
            (7.99, 1.0),
            (8.05, 900.0),
            (8.11, 1.0),
        ]);
        let it = integrator();
        assert_eq!(it.window_photons(&spectrum).unwrap(), 0.0);
        assert_eq!(it.integrate(&spectrum).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_window_is_error() {
        let spectrum = Spectrum::from_pairs(vec![(7.92, 1.0), (7.95, 1.0), (7.98, 1.0)]);
        assert!(matches!(
            integrator().integrate(&spectrum),
            Err(HopgError::EmptyWindow { .. })
        ));
    }

    #[test]
    fn test_missing_background_is_error() {
        let spectrum = Spectrum::from_pairs(vec![(8.0, 1.0), (8.05, 1.0), (8.1, 1.0)]);
        assert!(matches!(
            integrator().integrate(&spectrum),
            Err(HopgError::EmptyWindow { .. })
        ));
    }

    #[test]
    fn test_too_few_samples() {
        let spectrum = Spectrum::from_pairs(vec![(8.05, 1.0)]);
        assert!(matches!(
            integrator().integrate(&spectrum),
            Err(HopgError::InsufficientSamples { .. })
        ));
    }

    #[test]
    fn test_compute_carries_shot_id() {
        let spectrum = Spectrum::from_pairs(grid().into_iter().map(|e| (e, 1.0)));
        let result = integrator().compute("G43798", &spectrum).unwrap();
        assert_eq!(result.shot_id, "G43798");
    }
}
