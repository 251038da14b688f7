//! # 强度校正模型
//!
//! 把 IP 原始强度 (PSL) 换算为绝对光子数密度所需的各项乘性校正：
//! - IP 随时间的衰减
//! - IP 的能量响应
//! - 两片滤片的透过率（三次样条插值）
//! - 晶体反射率（可选）
//!
//! ```text
//! factor  = time(t) · energy(E) · k · dE/dx · f1(E) · f2(E) [· R]
//! density = raw · scale / factor
//! ```
//!
//! ## 依赖关系
//! - 被 `spectrometer/converter.rs` 使用
//! - 使用 `spectrometer/spline.rs`, `config.rs`

use crate::config::CorrectionConfig;
use crate::error::{HopgError, Result};
use crate::models::TimeDelay;
use crate::spectrometer::spline::CubicSpline;

/// IP 灵敏度随时间的衰减
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeResponse {
    pub amplitude: f64,
    pub decay_hours: f64,
    pub floor: f64,
}

impl TimeResponse {
    pub fn at(&self, delay: TimeDelay) -> f64 {
        self.amplitude * (-delay.hours() / self.decay_hours).exp() + self.floor
    }
}

impl Default for TimeResponse {
    fn default() -> Self {
        Self {
            amplitude: 0.297,
            decay_hours: 57.6,
            floor: 0.723,
        }
    }
}

/// IP 的线性能量响应
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyResponse {
    pub slope: f64,
    pub intercept: f64,
}

impl EnergyResponse {
    pub fn at(&self, energy_kev: f64) -> f64 {
        self.slope * energy_kev + self.intercept
    }
}

impl Default for EnergyResponse {
    fn default() -> Self {
        Self {
            slope: 0.17,
            intercept: 2.27,
        }
    }
}

/// 滤片透过率
#[derive(Debug, Clone, PartialEq)]
pub enum FilterTransmittance {
    /// 由 (能量 keV, 透过率) 表格插值
    Tabulated { name: String, spline: CubicSpline },
    /// 全能量范围恒定透过率
    Flat(f64),
}

impl FilterTransmittance {
    /// 全透滤片
    pub fn unity() -> Self {
        FilterTransmittance::Flat(1.0)
    }

    pub fn tabulated(name: impl Into<String>, energies_kev: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        Ok(FilterTransmittance::Tabulated {
            name: name.into(),
            spline: CubicSpline::new(energies_kev, values)?,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            FilterTransmittance::Tabulated { name, .. } => name,
            FilterTransmittance::Flat(_) => "flat",
        }
    }

    /// 表格定义域（Flat 为 None）
    pub fn domain(&self) -> Option<(f64, f64)> {
        match self {
            FilterTransmittance::Tabulated { spline, .. } => Some(spline.domain()),
            FilterTransmittance::Flat(_) => None,
        }
    }

    /// 查询透过率；超出表格范围为错误
    pub fn at(&self, energy_kev: f64) -> Result<f64> {
        match self {
            FilterTransmittance::Flat(value) => Ok(*value),
            FilterTransmittance::Tabulated { name, spline } => {
                spline.evaluate(energy_kev).ok_or_else(|| {
                    let (min, max) = spline.domain();
                    HopgError::InterpolationOutOfRange {
                        filter: name.clone(),
                        energy: energy_kev,
                        min,
                        max,
                    }
                })
            }
        }
    }
}

/// 组合校正模型
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionModel {
    pub time_response: TimeResponse,
    pub energy_response: EnergyResponse,
    pub filter1: FilterTransmittance,
    pub filter2: FilterTransmittance,
    /// 仪器比例常数 k
    pub scale_constant: f64,
    /// 原始强度乘数
    pub intensity_scale: f64,
    pub crystal_reflectivity: Option<f64>,
}

impl CorrectionModel {
    pub fn new(
        config: &CorrectionConfig,
        filter1: FilterTransmittance,
        filter2: FilterTransmittance,
    ) -> Self {
        Self {
            time_response: TimeResponse {
                amplitude: config.time_amplitude,
                decay_hours: config.time_decay_hours,
                floor: config.time_floor,
            },
            energy_response: EnergyResponse {
                slope: config.energy_slope,
                intercept: config.energy_intercept,
            },
            filter1,
            filter2,
            scale_constant: config.scale_constant,
            intensity_scale: config.intensity_scale,
            crystal_reflectivity: config.crystal_reflectivity,
        }
    }

    /// 去掉晶体反射率（相对谱）
    pub fn without_reflectivity(mut self) -> Self {
        self.crystal_reflectivity = None;
        self
    }

    /// 组合校正因子
    pub fn factor(&self, energy_kev: f64, dedx: f64, delay: TimeDelay) -> Result<f64> {
        let mut factor = self.time_response.at(delay)
            * self.energy_response.at(energy_kev)
            * self.scale_constant
            * dedx
            * self.filter1.at(energy_kev)?
            * self.filter2.at(energy_kev)?;

        if let Some(r) = self.crystal_reflectivity {
            factor *= r;
        }
        Ok(factor)
    }

    /// 原始强度 → 光子数密度
    pub fn photon_density(
        &self,
        raw_intensity: f64,
        energy_kev: f64,
        dedx: f64,
        delay: TimeDelay,
    ) -> Result<f64> {
        let factor = self.factor(energy_kev, dedx, delay)?;
        if factor == 0.0 || !factor.is_finite() {
            return Err(HopgError::domain(
                "photon_density",
                format!("correction factor is {} at {:.4} keV", factor, energy_kev),
            ));
        }
        Ok(raw_intensity * self.intensity_scale / factor)
    }
}

impl Default for CorrectionModel {
    fn default() -> Self {
        Self::new(
            &CorrectionConfig::default(),
            FilterTransmittance::unity(),
            FilterTransmittance::unity(),
        )
    }
}
