//! # 仪器配置
//!
//! HOPG 谱仪的物理常数、几何常数和校正系数，可由 YAML 文件部分覆盖。
//!
//! ## YAML 示例
//! ```yaml
//! geometry:
//!   lattice_spacing: 3.357
//! correction:
//!   crystal_reflectivity: 5.0e-8
//! filters:
//!   primary:
//!     path: filter/Be_500um_transmittance.dat
//! ```
//!
//! ## 依赖关系
//! - 被 `spectrometer/`、`commands/` 使用
//! - 使用 `serde`, `serde_yaml`

use crate::error::{HopgError, Result};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 完整的仪器配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    pub geometry: GeometryConfig,
    pub correction: CorrectionConfig,
    pub filters: FilterConfig,
    #[serde(rename = "yield")]
    pub yield_: YieldConfig,
    /// 无法得到时间延迟时使用的默认值 (h)
    pub default_time_delay_hours: f64,
}

/// 布拉格几何常数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// HOPG 晶面间距 d (Å)
    pub lattice_spacing: f64,
    /// hc (keV·Å)
    pub hc: f64,
    /// IP 坐标原点偏移 (cm)
    pub origin_offset_cm: f64,
    /// 晶体到 IP 的臂长 (cm)
    pub arm_length_cm: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            lattice_spacing: 3.357,
            hc: 12.3984,
            origin_offset_cm: 13.0,
            arm_length_cm: 50.0,
        }
    }
}

/// 强度 → 光子数的校正系数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// IP 衰减: amplitude * exp(-t/decay_hours) + floor
    pub time_amplitude: f64,
    pub time_decay_hours: f64,
    pub time_floor: f64,
    /// IP 能量响应: slope * E + intercept
    pub energy_slope: f64,
    pub energy_intercept: f64,
    /// 仪器比例常数 k
    pub scale_constant: f64,
    /// 原始强度的乘数
    pub intensity_scale: f64,
    /// 晶体反射率（None 表示不做绝对标定）
    pub crystal_reflectivity: Option<f64>,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            time_amplitude: 0.297,
            time_decay_hours: 57.6,
            time_floor: 0.723,
            energy_slope: 0.17,
            energy_intercept: 2.27,
            scale_constant: 0.0025,
            intensity_scale: 1000.0,
            crystal_reflectivity: Some(5.0e-8),
        }
    }
}

/// 单个滤片透过率表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterTable {
    pub name: String,
    pub path: PathBuf,
    /// 表中能量列乘以该系数得到 keV
    #[serde(default = "default_energy_scale")]
    pub energy_scale: f64,
}

fn default_energy_scale() -> f64 {
    1.0e-3
}

/// 两片滤片
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub primary: FilterTable,
    pub secondary: FilterTable,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            primary: FilterTable {
                name: "Be 500um".to_string(),
                path: PathBuf::from("filter/Be_500um_transmittance.dat"),
                energy_scale: default_energy_scale(),
            },
            secondary: FilterTable {
                name: "CH2 50um".to_string(),
                path: PathBuf::from("filter/CH2_50um_transmittance.dat"),
                energy_scale: default_energy_scale(),
            },
        }
    }
}

/// Kα 产额积分参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YieldConfig {
    /// 积分窗口 [min, max) (keV)
    pub window_kev: (f64, f64),
    /// 本底窗口 (min, max) (keV)
    pub background_kev: (f64, f64),
    /// 晶体积分反射率
    pub reflectivity: f64,
    /// 几何接收比；None 时由谱仪几何计算
    pub reflectivity2: Option<f64>,
    /// 立体角 (sr)；None 时由谱仪几何计算
    pub solid_angle: Option<f64>,
}

impl Default for YieldConfig {
    fn default() -> Self {
        Self {
            window_kev: (8.0, 8.1),
            background_kev: (7.9, 7.99),
            reflectivity: 0.3019,
            reflectivity2: None,
            solid_angle: None,
        }
    }
}

impl InstrumentConfig {
    /// 读取 YAML 配置；未给出路径时使用默认值
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Err(HopgError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let yaml = std::fs::read_to_string(path).map_err(|e| HopgError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: Self = serde_yaml::from_str(&yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let g = &self.geometry;
        if g.lattice_spacing <= 0.0 || g.hc <= 0.0 {
            return Err(HopgError::InvalidArgument(
                "lattice_spacing and hc must be positive".to_string(),
            ));
        }
        if self.correction.time_decay_hours <= 0.0 {
            return Err(HopgError::InvalidArgument(
                "time_decay_hours must be positive".to_string(),
            ));
        }
        let (lo, hi) = self.yield_.window_kev;
        if hi <= lo {
            return Err(HopgError::InvalidRange(format!("yield window {}-{}", lo, hi)));
        }
        let (lo, hi) = self.yield_.background_kev;
        if hi <= lo {
            return Err(HopgError::InvalidRange(format!(
                "background window {}-{}",
                lo, hi
            )));
        }
        if self.default_time_delay_hours < 0.0 {
            return Err(HopgError::InvalidArgument(
                "default_time_delay_hours must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InstrumentConfig::load(None).unwrap();
        assert_eq!(config.geometry.lattice_spacing, 3.357);
        assert_eq!(config.correction.crystal_reflectivity, Some(5.0e-8));
        assert_eq!(config.yield_.window_kev, (8.0, 8.1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_overrides_only_named_fields() {
        let yaml = "geometry:\n  lattice_spacing: 3.354\ncorrection:\n  crystal_reflectivity: null\n";
        let config: InstrumentConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.geometry.lattice_spacing, 3.354);
        assert_eq!(config.geometry.arm_length_cm, 50.0);
        assert_eq!(config.correction.crystal_reflectivity, None);
        assert_eq!(config.correction.scale_constant, 0.0025);
        assert_eq!(
            config.filters.primary.path,
            PathBuf::from("filter/Be_500um_transmittance.dat")
        );
    }

    #[test]
    fn test_missing_config_file() {
        let path = Path::new("/nonexistent/hopg_instrument.yaml");
        assert!(matches!(
            InstrumentConfig::load(Some(path)),
            Err(HopgError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_window_rejected() {
        let mut config = InstrumentConfig::default();
        config.yield_.window_kev = (8.1, 8.0);
        assert!(config.validate().is_err());
    }
}
