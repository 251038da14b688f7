//! # 标定数据模型
//!
//! 基准线 (能量, 位置)、几何变换常数 s = [s0, s1] 和 Kα 产额结果。
//!
//! ## 依赖关系
//! - 被 `spectrometer/calibration.rs`、`store.rs` 使用
//! - 被 `cli/` 通过 `FromStr` 解析 `--ref E:POS`

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 已知能量的基准线在 IP 上的位置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReference {
    /// 基准线能量 (keV)
    pub energy_kev: f64,
    /// 基准线在 IP 上的位置 (cm)
    pub position_cm: f64,
}

impl CalibrationReference {
    pub fn new(energy_kev: f64, position_cm: f64) -> Self {
        Self {
            energy_kev,
            position_cm,
        }
    }

    /// Cu Kα 默认基准（单基准模式）
    pub fn default_single() -> Self {
        Self::new(8.048, 1.005)
    }

    /// 双基准模式的默认基准对
    pub fn default_pair() -> [Self; 2] {
        [Self::new(8.048, 1.005), Self::new(8.391012, 1.52)]
    }
}

/// 解析 "E:POS" 格式（例如 "8.048:1.005"）
impl FromStr for CalibrationReference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (energy, position) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid reference '{}'. Use ENERGY_KEV:POSITION_CM", s))?;
        let energy_kev: f64 = energy
            .trim()
            .parse()
            .map_err(|_| format!("Invalid reference energy '{}'", energy))?;
        let position_cm: f64 = position
            .trim()
            .parse()
            .map_err(|_| format!("Invalid reference position '{}'", position))?;
        if energy_kev <= 0.0 {
            return Err(format!("Reference energy must be positive, got {}", energy_kev));
        }
        Ok(Self::new(energy_kev, position_cm))
    }
}

/// 几何变换的两个自由常数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParams {
    /// 沿 IP 方向的平移修正 (cm)
    pub s0: f64,
    /// 晶体到 IP 距离（臂长）修正 (cm)
    pub s1: f64,
}

impl CalibrationParams {
    pub fn new(s0: f64, s1: f64) -> Self {
        Self { s0, s1 }
    }

    /// 最近一次持久化的标定结果（G43798），在没有标定记录时作为先验
    pub fn default_prior() -> Self {
        Self::new(-0.00905962, -0.84425207)
    }
}

impl std::fmt::Display for CalibrationParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s = [{:.8}, {:.8}]", self.s0, self.s1)
    }
}

/// 标定方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationMode {
    /// 单基准：只修正 s0
    Single,
    /// 双基准：同时求解 s0, s1
    Two,
}

impl std::fmt::Display for CalibrationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationMode::Single => write!(f, "single-reference"),
            CalibrationMode::Two => write!(f, "two-reference"),
        }
    }
}

/// 单发 Kα 产额
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldResult {
    pub shot_id: String,
    /// 产额 (photons/sr)
    pub yield_photons_per_steradian: f64,
}
