//! # 扫描数据与能谱模型
//!
//! IP 扫描得到的 (位置, 强度) 序列，以及换算后的 (能量, 光子数密度) 能谱。
//!
//! ## 依赖关系
//! - 被 `parsers/scan.rs`, `parsers/spectrum.rs` 构造
//! - 被 `spectrometer/` 消费

use serde::{Deserialize, Serialize};

/// IP 扫描的单个采样点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanSample {
    /// IP 上的位置 (cm)
    pub position_cm: f64,
    /// 原始强度 (PSL)
    pub intensity_psl: f64,
}

impl ScanSample {
    pub fn new(position_cm: f64, intensity_psl: f64) -> Self {
        Self {
            position_cm,
            intensity_psl,
        }
    }
}

/// 能谱中的单个点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumPoint {
    /// 光子能量 (keV)
    pub energy_kev: f64,
    /// 绝对光子数密度 (photons/keV)
    pub photon_density: f64,
}

/// 能谱：与输入扫描一一对应，保持原顺序
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    pub points: Vec<SpectrumPoint>,
}

impl Spectrum {
    pub fn new(points: Vec<SpectrumPoint>) -> Self {
        Self { points }
    }

    /// 从 (能量, 密度) 对构造
    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            points: pairs
                .into_iter()
                .map(|(energy_kev, photon_density)| SpectrumPoint {
                    energy_kev,
                    photon_density,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn energies(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.energy_kev).collect()
    }

    pub fn densities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.photon_density).collect()
    }

    /// 能量范围 (min, max)
    pub fn energy_range(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let min = self
            .points
            .iter()
            .map(|p| p.energy_kev)
            .fold(f64::INFINITY, f64::min);
        let max = self
            .points
            .iter()
            .map(|p| p.energy_kev)
            .fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }

    /// 最大光子数密度
    pub fn peak_density(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.photon_density)
            .fold(None, |acc, d| Some(acc.map_or(d, |m: f64| m.max(d))))
    }

    /// 按能量升序排列的副本（稳定排序）
    pub fn sorted_ascending(&self) -> Spectrum {
        let mut points = self.points.clone();
        points.sort_by(|a, b| {
            a.energy_kev
                .partial_cmp(&b.energy_kev)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Spectrum { points }
    }

    /// 梯形积分得到的总光子数（与能量方向无关）
    pub fn integrated_photons(&self) -> f64 {
        let sorted = self.sorted_ascending();
        sorted
            .points
            .windows(2)
            .map(|w| 0.5 * (w[0].photon_density + w[1].photon_density) * (w[1].energy_kev - w[0].energy_kev))
            .sum()
    }
}
