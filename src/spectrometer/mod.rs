//! # HOPG 谱仪计算模块
//!
//! 从 IP 扫描到绝对光子能谱、再到 Kα 产额的全部纯计算。
//!
//! ## 子模块
//! - `geometry`: 位置 ↔ 布拉格角 ↔ 能量，dE/dx
//! - `calibration`: 单基准 / 双基准标定
//! - `spline`: 三次样条插值
//! - `correction`: 时间、能量、滤片、反射率校正
//! - `converter`: 扫描 → 能谱
//! - `integrate`: Kα 产额积分
//! - `export`: 能谱与产额输出
//! - `plot`: 能谱图
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/`, `config.rs`

pub mod calibration;
pub mod converter;
pub mod correction;
pub mod export;
pub mod geometry;
pub mod integrate;
pub mod plot;
pub mod spline;

pub use calibration::{calibrate_single, calibrate_two, CalibrationSolution};
pub use converter::{normalize_by_drive_energy, SpectrumConverter};
pub use correction::{CorrectionModel, EnergyResponse, FilterTransmittance, TimeResponse};
pub use geometry::Geometry;
pub use integrate::{EnergyWindow, YieldGeometry, YieldIntegrator};
