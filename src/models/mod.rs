//! # 数据模型模块
//!
//! 定义扫描数据、能谱、标定参数和打靶元数据的值类型。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`spectrometer/` 和 `commands/` 使用
//! - 子模块: scan, calibration, shot

pub mod calibration;
pub mod scan;
pub mod shot;

pub use calibration::{CalibrationMode, CalibrationParams, CalibrationReference, YieldResult};
pub use scan::{ScanSample, Spectrum, SpectrumPoint};
pub use shot::{ClockTime, LaserType, ShotId, TimeDelay};
