//! # 标定求解器
//!
//! 由已知能量的基准线位置确定几何常数 s = [s0, s1]。
//!
//! ## 两种模式
//! - 单基准：以先验 s 为起点，只平移 s0 使基准线落在指定位置。
//!   s1（臂长修正）保持不变，常规打靶假定臂长已事先测定。
//! - 双基准：两条基准线完全确定 s0, s1，解 2×2 线性方程组
//!   `s0 + s1·tanθ_i = arm·tanθ_i + x_i - origin`
//!
//! ## 依赖关系
//! - 被 `commands/calibrate.rs`, `commands/convert.rs` 调用
//! - 使用 `spectrometer/geometry.rs`

use crate::error::{HopgError, Result};
use crate::models::{CalibrationMode, CalibrationParams, CalibrationReference};
use crate::spectrometer::Geometry;

/// 行列式的最小允许绝对值
const SINGULAR_EPS: f64 = 1e-12;

/// 标定结果
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSolution {
    pub params: CalibrationParams,
    pub mode: CalibrationMode,
    pub references: Vec<CalibrationReference>,
}

/// 单基准标定：只修正 s0
pub fn calibrate_single(
    geometry: &Geometry,
    prior: &CalibrationParams,
    reference: &CalibrationReference,
) -> Result<CalibrationSolution> {
    let theta_ref = geometry.energy_to_angle(reference.energy_kev)?;

    let diff = geometry.offset(prior)
        - reference.position_cm
        - geometry.effective_arm(prior) * theta_ref.tan();

    let params = CalibrationParams::new(prior.s0 - diff, prior.s1);

    Ok(CalibrationSolution {
        params,
        mode: CalibrationMode::Single,
        references: vec![*reference],
    })
}

/// 双基准标定：同时求解 s0, s1
pub fn calibrate_two(
    geometry: &Geometry,
    first: &CalibrationReference,
    second: &CalibrationReference,
) -> Result<CalibrationSolution> {
    let theta1 = geometry.energy_to_angle(first.energy_kev)?;
    let theta2 = geometry.energy_to_angle(second.energy_kev)?;
    let t1 = theta1.tan();
    let t2 = theta2.tan();

    // | 1  t1 | |s0|   |r1|
    // | 1  t2 | |s1| = |r2|
    let det = t2 - t1;
    if det.abs() < SINGULAR_EPS {
        return Err(HopgError::SingularCalibration { theta1, theta2 });
    }

    let arm = geometry.arm_length();
    let origin = geometry.origin_offset();
    let r1 = arm * t1 + first.position_cm - origin;
    let r2 = arm * t2 + second.position_cm - origin;

    let s0 = (r1 * t2 - r2 * t1) / det;
    let s1 = (r2 - r1) / det;

    Ok(CalibrationSolution {
        params: CalibrationParams::new(s0, s1),
        mode: CalibrationMode::Two,
        references: vec![*first, *second],
    })
}
