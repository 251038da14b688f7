//! # 基准线位置选择
//!
//! 单基准标定需要 Cu Kα1 线在 IP 上的位置。选择方式：
//! - `FixedPosition`: 固定位置
//! - `MaxIntensityPicker`: 扫描（或给定区间）内强度最大的位置
//! - `PromptPicker`: 终端手动输入
//!
//! 选择失败时依次回退到最大强度位置、默认位置 1.005 cm。
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 使用
//! - 使用 `models/scan.rs`, `console`

use crate::models::{CalibrationReference, ScanSample};

use console::Term;

/// 基准线位置选择
pub trait ReferencePicker: Send + Sync {
    fn name(&self) -> &str;

    fn pick(&self, scan: &[ScanSample]) -> Option<f64>;
}

/// 固定位置
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub f64);

impl Default for FixedPosition {
    fn default() -> Self {
        Self(CalibrationReference::default_single().position_cm)
    }
}

impl ReferencePicker for FixedPosition {
    fn name(&self) -> &str {
        "fixed"
    }

    fn pick(&self, _scan: &[ScanSample]) -> Option<f64> {
        self.0.is_finite().then_some(self.0)
    }
}

/// 强度最大处（相同时取靠前的采样点）
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxIntensityPicker {
    /// 只在 [min, max] cm 内搜索
    pub search: Option<(f64, f64)>,
}

impl MaxIntensityPicker {
    pub fn within(min_cm: f64, max_cm: f64) -> Self {
        Self {
            search: Some((min_cm, max_cm)),
        }
    }
}

impl ReferencePicker for MaxIntensityPicker {
    fn name(&self) -> &str {
        "max-intensity"
    }

    fn pick(&self, scan: &[ScanSample]) -> Option<f64> {
        scan.iter()
            .filter(|s| match self.search {
                Some((lo, hi)) => s.position_cm >= lo && s.position_cm <= hi,
                None => true,
            })
            .filter(|s| s.intensity_psl.is_finite())
            .fold(None::<&ScanSample>, |best, s| match best {
                Some(b) if b.intensity_psl >= s.intensity_psl => Some(b),
                _ => Some(s),
            })
            .map(|s| s.position_cm)
    }
}

/// 终端手动输入位置；空输入或非数值视为取消
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptPicker;

impl ReferencePicker for PromptPicker {
    fn name(&self) -> &str {
        "prompt"
    }

    fn pick(&self, scan: &[ScanSample]) -> Option<f64> {
        let term = Term::stdout();
        if !term.is_term() {
            return None;
        }

        let hint = MaxIntensityPicker::default()
            .pick(scan)
            .map(|x| format!(" [max intensity at {:.3} cm]", x))
            .unwrap_or_default();
        term.write_line(&format!(
            "   Cu Ka1 line position in cm{}:",
            hint
        ))
        .ok()?;

        let input = term.read_line().ok()?;
        input.trim().parse::<f64>().ok().filter(|x| x.is_finite())
    }
}

/// 位置的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickSource {
    Picker,
    MaxIntensity,
    Default,
}

impl std::fmt::Display for PickSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickSource::Picker => write!(f, "picker"),
            PickSource::MaxIntensity => write!(f, "max intensity fallback"),
            PickSource::Default => write!(f, "default position"),
        }
    }
}

/// 选择基准线位置：picker → 最大强度 → 默认位置
pub fn pick_reference_position(picker: &dyn ReferencePicker, scan: &[ScanSample]) -> (f64, PickSource) {
    if let Some(x) = picker.pick(scan) {
        return (x, PickSource::Picker);
    }
    if let Some(x) = MaxIntensityPicker::default().pick(scan) {
        return (x, PickSource::MaxIntensity);
    }
    (FixedPosition::default().0, PickSource::Default)
}
