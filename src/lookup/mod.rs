//! # 外部协作者
//!
//! 处理流程中需要"外部"提供的两类信息，以 trait 抽象，便于替换和测试：
//! - `time`: 打靶时刻查询 → IP 读取时间延迟
//! - `picker`: 标定基准线在扫描上的位置
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/`, `console`

pub mod picker;
pub mod time;

pub use picker::{
    pick_reference_position, FixedPosition, MaxIntensityPicker, PickSource, PromptPicker,
    ReferencePicker,
};
pub use time::{
    DelayResolver, DelaySource, FixedShotTime, NoShotTimeLookup, ResolvedDelay, ShotTimeLookup,
    ShotTimeTable,
};

use crate::models::ShotId;
use thiserror::Error;

/// 查询失败（不是致命错误，调用方回退到其他来源）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupFailure {
    #[error("no shot time recorded for {0}")]
    NotFound(ShotId),

    #[error("shot time lookup unavailable: {0}")]
    Unavailable(String),
}
