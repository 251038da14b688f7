//! # 打靶元数据
//!
//! 从数据文件名中提取打靶编号与 IP 读取时刻，并提供带单位的时间延迟类型。
//!
//! ## 文件名约定
//! ```text
//! profile/200910_G43798_HOPG_1505.csv
//!                ^^^^^^      ^^^^
//!                打靶编号     IP 读取时刻 (HHMM)
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/`、`lookup/time.rs` 使用
//! - 使用 `regex`

use crate::error::{HopgError, Result};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

/// 激光装置类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaserType {
    /// 激光 GXII（前缀 G）
    Gxii,
    /// 激光 LFEX（前缀 L）
    Lfex,
}

impl LaserType {
    pub fn prefix(&self) -> char {
        match self {
            LaserType::Gxii => 'G',
            LaserType::Lfex => 'L',
        }
    }

    pub fn from_prefix(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'G' => Some(LaserType::Gxii),
            'L' => Some(LaserType::Lfex),
            _ => None,
        }
    }
}

impl std::fmt::Display for LaserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaserType::Gxii => write!(f, "GXII"),
            LaserType::Lfex => write!(f, "LFEX"),
        }
    }
}

/// 打靶编号，例如 G43798
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShotId {
    pub laser: LaserType,
    pub number: u32,
}

fn shot_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_([GL]\d+)_").unwrap())
}

fn reading_time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_HOPG_(\d{4})").unwrap())
}

fn clock_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap())
}

impl ShotId {
    pub fn new(laser: LaserType, number: u32) -> Self {
        Self { laser, number }
    }

    /// 从数据文件名中提取打靶编号（`_G12345_` 或 `_L12345_`）
    pub fn from_path(path: &Path) -> Result<Self> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();

        let caps = shot_pattern()
            .captures(stem)
            .ok_or_else(|| HopgError::InvalidShotId {
                name: stem.to_string(),
            })?;

        caps[1].parse().map_err(|_| HopgError::InvalidShotId {
            name: stem.to_string(),
        })
    }
}

impl FromStr for ShotId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let laser = chars
            .next()
            .and_then(LaserType::from_prefix)
            .ok_or_else(|| format!("Invalid shot id '{}' (expected G12345 or L12345)", s))?;
        let number: u32 = chars
            .as_str()
            .parse()
            .map_err(|_| format!("Invalid shot number in '{}'", s))?;
        Ok(Self { laser, number })
    }
}

impl std::fmt::Display for ShotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.laser.prefix(), self.number)
    }
}

/// 一天中的时刻（时:分）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
}

impl ClockTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(HopgError::InvalidClockTime(format!(
                "{:02}:{:02}",
                hour, minute
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.hour * 60 + self.minute
    }

    /// 从文件名 `_HOPG_HHMM` 中提取 IP 读取时刻
    pub fn reading_time_from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default();

        let caps = reading_time_pattern().captures(name).ok_or_else(|| {
            HopgError::InvalidArgument(format!(
                "IP reading time (_HOPG_HHMM) not found in file name '{}'",
                name
            ))
        })?;

        let digits = &caps[1];
        let hour: u32 = digits[..2].parse().unwrap_or(99);
        let minute: u32 = digits[2..].parse().unwrap_or(99);
        Self::new(hour, minute)
    }
}

impl FromStr for ClockTime {
    type Err = HopgError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = clock_pattern()
            .captures(s.trim())
            .ok_or_else(|| HopgError::InvalidClockTime(s.to_string()))?;
        let hour: u32 = caps[1]
            .parse()
            .map_err(|_| HopgError::InvalidClockTime(s.to_string()))?;
        let minute: u32 = caps[2]
            .parse()
            .map_err(|_| HopgError::InvalidClockTime(s.to_string()))?;
        Self::new(hour, minute)
    }
}

impl std::fmt::Display for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// 打靶到 IP 读取之间的时间延迟，内部统一以小时存储
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TimeDelay {
    hours: f64,
}

impl TimeDelay {
    pub const ZERO: TimeDelay = TimeDelay { hours: 0.0 };

    pub fn from_hours(hours: f64) -> Result<Self> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(HopgError::InvalidArgument(format!(
                "Time delay must be a non-negative number of hours, got {}",
                hours
            )));
        }
        Ok(Self { hours })
    }

    pub fn from_minutes(minutes: f64) -> Result<Self> {
        Self::from_hours(minutes / 60.0)
    }

    /// 读取时刻减去打靶时刻；为负时视为跨日 (+24 h)
    pub fn between(shot: ClockTime, reading: ClockTime) -> Self {
        let shot_min = shot.minutes_since_midnight() as i64;
        let read_min = reading.minutes_since_midnight() as i64;
        let mut diff = read_min - shot_min;
        if diff < 0 {
            diff += 24 * 60;
        }
        Self {
            hours: diff as f64 / 60.0,
        }
    }

    pub fn hours(&self) -> f64 {
        self.hours
    }

    pub fn minutes(&self) -> f64 {
        self.hours * 60.0
    }
}

impl std::fmt::Display for TimeDelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} min ({:.3} h)", self.minutes(), self.hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_shot_id_from_path() {
        let path = PathBuf::from("profile/200910_G43798_HOPG_1505.csv");
        let shot = ShotId::from_path(&path).unwrap();
        assert_eq!(shot.laser, LaserType::Gxii);
        assert_eq!(shot.number, 43798);
        assert_eq!(shot.to_string(), "G43798");

        let path = PathBuf::from("210315_L12345_HOPG_0900.csv");
        assert_eq!(ShotId::from_path(&path).unwrap().laser, LaserType::Lfex);
    }

    #[test]
    fn test_shot_id_malformed() {
        let path = PathBuf::from("profile/scan_without_shot.csv");
        match ShotId::from_path(&path) {
            Err(HopgError::InvalidShotId { name }) => assert_eq!(name, "scan_without_shot"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_shot_id_from_str() {
        let shot: ShotId = "G43775".parse().unwrap();
        assert_eq!(shot, ShotId::new(LaserType::Gxii, 43775));
        assert!("X123".parse::<ShotId>().is_err());
        assert!("G12a".parse::<ShotId>().is_err());
    }

    #[test]
    fn test_reading_time_from_path() {
        let path = PathBuf::from("profile/200910_G43798_HOPG_1505.csv");
        assert_eq!(
            ClockTime::reading_time_from_path(&path).unwrap(),
            ClockTime::new(15, 5).unwrap()
        );

        let bad = PathBuf::from("profile/200910_G43798_HOPG_2575.csv");
        assert!(ClockTime::reading_time_from_path(&bad).is_err());

        let missing = PathBuf::from("profile/200910_G43798.csv");
        assert!(ClockTime::reading_time_from_path(&missing).is_err());
    }

    #[test]
    fn test_clock_time_parse() {
        assert_eq!("14:20".parse::<ClockTime>().unwrap(), ClockTime::new(14, 20).unwrap());
        assert_eq!("9:05".parse::<ClockTime>().unwrap().to_string(), "09:05");
        assert!("24:00".parse::<ClockTime>().is_err());
        assert!("1420".parse::<ClockTime>().is_err());
    }

    #[test]
    fn test_time_delay_units() {
        let d = TimeDelay::from_minutes(90.0).unwrap();
        assert!((d.hours() - 1.5).abs() < 1e-12);
        assert!((d.minutes() - 90.0).abs() < 1e-12);
        assert!(TimeDelay::from_hours(-1.0).is_err());
        assert!(TimeDelay::from_hours(f64::NAN).is_err());
    }

    #[test]
    fn test_time_delay_wraps_midnight() {
        let shot = ClockTime::new(23, 30).unwrap();
        let reading = ClockTime::new(0, 15).unwrap();
        let d = TimeDelay::between(shot, reading);
        assert!((d.minutes() - 45.0).abs() < 1e-9);

        let shot = ClockTime::new(14, 20).unwrap();
        let reading = ClockTime::new(15, 5).unwrap();
        assert!((TimeDelay::between(shot, reading).minutes() - 45.0).abs() < 1e-9);
    }
}
