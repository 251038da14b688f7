//! # 打靶时刻查询与时间延迟
//!
//! 时间延迟的来源按优先级：
//! 1. 命令行直接给出
//! 2. 打靶时刻（查询得到）与文件名中 IP 读取时刻之差
//! 3. 终端交互输入（仅在终端可交互时）
//! 4. 配置中的默认值
//!
//! ## 打靶时刻表格式
//! ```text
//! shot,time
//! G43798,14:32
//! L4012, 9:05
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/pipeline.rs` 使用
//! - 使用 `models/shot.rs`, `csv`, `console`

use crate::error::{HopgError, Result};
use crate::lookup::LookupFailure;
use crate::models::{ClockTime, ShotId, TimeDelay};

use console::Term;
use std::collections::HashMap;
use std::path::Path;

/// 打靶时刻查询
pub trait ShotTimeLookup: Send + Sync {
    fn fetch(&self, shot: &ShotId) -> std::result::Result<ClockTime, LookupFailure>;
}

/// 所有打靶使用同一时刻
#[derive(Debug, Clone, Copy)]
pub struct FixedShotTime(pub ClockTime);

impl ShotTimeLookup for FixedShotTime {
    fn fetch(&self, _shot: &ShotId) -> std::result::Result<ClockTime, LookupFailure> {
        Ok(self.0)
    }
}

/// 无查询来源
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShotTimeLookup;

impl ShotTimeLookup for NoShotTimeLookup {
    fn fetch(&self, _shot: &ShotId) -> std::result::Result<ClockTime, LookupFailure> {
        Err(LookupFailure::Unavailable(
            "no shot time source configured".to_string(),
        ))
    }
}

/// 本地打靶时刻表 (CSV: shot,HH:MM)
#[derive(Debug, Clone, Default)]
pub struct ShotTimeTable {
    times: HashMap<ShotId, ClockTime>,
}

impl ShotTimeTable {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(HopgError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| HopgError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_content(&content, &path.display().to_string())
    }

    pub fn from_content(content: &str, source_name: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut times = HashMap::new();
        for record in rdr.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let bad_row = |reason: String| HopgError::ParseError {
                format: "shot time table".to_string(),
                path: source_name.to_string(),
                reason: format!("line {}: {}", line, reason),
            };

            let shot: ShotId = record
                .get(0)
                .unwrap_or_default()
                .parse()
                .map_err(bad_row)?;
            let time: ClockTime = record
                .get(1)
                .unwrap_or_default()
                .parse()
                .map_err(|e: HopgError| bad_row(e.to_string()))?;
            times.insert(shot, time);
        }

        Ok(Self { times })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

impl ShotTimeLookup for ShotTimeTable {
    fn fetch(&self, shot: &ShotId) -> std::result::Result<ClockTime, LookupFailure> {
        self.times
            .get(shot)
            .copied()
            .ok_or(LookupFailure::NotFound(*shot))
    }
}

/// 时间延迟的来源
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DelaySource {
    Explicit,
    ShotTime { shot: ClockTime, reading: ClockTime },
    Prompt,
    Default,
}

impl std::fmt::Display for DelaySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DelaySource::Explicit => write!(f, "command line"),
            DelaySource::ShotTime { shot, reading } => {
                write!(f, "shot {} -> IP read {}", shot, reading)
            }
            DelaySource::Prompt => write!(f, "manual entry"),
            DelaySource::Default => write!(f, "configured default"),
        }
    }
}

/// 解析后的时间延迟及途中遇到的问题
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDelay {
    pub delay: TimeDelay,
    pub source: DelaySource,
    pub notes: Vec<String>,
}

/// 时间延迟解析链
pub struct DelayResolver<'a> {
    lookup: &'a dyn ShotTimeLookup,
    fallback: TimeDelay,
    interactive: bool,
}

impl<'a> DelayResolver<'a> {
    pub fn new(lookup: &'a dyn ShotTimeLookup, fallback: TimeDelay) -> Self {
        Self {
            lookup,
            fallback,
            interactive: false,
        }
    }

    /// 查询失败时允许在终端手动输入
    pub fn interactive(mut self, enabled: bool) -> Self {
        self.interactive = enabled && Term::stdout().is_term();
        self
    }

    pub fn resolve(
        &self,
        explicit: Option<TimeDelay>,
        shot: &ShotId,
        scan_path: &Path,
    ) -> ResolvedDelay {
        if let Some(delay) = explicit {
            return ResolvedDelay {
                delay,
                source: DelaySource::Explicit,
                notes: Vec::new(),
            };
        }

        let mut notes = Vec::new();
        match self.from_shot_time(shot, scan_path) {
            Ok((delay, source)) => {
                return ResolvedDelay {
                    delay,
                    source,
                    notes,
                }
            }
            Err(reason) => notes.push(format!("{}: time delay lookup failed: {}", shot, reason)),
        }

        if self.interactive {
            let reading = ClockTime::reading_time_from_path(scan_path).ok();
            match prompt_delay(shot, reading) {
                Some(delay) => {
                    return ResolvedDelay {
                        delay,
                        source: DelaySource::Prompt,
                        notes,
                    }
                }
                None => notes.push(format!("{}: no valid time delay entered", shot)),
            }
        }

        notes.push(format!(
            "{}: using default time delay {}",
            shot, self.fallback
        ));
        ResolvedDelay {
            delay: self.fallback,
            source: DelaySource::Default,
            notes,
        }
    }

    fn from_shot_time(
        &self,
        shot: &ShotId,
        scan_path: &Path,
    ) -> std::result::Result<(TimeDelay, DelaySource), String> {
        let shot_time = self.lookup.fetch(shot).map_err(|e| e.to_string())?;
        let reading = ClockTime::reading_time_from_path(scan_path).map_err(|e| e.to_string())?;
        Ok((
            TimeDelay::between(shot_time, reading),
            DelaySource::ShotTime {
                shot: shot_time,
                reading,
            },
        ))
    }
}

/// 终端输入打靶时刻 (HH:MM) 或直接输入延迟 (分钟)
fn prompt_delay(shot: &ShotId, reading: Option<ClockTime>) -> Option<TimeDelay> {
    let term = Term::stdout();
    let question = match reading {
        Some(r) => format!(
            "   Shot time for {} unknown (IP read at {}). Enter shot time (HH:MM) or delay in minutes:",
            shot, r
        ),
        None => format!("   Shot time for {} unknown. Enter delay in minutes:", shot),
    };
    term.write_line(&question).ok()?;
    let input = term.read_line().ok()?;
    parse_delay_input(&input, reading)
}

/// 解析 `HH:MM`（需要读取时刻）或分钟数
fn parse_delay_input(input: &str, reading: Option<ClockTime>) -> Option<TimeDelay> {
    let input = input.trim();
    if input.contains(':') {
        let shot_time: ClockTime = input.parse().ok()?;
        return reading.map(|r| TimeDelay::between(shot_time, r));
    }
    input
        .parse::<f64>()
        .ok()
        .and_then(|m| TimeDelay::from_minutes(m).ok())
}
