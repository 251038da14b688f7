//! # 标定记录
//!
//! 双基准标定的结果以 YAML 保存，作为后续单基准换算的先验。
//! `latest` 为最近一次结果，`history` 只追加不修改。
//!
//! ## YAML 示例
//! ```yaml
//! latest:
//!   shot_id: G43798
//!   mode: two
//!   references:
//!     - { energy_kev: 8.048, position_cm: 1.005 }
//!     - { energy_kev: 8.391012, position_cm: 1.52 }
//!   params: { s0: -0.00905962, s1: -0.84425207 }
//!   created_at: 2020-09-10T15:42:10+09:00
//! history: [...]
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/calibrate.rs`, `commands/convert.rs` 使用
//! - 使用 `serde_yaml`, `chrono`

use crate::error::{HopgError, Result};
use crate::models::{CalibrationMode, CalibrationParams, CalibrationReference};
use crate::spectrometer::CalibrationSolution;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 默认记录文件
pub const DEFAULT_STORE_FILE: &str = "hopg_calibration.yaml";

/// 一次标定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub shot_id: String,
    pub mode: CalibrationMode,
    pub references: Vec<CalibrationReference>,
    pub params: CalibrationParams,
    pub created_at: DateTime<Local>,
}

impl CalibrationRecord {
    pub fn new(shot_id: impl Into<String>, solution: &CalibrationSolution) -> Self {
        Self {
            shot_id: shot_id.into(),
            mode: solution.mode,
            references: solution.references.clone(),
            params: solution.params,
            created_at: Local::now(),
        }
    }
}

/// 标定记录文件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationStore {
    pub latest: Option<CalibrationRecord>,
    pub history: Vec<CalibrationRecord>,
}

impl CalibrationStore {
    /// 读取记录文件；文件不存在时返回空记录
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let yaml = std::fs::read_to_string(path).map_err(|e| HopgError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(serde_yaml::from_str(&yaml)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml).map_err(|e| HopgError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn record(&mut self, record: CalibrationRecord) {
        self.history.push(record.clone());
        self.latest = Some(record);
    }

    pub fn latest(&self) -> Option<&CalibrationRecord> {
        self.latest.as_ref()
    }

    /// 某发打靶最近一次的标定
    pub fn for_shot(&self, shot_id: &str) -> Option<&CalibrationRecord> {
        self.history.iter().rev().find(|r| r.shot_id == shot_id)
    }

    /// 单基准换算使用的先验
    pub fn prior(&self) -> CalibrationParams {
        self.latest()
            .map(|r| r.params)
            .unwrap_or_else(CalibrationParams::default_prior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution(s0: f64, s1: f64) -> CalibrationSolution {
        CalibrationSolution {
            params: CalibrationParams::new(s0, s1),
            mode: CalibrationMode::Two,
            references: CalibrationReference::default_pair().to_vec(),
        }
    }

    #[test]
    fn test_empty_store_uses_default_prior() {
        let store = CalibrationStore::default();
        assert!(store.latest().is_none());
        assert_eq!(store.prior(), CalibrationParams::default_prior());
    }

    #[test]
    fn test_record_keeps_history() {
        let mut store = CalibrationStore::default();
        store.record(CalibrationRecord::new("G1", &solution(0.1, -0.5)));
        store.record(CalibrationRecord::new("G2", &solution(0.2, -0.6)));
        store.record(CalibrationRecord::new("G1", &solution(0.3, -0.7)));

        assert_eq!(store.history.len(), 3);
        assert_eq!(store.latest().unwrap().shot_id, "G1");
        assert_eq!(store.prior(), CalibrationParams::new(0.3, -0.7));
        assert_eq!(store.for_shot("G2").unwrap().params.s0, 0.2);
        assert_eq!(store.for_shot("G1").unwrap().params.s0, 0.3);
        assert!(store.for_shot("G9").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("hopg_store_{}.yaml", std::process::id()));
        let mut store = CalibrationStore::default();
        store.record(CalibrationRecord::new("G43798", &solution(-0.009, -0.844)));
        store.save(&path).unwrap();

        let loaded = CalibrationStore::load(&path).unwrap();
        assert_eq!(loaded.history.len(), 1);
        let latest = loaded.latest().unwrap();
        assert_eq!(latest.shot_id, "G43798");
        assert_eq!(latest.mode, CalibrationMode::Two);
        assert_eq!(latest.params, CalibrationParams::new(-0.009, -0.844));
        assert_eq!(latest.references.len(), 2);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_store_is_empty() {
        let store = CalibrationStore::load(Path::new("/nonexistent/hopg_store.yaml")).unwrap();
        assert!(store.history.is_empty());
    }
}
