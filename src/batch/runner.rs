//! # 批量执行器
//!
//! 并行执行批量处理任务。每个任务只拿到共享的只读数据，
//! 输出文件以打靶编号区分，任务之间互不影响。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代，结果保持输入顺序
//! - 进度条显示
//! - 错误收集与汇总报告
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::error::{HopgError, Result};
use crate::utils::progress;

use indicatif::ProgressBar;
use rayon::prelude::*;

/// 单个任务的处理结果
#[derive(Debug, Clone)]
pub enum ProcessResult<T> {
    /// 处理成功
    Success(T),
    /// 跳过（如输出已存在）
    Skipped(String),
    /// 处理失败
    Failed(String, String), // (打靶编号或文件, 阶段与错误信息)
}

/// 批量处理结果统计
#[derive(Debug)]
pub struct BatchResult<T> {
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
    /// 失败详情
    pub failures: Vec<(String, String)>,
    /// 成功任务的输出，保持输入顺序
    pub outputs: Vec<T>,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self {
            success: 0,
            skipped: 0,
            failed: 0,
            failures: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

impl<T> BatchResult<T> {
    /// 合并处理结果
    pub fn merge(&mut self, result: ProcessResult<T>) {
        match result {
            ProcessResult::Success(output) => {
                self.success += 1;
                self.outputs.push(output);
            }
            ProcessResult::Skipped(_) => self.skipped += 1,
            ProcessResult::Failed(item, err) => {
                self.failed += 1;
                self.failures.push((item, err));
            }
        }
    }

    /// 总处理数量
    pub fn total(&self) -> usize {
        self.success + self.skipped + self.failed
    }
}

/// 批量执行器
pub struct BatchRunner {
    jobs: usize,
}

impl BatchRunner {
    /// `jobs == 0` 时使用全部 CPU
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 并行处理任务列表
    ///
    /// 处理函数拿到进度条，需要输出时通过 `ProgressBar::suspend` 打印。
    pub fn run<I, T, F>(&self, items: Vec<I>, processor: F) -> Result<BatchResult<T>>
    where
        I: Sync,
        T: Send,
        F: Fn(&I, &ProgressBar) -> ProcessResult<T> + Sync + Send,
    {
        let pb = progress::create_progress_bar(items.len() as u64, "Converting");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| HopgError::Other(format!("Failed to build thread pool: {}", e)))?;

        let results: Vec<ProcessResult<T>> = pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    let result = processor(item, &pb);
                    pb.inc(1);
                    result
                })
                .collect()
        });

        pb.finish_and_clear();

        let mut batch_result = BatchResult::default();
        for result in results {
            batch_result.merge(result);
        }

        Ok(batch_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outputs_keep_input_order() {
        let runner = BatchRunner::new(4);
        let items: Vec<u32> = (0..50).collect();
        let result = runner
            .run(items, |&i, _| {
                if i % 10 == 3 {
                    ProcessResult::Failed(format!("item{}", i), "convert: boom".to_string())
                } else if i % 10 == 7 {
                    ProcessResult::Skipped(format!("item{}", i))
                } else {
                    ProcessResult::Success(i * 2)
                }
            })
            .unwrap();

        assert_eq!(result.total(), 50);
        assert_eq!(result.failed, 5);
        assert_eq!(result.skipped, 5);
        assert_eq!(result.success, 40);
        assert_eq!(result.failures[0].0, "item3");
        let mut sorted = result.outputs.clone();
        sorted.sort();
        assert_eq!(result.outputs, sorted);
    }

    #[test]
    fn test_zero_jobs_uses_all_cpus() {
        assert_eq!(BatchRunner::new(0).jobs(), num_cpus::get());
        assert_eq!(BatchRunner::new(3).jobs(), 3);
    }
}
