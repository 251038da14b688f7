//! # 三次样条插值
//!
//! 自然边界条件（端点二阶导为零）的三次样条，用于滤片透过率表的平滑插值。
//! 只在表格定义域内求值，不做外推。
//!
//! ## 依赖关系
//! - 被 `spectrometer/correction.rs` 使用
//! - 无外部模块依赖

use crate::error::{HopgError, Result};

/// 分段三次多项式 S(x) = a + b(x-xi) + c(x-xi)² + d(x-xi)³
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    x: Vec<f64>,
    coeffs: Vec<[f64; 4]>,
}

impl CubicSpline {
    /// 由严格递增的节点构造样条
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(HopgError::InvalidArgument(format!(
                "spline needs equal-length columns ({} vs {})",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 2 {
            return Err(HopgError::InsufficientSamples {
                needed: 2,
                got: x.len(),
            });
        }
        if let Some(i) = (1..x.len()).find(|&i| !(x[i] > x[i - 1])) {
            return Err(HopgError::InvalidArgument(format!(
                "spline nodes must be strictly increasing (x[{}] = {}, x[{}] = {})",
                i - 1,
                x[i - 1],
                i,
                x[i]
            )));
        }

        let coeffs = compute_coefficients(&x, &y);
        Ok(Self { x, coeffs })
    }

    /// 定义域 [x_min, x_max]
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    pub fn contains(&self, x: f64) -> bool {
        let (lo, hi) = self.domain();
        x >= lo && x <= hi
    }

    /// 在定义域内求值；域外返回 None
    pub fn evaluate(&self, x: f64) -> Option<f64> {
        if !self.contains(x) {
            return None;
        }

        // 找到 x 所在区间 [x_i, x_{i+1}]
        let segment = match self.x.binary_search_by(|probe| {
            probe.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Less)
        }) {
            Ok(i) => i.min(self.coeffs.len() - 1),
            Err(i) => i - 1,
        };

        let [a, b, c, d] = self.coeffs[segment];
        let dx = x - self.x[segment];
        Some(a + dx * (b + dx * (c + dx * d)))
    }
}

/// 追赶法求解三对角方程组，得到各段系数
fn compute_coefficients(x: &[f64], y: &[f64]) -> Vec<[f64; 4]> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

    let mut alpha = vec![0.0; n];
    for i in 1..n - 1 {
        alpha[i] = 3.0 / h[i] * (y[i + 1] - y[i]) - 3.0 / h[i - 1] * (y[i] - y[i - 1]);
    }

    let mut l = vec![1.0; n];
    let mut mu = vec![0.0; n];
    let mut z = vec![0.0; n];
    for i in 1..n - 1 {
        l[i] = 2.0 * (x[i + 1] - x[i - 1]) - h[i - 1] * mu[i - 1];
        mu[i] = h[i] / l[i];
        z[i] = (alpha[i] - h[i - 1] * z[i - 1]) / l[i];
    }

    let mut c = vec![0.0; n];
    let mut coeffs = vec![[0.0; 4]; n - 1];
    for j in (0..n - 1).rev() {
        c[j] = z[j] - mu[j] * c[j + 1];
        let b = (y[j + 1] - y[j]) / h[j] - h[j] * (c[j + 1] + 2.0 * c[j]) / 3.0;
        let d = (c[j + 1] - c[j]) / (3.0 * h[j]);
        coeffs[j] = [y[j], b, c[j], d];
    }
    coeffs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_through_nodes() {
        let x = vec![1.0, 2.0, 3.5, 5.0, 8.0];
        let y = vec![0.1, 0.4, 0.45, 0.8, 0.95];
        let spline = CubicSpline::new(x.clone(), y.clone()).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert!((spline.evaluate(*xi).unwrap() - yi).abs() < 1e-12);
        }
    }

    #[test]
    fn test_linear_data_is_reproduced() {
        let x: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let spline = CubicSpline::new(x, y).unwrap();
        for &q in &[0.25, 1.5, 3.7, 4.99] {
            assert!((spline.evaluate(q).unwrap() - (2.0 * q + 1.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_outside_domain_is_none() {
        let spline = CubicSpline::new(vec![1.0, 2.0, 3.0], vec![1.0, 4.0, 9.0]).unwrap();
        assert_eq!(spline.domain(), (1.0, 3.0));
        assert!(spline.evaluate(0.999).is_none());
        assert!(spline.evaluate(3.001).is_none());
        assert!(spline.evaluate(f64::NAN).is_none());
    }

    #[test]
    fn test_rejects_bad_nodes() {
        assert!(CubicSpline::new(vec![1.0], vec![1.0]).is_err());
        assert!(CubicSpline::new(vec![1.0, 2.0], vec![1.0]).is_err());
        assert!(CubicSpline::new(vec![1.0, 1.0, 2.0], vec![1.0, 2.0, 3.0]).is_err());
        assert!(CubicSpline::new(vec![2.0, 1.0], vec![1.0, 2.0]).is_err());
    }
}
