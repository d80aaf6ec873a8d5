// Copyright (c) 2025 UniFocus
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

/// 重试退避策略
///
/// 任务失败后的重试间隔按失败次数指数增长，
/// 上限为该任务的名义抓取周期
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 初始退避时间
    pub base_backoff: Duration,
    /// 退避乘数
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(base_backoff: Duration, backoff_multiplier: f64) -> Self {
        Self {
            base_backoff,
            backoff_multiplier,
        }
    }

    /// 计算第n次连续失败后的退避时间
    ///
    /// # 参数
    ///
    /// * `consecutive_failures` - 连续失败次数（从1开始）
    /// * `cap` - 退避上限，取任务的名义抓取周期
    ///
    /// # 返回值
    ///
    /// `min(base * multiplier^(n-1), cap)`
    pub fn backoff_for(&self, consecutive_failures: u32, cap: Duration) -> Duration {
        let exponent = consecutive_failures.saturating_sub(1).min(32);
        let backoff_secs =
            self.base_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent as i32);

        let capped = backoff_secs.min(cap.as_secs_f64());
        Duration::from_secs_f64(capped)
    }
}
