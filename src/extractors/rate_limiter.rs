// Copyright (c) 2025 UniFocus
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// 出站请求限流器
///
/// 每个提取器实例持有一个限流器，按固定间隔放行请求。
/// 单令牌漏桶近似：burst仅保留在配置面上，不参与放行计算，
/// 稳态速率之外不允许突发。
#[derive(Debug)]
pub struct RateLimiter {
    /// 两次请求之间的最小间隔
    interval: Duration,
    /// 突发额度（仅配置兼容，见DESIGN.md）
    #[allow(dead_code)]
    burst: u32,
    /// 上次放行时间，锁保护读-算-写窗口
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// 创建限流器
    ///
    /// # 参数
    ///
    /// * `requests_per_second` - 稳态速率，非正值表示不限流
    /// * `burst` - 突发额度，当前不参与放行计算
    pub fn new(requests_per_second: f64, burst: u32) -> Self {
        let interval = if requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::ZERO
        };

        Self {
            interval,
            burst,
            last_request: Mutex::new(None),
        }
    }

    /// 阻塞直到可以安全发出下一次请求
    ///
    /// 首次调用立即放行。锁跨越整个等待窗口，
    /// 共享同一提取器的多个工作器不会算出相同的等待窗口而同时发出请求。
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }
}
