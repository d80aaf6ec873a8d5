// Copyright 2025 UniFocus
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::utils::retry_policy::RetryPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 进程启动时构造一次，此后只读，按引用注入各组件，
/// 核心逻辑从不读取环境全局状态
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 爬虫配置
    pub crawler: CrawlerSettings,
    /// 摄取配置
    pub ingestion: IngestionSettings,
}

/// 爬虫配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerSettings {
    /// 工作器数量（最大并发提取数）
    pub worker_count: usize,
    /// 调度周期（秒）
    pub tick_interval_secs: u64,
    /// 单次HTTP请求超时（秒）
    pub request_timeout_secs: u64,
    /// 任务级执行超时（秒），缺省为请求超时加10秒余量
    pub task_timeout_secs: Option<u64>,
    /// 轮换的User-Agent列表
    pub user_agents: Vec<String>,
    /// 提取器默认限流配置
    pub rate_limit: RateLimitSettings,
    /// 失败重试配置
    pub retry: RetrySettings,
    /// 启动时加载的种子任务文件（YAML）
    pub tasks_file: Option<String>,
}

/// 限流配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// 每秒请求数
    pub requests_per_second: f64,
    /// 突发额度
    pub burst: u32,
}

/// 重试退避配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// 初始退避时间（秒）
    pub base_backoff_secs: u64,
    /// 退避乘数
    pub backoff_multiplier: f64,
}

/// 摄取配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct IngestionSettings {
    /// 下游摄取服务地址，为空时记录投递到日志
    pub endpoint: Option<String>,
    /// 投递请求超时（秒）
    pub timeout_secs: u64,
}

impl CrawlerSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 任务级超时：HTTP超时通常先触发并给出更精确的错误，
    /// 任务级超时作为兜底，同时覆盖限流等待与解析
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(
            self.task_timeout_secs
                .unwrap_or(self.request_timeout_secs + 10),
        )
    }
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            worker_count: 5,
            tick_interval_secs: 30,
            request_timeout_secs: 30,
            task_timeout_secs: None,
            user_agents: Vec::new(),
            rate_limit: RateLimitSettings {
                requests_per_second: 2.0,
                burst: 5,
            },
            retry: RetrySettings {
                base_backoff_secs: 30,
                backoff_multiplier: 2.0,
            },
            tasks_file: None,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_secs(self.base_backoff_secs),
            self.backoff_multiplier,
        )
    }
}

impl IngestionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 加载顺序：代码内默认值 → config/default文件 →
    /// config/{APP_ENVIRONMENT}文件 → UNIFOCUS__前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default crawler settings
            .set_default("crawler.worker_count", 5)?
            .set_default("crawler.tick_interval_secs", 30)?
            .set_default("crawler.request_timeout_secs", 30)?
            .set_default("crawler.user_agents", Vec::<String>::new())?
            // Default rate limit settings
            .set_default("crawler.rate_limit.requests_per_second", 2.0)?
            .set_default("crawler.rate_limit.burst", 5)?
            // Default retry settings
            .set_default("crawler.retry.base_backoff_secs", 30)?
            .set_default("crawler.retry.backoff_multiplier", 2.0)?
            // Default ingestion settings
            .set_default("ingestion.timeout_secs", 10)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("UNIFOCUS").separator("__"));

        builder.build()?.try_deserialize()
    }
}
