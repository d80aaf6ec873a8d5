// Copyright (c) 2025 UniFocus
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 爬取任务实体
///
/// 表示一个周期性的抓取工作单元：按站点配置的频率反复抓取
/// 同一个目标URL。任务具有状态机、重试退避和选择器配置等属性。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlTask {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 站点逻辑名称，用于选择提取器和限流桶
    pub site_name: String,
    /// 目标URL，任务要抓取的绝对地址
    pub target_url: String,
    /// 选择器配置，仅由静态提取器解释（item/title/link/content）
    pub selector_config: HashMap<String, String>,
    /// 抓取频率，决定成功后下次抓取时间
    pub frequency: CrawlFrequency,
    /// 任务状态，跟踪任务在当前周期中的阶段
    pub status: CrawlTaskStatus,
    /// 上次成功抓取时间
    pub last_crawled_at: Option<DateTime<Utc>>,
    /// 下次抓取时间，为空表示立即到期
    pub next_crawl_at: Option<DateTime<Utc>>,
    /// 连续失败次数，成功后清零
    pub consecutive_failures: i32,
    /// 最近一次失败信息，成功后清空
    pub error_message: Option<String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 抓取频率枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CrawlFrequency {
    /// 每小时抓取一次
    #[default]
    Hourly,
    /// 每天抓取一次
    Daily,
    /// 每周抓取一次
    Weekly,
}

impl CrawlFrequency {
    /// 名义抓取周期
    pub fn interval(&self) -> Duration {
        match self {
            CrawlFrequency::Hourly => Duration::hours(1),
            CrawlFrequency::Daily => Duration::days(1),
            CrawlFrequency::Weekly => Duration::weeks(1),
        }
    }

    /// 名义抓取周期（std形式，供退避上限使用）
    pub fn interval_std(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval().num_seconds() as u64)
    }
}

impl fmt::Display for CrawlFrequency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CrawlFrequency::Hourly => write!(f, "hourly"),
            CrawlFrequency::Daily => write!(f, "daily"),
            CrawlFrequency::Weekly => write!(f, "weekly"),
        }
    }
}

impl FromStr for CrawlFrequency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(CrawlFrequency::Hourly),
            "daily" => Ok(CrawlFrequency::Daily),
            "weekly" => Ok(CrawlFrequency::Weekly),
            _ => Err(()),
        }
    }
}

/// 任务状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → Running → Success/Failed，
/// 到达next_crawl_at后Success/Failed重新变为可调度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CrawlTaskStatus {
    /// 等待调度，任务已创建但本周期尚未执行
    #[default]
    Pending,
    /// 执行中，任务已被某个工作器认领
    Running,
    /// 本周期执行成功
    Success,
    /// 本周期执行失败
    Failed,
}

impl fmt::Display for CrawlTaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CrawlTaskStatus::Pending => write!(f, "pending"),
            CrawlTaskStatus::Running => write!(f, "running"),
            CrawlTaskStatus::Success => write!(f, "success"),
            CrawlTaskStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for CrawlTaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CrawlTaskStatus::Pending),
            "running" => Ok(CrawlTaskStatus::Running),
            "success" => Ok(CrawlTaskStatus::Success),
            "failed" => Ok(CrawlTaskStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换，任务状态转换不符合状态机规则时发生
    #[error("Invalid state transition")]
    InvalidStateTransition,
}

impl CrawlTask {
    /// 创建一个新的爬取任务
    ///
    /// 新任务处于Pending状态且next_crawl_at为空，即立即到期
    pub fn new(
        site_name: String,
        target_url: String,
        selector_config: HashMap<String, String>,
        frequency: CrawlFrequency,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            site_name,
            target_url,
            selector_config,
            frequency,
            status: CrawlTaskStatus::Pending,
            last_crawled_at: None,
            next_crawl_at: None,
            consecutive_failures: 0,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 判断任务在给定时刻是否到期
    ///
    /// Running状态的任务已被认领，不再到期；
    /// next_crawl_at为空视为立即到期
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if self.status == CrawlTaskStatus::Running {
            return false;
        }
        match self.next_crawl_at {
            Some(next) => next <= now,
            None => true,
        }
    }

    /// 认领任务
    ///
    /// 将任务状态从可调度状态变更为Running
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlTask)` - 成功认领的任务
    /// * `Err(DomainError)` - 任务已在执行中
    pub fn claim(mut self) -> Result<Self, DomainError> {
        match self.status {
            CrawlTaskStatus::Pending | CrawlTaskStatus::Success | CrawlTaskStatus::Failed => {
                self.status = CrawlTaskStatus::Running;
                self.updated_at = Utc::now();
                Ok(self)
            }
            CrawlTaskStatus::Running => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 完成任务
    ///
    /// 将任务状态从Running变更为Success，按名义频率计算下次抓取时间，
    /// 清空失败信息并重置连续失败计数
    pub fn complete(mut self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        match self.status {
            CrawlTaskStatus::Running => {
                self.status = CrawlTaskStatus::Success;
                self.last_crawled_at = Some(now);
                self.next_crawl_at = Some(now + self.frequency.interval());
                self.consecutive_failures = 0;
                self.error_message = None;
                self.updated_at = now;
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 标记任务失败
    ///
    /// 将任务状态从Running变更为Failed，累加连续失败计数，
    /// 下次抓取时间由调度器的退避策略给出
    pub fn fail(
        mut self,
        now: DateTime<Utc>,
        error_message: String,
        retry_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        match self.status {
            CrawlTaskStatus::Running => {
                self.status = CrawlTaskStatus::Failed;
                self.consecutive_failures += 1;
                self.error_message = Some(error_message);
                self.next_crawl_at = Some(retry_at);
                self.updated_at = now;
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }
}
