// Copyright (c) 2025 UniFocus
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_task::CrawlTask;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 存储错误
    #[error("Storage error: {0}")]
    Storage(String),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 爬取任务仓库特质
///
/// 爬虫对任务存储的全部依赖。认领必须是原子的条件更新：
/// 并发的调度周期对同一任务的try_claim至多一个返回true。
#[async_trait]
pub trait CrawlTaskRepository: Send + Sync {
    /// 创建新任务
    async fn create(&self, task: &CrawlTask) -> Result<CrawlTask, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CrawlTask>, RepositoryError>;
    /// 更新任务
    async fn update(&self, task: &CrawlTask) -> Result<CrawlTask, RepositoryError>;
    /// 列出给定时刻到期的任务（不含Running状态）
    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<CrawlTask>, RepositoryError>;
    /// 尝试认领任务
    ///
    /// 返回false表示任务已被并发的调度周期认领或已不再到期，
    /// 调用方静默跳过即可
    async fn try_claim(&self, id: Uuid) -> Result<bool, RepositoryError>;
}
