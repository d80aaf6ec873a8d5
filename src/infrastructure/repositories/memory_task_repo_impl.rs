// Copyright (c) 2025 UniFocus
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_task::CrawlTask;
use crate::domain::repositories::crawl_task_repository::{CrawlTaskRepository, RepositoryError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

/// 内存任务仓库
///
/// 单进程内存调度的默认实现。try_claim在DashMap分片锁内完成
/// 读-判-写，对同一任务的并发认领至多一个成功。
#[derive(Default)]
pub struct InMemoryCrawlTaskRepository {
    tasks: DashMap<Uuid, CrawlTask>,
}

impl InMemoryCrawlTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前任务数量
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[async_trait]
impl CrawlTaskRepository for InMemoryCrawlTaskRepository {
    async fn create(&self, task: &CrawlTask) -> Result<CrawlTask, RepositoryError> {
        self.tasks.insert(task.id, task.clone());
        Ok(task.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CrawlTask>, RepositoryError> {
        Ok(self.tasks.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, task: &CrawlTask) -> Result<CrawlTask, RepositoryError> {
        let mut entry = self.tasks.get_mut(&task.id).ok_or(RepositoryError::NotFound)?;
        *entry.value_mut() = task.clone();
        Ok(task.clone())
    }

    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<CrawlTask>, RepositoryError> {
        Ok(self
            .tasks
            .iter()
            .filter(|entry| entry.value().is_due(now))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn try_claim(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut entry = self.tasks.get_mut(&id).ok_or(RepositoryError::NotFound)?;

        // 列出与认领之间任务可能已被其他周期执行完毕，重新检查到期
        if !entry.value().is_due(Utc::now()) {
            return Ok(false);
        }

        match entry.value().clone().claim() {
            Ok(claimed) => {
                *entry.value_mut() = claimed;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }
}
