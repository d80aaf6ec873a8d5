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

use crate::domain::models::crawl_task::CrawlTask;
use crate::domain::models::raw_opportunity::RawOpportunity;
use crate::extractors::registry::ExtractorRegistry;
use crate::extractors::traits::ExtractError;
use metrics::histogram;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// 一次任务执行的结果
///
/// 由工作器通过通道交给终结步骤，工作器本身从不做状态落账
#[derive(Debug)]
pub struct TaskOutcome {
    /// 任务ID
    pub task_id: Uuid,
    /// 站点名称
    pub site_name: String,
    /// 提取结果
    pub result: Result<Vec<RawOpportunity>, ExtractError>,
}

/// 工作池
///
/// 把提取执行限制在固定的并发度内。每个执行包一层任务级超时，
/// 超时会中止内部任务以真正取消在途请求；单个任务的panic被隔离为
/// 该任务的失败结果，不影响调度器和其他在途工作器。
pub struct WorkerPool {
    /// 提取器注册表
    registry: Arc<ExtractorRegistry>,
    /// 并发度信号量
    semaphore: Arc<Semaphore>,
    /// 任务级执行超时
    task_timeout: Duration,
    /// 执行结果通道
    outcome_tx: mpsc::Sender<TaskOutcome>,
}

impl WorkerPool {
    /// 创建新的工作池
    ///
    /// # 参数
    ///
    /// * `registry` - 提取器注册表
    /// * `worker_count` - 最大并发执行数
    /// * `task_timeout` - 单个任务的执行超时
    /// * `outcome_tx` - 执行结果通道的发送端
    pub fn new(
        registry: Arc<ExtractorRegistry>,
        worker_count: usize,
        task_timeout: Duration,
        outcome_tx: mpsc::Sender<TaskOutcome>,
    ) -> Self {
        Self {
            registry,
            semaphore: Arc::new(Semaphore::new(worker_count)),
            task_timeout,
            outcome_tx,
        }
    }

    /// 提交任务执行
    ///
    /// 立即返回；实际执行在有空闲工作槽时开始。
    /// 任务之间不保证任何执行顺序。
    pub fn submit(&self, task: CrawlTask) -> JoinHandle<()> {
        let registry = self.registry.clone();
        let semaphore = self.semaphore.clone();
        let task_timeout = self.task_timeout;
        let outcome_tx = self.outcome_tx.clone();

        tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };

            let task_id = task.id;
            let site_name = task.site_name.clone();

            let start = std::time::Instant::now();
            let result = Self::execute(registry, task_timeout, task).await;
            histogram!("crawler_extraction_duration_seconds")
                .record(start.elapsed().as_secs_f64());

            let outcome = TaskOutcome {
                task_id,
                site_name,
                result,
            };
            if outcome_tx.send(outcome).await.is_err() {
                warn!("Outcome channel closed, dropping result for task {}", task_id);
            }
        })
    }

    #[instrument(skip(registry, task), fields(task_id = %task.id, site = %task.site_name, url = %task.target_url))]
    async fn execute(
        registry: Arc<ExtractorRegistry>,
        task_timeout: Duration,
        task: CrawlTask,
    ) -> Result<Vec<RawOpportunity>, ExtractError> {
        let extractor = registry.resolve(&task)?;
        info!("Executing with extractor '{}'", extractor.name());

        // 在独立任务中执行提取，panic被JoinError捕获而不是向上传播
        let mut handle = tokio::spawn(async move { extractor.scrape(&task).await });

        match tokio::time::timeout(task_timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                if join_error.is_panic() {
                    Err(ExtractError::Other(format!(
                        "extraction panicked: {}",
                        join_error
                    )))
                } else {
                    Err(ExtractError::Other(format!(
                        "extraction aborted: {}",
                        join_error
                    )))
                }
            }
            Err(_) => {
                // 中止内部任务，取消而不是遗弃在途请求
                handle.abort();
                Err(ExtractError::Timeout)
            }
        }
    }
}
