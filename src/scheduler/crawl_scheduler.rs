// Copyright (c) 2025 UniFocus
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::CrawlerSettings;
use crate::domain::repositories::crawl_task_repository::CrawlTaskRepository;
use crate::domain::services::ingestion::IngestionSink;
use crate::extractors::registry::ExtractorRegistry;
use crate::utils::retry_policy::RetryPolicy;
use crate::workers::{TaskOutcome, WorkerPool};
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

/// 结果通道容量
///
/// 有界通道对工作器形成背压，避免落账滞后时结果无限堆积
const OUTCOME_CHANNEL_CAPACITY: usize = 64;

/// 爬取调度器
///
/// 驱动所有任务的生命周期：按固定周期列出到期任务、原子认领、
/// 提交工作池执行。落账由独立的终结任务完成，
/// 调度循环从不等待任务执行结束。
pub struct CrawlScheduler<R>
where
    R: CrawlTaskRepository + 'static,
{
    /// 任务仓库
    repository: Arc<R>,
    /// 提取器注册表
    registry: Arc<ExtractorRegistry>,
    /// 下游摄取服务
    sink: Arc<dyn IngestionSink>,
    /// 爬虫配置
    settings: CrawlerSettings,
    /// 失败重试策略
    retry_policy: RetryPolicy,
}

impl<R> CrawlScheduler<R>
where
    R: CrawlTaskRepository + 'static,
{
    /// 创建新的爬取调度器实例
    pub fn new(
        repository: Arc<R>,
        registry: Arc<ExtractorRegistry>,
        sink: Arc<dyn IngestionSink>,
        settings: CrawlerSettings,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            repository,
            registry,
            sink,
            settings,
            retry_policy,
        }
    }

    /// 启动调度器后台任务
    ///
    /// 启动终结任务和调度循环，返回调度循环的句柄。
    /// 中止句柄后，在途任务的结果仍会被终结任务落账完毕。
    ///
    /// # 返回值
    ///
    /// 返回调度循环的后台任务句柄
    pub fn start(&self) -> JoinHandle<()> {
        let (outcome_tx, outcome_rx) = mpsc::channel(OUTCOME_CHANNEL_CAPACITY);

        let pool = WorkerPool::new(
            self.registry.clone(),
            self.settings.worker_count,
            self.settings.task_timeout(),
            outcome_tx,
        );

        let finalizer = TaskFinalizer {
            repository: self.repository.clone(),
            sink: self.sink.clone(),
            retry_policy: self.retry_policy.clone(),
        };
        tokio::spawn(finalizer.run(outcome_rx));

        let repository = self.repository.clone();
        let tick_interval = self.settings.tick_interval();

        tokio::spawn(async move {
            info!(
                "Crawl scheduler started, tick interval {:?}",
                tick_interval
            );
            let mut ticker = interval(tick_interval);

            loop {
                ticker.tick().await;

                match Self::dispatch_due(repository.as_ref(), &pool).await {
                    Ok(dispatched) => {
                        if dispatched > 0 {
                            info!("Dispatched {} due tasks", dispatched);
                        }
                    }
                    Err(e) => {
                        error!("Scheduler tick failed: {}", e);
                    }
                }
            }
        })
    }

    /// 单个调度周期
    ///
    /// 列出到期任务并逐个认领提交。认领失败（已被并发周期抢先）
    /// 静默跳过；仓库错误只影响当前周期。
    ///
    /// # 返回值
    ///
    /// 本周期成功提交执行的任务数
    async fn dispatch_due(repository: &R, pool: &WorkerPool) -> anyhow::Result<usize> {
        let now = Utc::now();
        let due_tasks = repository.list_due(now).await?;

        let mut dispatched = 0;
        for task in due_tasks {
            match repository.try_claim(task.id).await {
                Ok(true) => {
                    pool.submit(task);
                    dispatched += 1;
                }
                Ok(false) => {
                    debug!("Task {} already claimed, skipping", task.id);
                }
                Err(e) => {
                    error!("Failed to claim task {}: {}", task.id, e);
                }
            }
        }

        Ok(dispatched)
    }
}

/// 任务终结器
///
/// 从结果通道接收执行结果并完成状态落账，
/// 工作器交付结果后立即空闲，不被落账阻塞
struct TaskFinalizer<R>
where
    R: CrawlTaskRepository + 'static,
{
    repository: Arc<R>,
    sink: Arc<dyn IngestionSink>,
    retry_policy: RetryPolicy,
}

impl<R> TaskFinalizer<R>
where
    R: CrawlTaskRepository + 'static,
{
    /// 运行终结循环，通道关闭且排空后退出
    async fn run(self, mut outcome_rx: mpsc::Receiver<TaskOutcome>) {
        info!("Task finalizer started");

        while let Some(outcome) = outcome_rx.recv().await {
            let task_id = outcome.task_id;
            if let Err(e) = self.finalize(outcome).await {
                error!("Failed to finalize task {}: {}", task_id, e);
            }
        }

        info!("Outcome channel closed, task finalizer stopped");
    }

    /// 落账单个执行结果
    ///
    /// 成功：按名义频率排期下次抓取并交付记录；
    /// 失败：按指数退避排期重试，上限为名义周期
    async fn finalize(&self, outcome: TaskOutcome) -> anyhow::Result<()> {
        let task = self
            .repository
            .find_by_id(outcome.task_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("task {} not found in store", outcome.task_id))?;

        let now = Utc::now();

        match outcome.result {
            Ok(records) => {
                let updated = task.complete(now)?;
                self.repository.update(&updated).await?;
                counter!("crawler_tasks_succeeded_total").increment(1);
                info!(
                    "Task {} succeeded, {} records, next crawl at {}",
                    updated.id,
                    records.len(),
                    updated.next_crawl_at.unwrap_or(now)
                );

                if !records.is_empty() {
                    counter!("crawler_opportunities_extracted_total")
                        .increment(records.len() as u64);
                    // 至少一次投递：失败不回滚任务状态，下个周期重抓补投
                    if let Err(e) = self.sink.ingest(&outcome.site_name, records).await {
                        error!(
                            "Failed to ingest records for site {}: {}",
                            outcome.site_name, e
                        );
                    }
                }
            }
            Err(extract_error) => {
                let attempts = task.consecutive_failures.saturating_add(1) as u32;
                let cap = task.frequency.interval_std();
                let backoff = self.retry_policy.backoff_for(attempts, cap);
                let retry_at = now + chrono::Duration::milliseconds(backoff.as_millis() as i64);

                let message = extract_error.to_string();
                let updated = task.fail(now, message.clone(), retry_at)?;
                self.repository.update(&updated).await?;
                counter!("crawler_tasks_failed_total").increment(1);
                warn!(
                    "Task {} failed (attempt {}): {}, retry at {}",
                    updated.id, updated.consecutive_failures, message, retry_at
                );
            }
        }

        Ok(())
    }
}
