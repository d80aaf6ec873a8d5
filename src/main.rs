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

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use unifocus_crawler::config::settings::Settings;
use unifocus_crawler::domain::models::crawl_task::{CrawlFrequency, CrawlTask};
use unifocus_crawler::domain::repositories::crawl_task_repository::CrawlTaskRepository;
use unifocus_crawler::domain::services::ingestion::IngestionSink;
use unifocus_crawler::extractors::registry::ExtractorRegistry;
use unifocus_crawler::extractors::static_extractor::StaticExtractor;
use unifocus_crawler::infrastructure::repositories::memory_task_repo_impl::InMemoryCrawlTaskRepository;
use unifocus_crawler::infrastructure::services::ingestion_impl::{
    HttpIngestionSink, LoggingIngestionSink,
};
use unifocus_crawler::scheduler::CrawlScheduler;
use unifocus_crawler::utils::telemetry;

/// 种子任务定义（YAML）
#[derive(Debug, Deserialize)]
struct SeedTask {
    site_name: String,
    target_url: String,
    #[serde(default)]
    selector_config: HashMap<String, String>,
    #[serde(default)]
    frequency: CrawlFrequency,
}

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动调度器
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting unifocus-crawler...");

    // 2. Load settings
    let settings = Settings::new()?;
    info!(
        "Configuration loaded: {} workers, tick every {:?}",
        settings.crawler.worker_count,
        settings.crawler.tick_interval()
    );

    // 3. Task store
    let repository = Arc::new(InMemoryCrawlTaskRepository::new());
    if let Some(tasks_file) = &settings.crawler.tasks_file {
        let count = seed_tasks(repository.as_ref(), tasks_file).await?;
        info!("Seeded {} tasks from {}", count, tasks_file);
    }

    // 4. Extractor registry
    let static_extractor = StaticExtractor::new(
        settings.crawler.user_agents.clone(),
        settings.crawler.rate_limit.requests_per_second,
        settings.crawler.rate_limit.burst,
        settings.crawler.request_timeout(),
    )?;
    let registry = Arc::new(ExtractorRegistry::new(vec![Arc::new(static_extractor)]));

    // 5. Ingestion sink
    let sink: Arc<dyn IngestionSink> = match &settings.ingestion.endpoint {
        Some(endpoint) => {
            info!("Delivering records to {}", endpoint);
            Arc::new(HttpIngestionSink::new(
                endpoint.clone(),
                settings.ingestion.timeout(),
            )?)
        }
        None => {
            info!("No ingestion endpoint configured, logging records only");
            Arc::new(LoggingIngestionSink)
        }
    };

    // 6. Scheduler
    let scheduler = CrawlScheduler::new(
        repository,
        registry,
        sink,
        settings.crawler.clone(),
        settings.crawler.retry.policy(),
    );
    let handle = scheduler.start();

    // 7. Wait for shutdown signal
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => tracing::error!("Unable to listen for shutdown signal: {}", e),
    }

    info!("Shutting down scheduler...");
    handle.abort();
    info!("Scheduler shut down successfully");

    Ok(())
}

/// 从YAML文件加载种子任务
async fn seed_tasks(
    repository: &InMemoryCrawlTaskRepository,
    tasks_file: &str,
) -> anyhow::Result<usize> {
    let content = tokio::fs::read_to_string(tasks_file).await?;
    let seeds: Vec<SeedTask> = serde_yaml::from_str(&content)?;

    let mut count = 0;
    for seed in seeds {
        let task = CrawlTask::new(
            seed.site_name,
            seed.target_url,
            seed.selector_config,
            seed.frequency,
        );
        repository.create(&task).await?;
        count += 1;
    }

    Ok(count)
}
