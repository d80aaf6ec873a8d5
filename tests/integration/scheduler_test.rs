// Copyright (c) 2025 UniFocus
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{build_task, fast_settings, wait_until, RecordingSink};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use unifocus_crawler::config::settings::CrawlerSettings;
use unifocus_crawler::domain::models::crawl_task::{CrawlFrequency, CrawlTaskStatus};
use unifocus_crawler::domain::repositories::crawl_task_repository::CrawlTaskRepository;
use unifocus_crawler::extractors::registry::ExtractorRegistry;
use unifocus_crawler::extractors::static_extractor::StaticExtractor;
use unifocus_crawler::infrastructure::repositories::memory_task_repo_impl::InMemoryCrawlTaskRepository;
use unifocus_crawler::scheduler::CrawlScheduler;
use unifocus_crawler::utils::retry_policy::RetryPolicy;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn build_scheduler(
    repository: Arc<InMemoryCrawlTaskRepository>,
    sink: Arc<RecordingSink>,
    settings: CrawlerSettings,
    retry_policy: RetryPolicy,
) -> CrawlScheduler<InMemoryCrawlTaskRepository> {
    let extractor = StaticExtractor::new(
        vec!["integration-test-agent".to_string()],
        100.0,
        5,
        settings.request_timeout(),
    )
    .unwrap();
    let registry = Arc::new(ExtractorRegistry::new(vec![Arc::new(extractor)]));

    CrawlScheduler::new(repository, registry, sink, settings, retry_policy)
}

#[tokio::test]
async fn test_end_to_end_success_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/news/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"
            <html><body>
                <div class="news-item"><h3>AI Competition</h3>
                    <a href="/detail?id=1">more</a><p>desc one</p></div>
                <div class="news-item"><h3>  </h3>
                    <a href="/detail?id=2">more</a></div>
                <div class="news-item"><h3>Summer Internship</h3>
                    <a href="detail?id=3">more</a><p>desc two</p></div>
            </body></html>
            "#,
        ))
        // 每小时频率的任务在整个测试窗口内只被抓取一次：无重复派发
        .expect(1)
        .mount(&server)
        .await;

    let repository = Arc::new(InMemoryCrawlTaskRepository::new());
    let task = build_task(
        "example-site",
        &format!("{}/news/list", server.uri()),
        HashMap::new(),
        CrawlFrequency::Hourly,
    );
    repository.create(&task).await.unwrap();

    let sink = Arc::new(RecordingSink::default());
    let scheduler = build_scheduler(
        repository.clone(),
        sink.clone(),
        fast_settings(),
        RetryPolicy::default(),
    );
    let handle = scheduler.start();

    wait_until(Duration::from_secs(10), || {
        let repository = repository.clone();
        async move {
            repository
                .find_by_id(task.id)
                .await
                .unwrap()
                .is_some_and(|t| t.status == CrawlTaskStatus::Success)
        }
    })
    .await;

    // 让调度器再走几个周期，验证成功后的任务不会被重复派发
    tokio::time::sleep(Duration::from_millis(2500)).await;
    handle.abort();

    let updated = repository.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(updated.status, CrawlTaskStatus::Success);
    assert_eq!(updated.consecutive_failures, 0);
    assert!(updated.error_message.is_none());
    // 每小时频率：下次抓取恰好在上次成功后1小时
    assert_eq!(
        updated.next_crawl_at.unwrap() - updated.last_crawled_at.unwrap(),
        chrono::Duration::hours(1)
    );

    let batches = sink.batches.lock();
    assert_eq!(batches.len(), 1);
    let (site, records) = &batches[0];
    assert_eq!(site, "example-site");
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| !r.title.trim().is_empty()));
    assert_eq!(
        records[0].source_url,
        format!("{}/detail?id=1", server.uri())
    );
}

#[tokio::test]
async fn test_failing_source_gets_backoff_and_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let repository = Arc::new(InMemoryCrawlTaskRepository::new());
    let task = build_task(
        "broken-site",
        &format!("{}/news", server.uri()),
        HashMap::new(),
        CrawlFrequency::Hourly,
    );
    repository.create(&task).await.unwrap();

    let sink = Arc::new(RecordingSink::default());
    // 快速退避让重试落在测试窗口内
    let scheduler = build_scheduler(
        repository.clone(),
        sink.clone(),
        fast_settings(),
        RetryPolicy::new(Duration::from_millis(200), 2.0),
    );
    let handle = scheduler.start();

    wait_until(Duration::from_secs(15), || {
        let repository = repository.clone();
        async move {
            repository
                .find_by_id(task.id)
                .await
                .unwrap()
                .is_some_and(|t| t.consecutive_failures >= 2)
        }
    })
    .await;
    handle.abort();

    let updated = repository.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(updated.status, CrawlTaskStatus::Failed);
    assert!(updated.consecutive_failures >= 2);
    assert!(updated
        .error_message
        .as_deref()
        .unwrap()
        .contains("Unexpected status code: 500"));
    assert!(updated.next_crawl_at.is_some());
    assert!(sink.batches.lock().is_empty());
}

#[tokio::test]
async fn test_slow_source_fails_with_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html></html>")
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let repository = Arc::new(InMemoryCrawlTaskRepository::new());
    let task = build_task(
        "slow-site",
        &format!("{}/news", server.uri()),
        HashMap::new(),
        CrawlFrequency::Hourly,
    );
    repository.create(&task).await.unwrap();

    let settings = CrawlerSettings {
        // 任务级超时先于HTTP超时触发
        task_timeout_secs: Some(1),
        request_timeout_secs: 60,
        ..fast_settings()
    };

    let sink = Arc::new(RecordingSink::default());
    let scheduler = build_scheduler(
        repository.clone(),
        sink.clone(),
        settings,
        RetryPolicy::default(),
    );
    let handle = scheduler.start();

    wait_until(Duration::from_secs(10), || {
        let repository = repository.clone();
        async move {
            repository
                .find_by_id(task.id)
                .await
                .unwrap()
                .is_some_and(|t| t.status == CrawlTaskStatus::Failed)
        }
    })
    .await;
    handle.abort();

    let updated = repository.find_by_id(task.id).await.unwrap().unwrap();
    assert!(updated
        .error_message
        .as_deref()
        .unwrap()
        .contains("timed out"));
    assert_eq!(updated.consecutive_failures, 1);
}

#[tokio::test]
async fn test_unroutable_task_fails_without_crashing_scheduler() {
    let repository = Arc::new(InMemoryCrawlTaskRepository::new());

    // mode=dynamic：静态提取器不认领，注册表里也没有渲染提取器
    let unroutable = build_task(
        "dynamic-site",
        "https://example.com/app",
        HashMap::from([("mode".to_string(), "dynamic".to_string())]),
        CrawlFrequency::Daily,
    );
    repository.create(&unroutable).await.unwrap();

    let sink = Arc::new(RecordingSink::default());
    let scheduler = build_scheduler(
        repository.clone(),
        sink.clone(),
        fast_settings(),
        RetryPolicy::default(),
    );
    let handle = scheduler.start();

    wait_until(Duration::from_secs(10), || {
        let repository = repository.clone();
        async move {
            repository
                .find_by_id(unroutable.id)
                .await
                .unwrap()
                .is_some_and(|t| t.status == CrawlTaskStatus::Failed)
        }
    })
    .await;
    handle.abort();

    let updated = repository.find_by_id(unroutable.id).await.unwrap().unwrap();
    assert!(updated
        .error_message
        .as_deref()
        .unwrap()
        .contains("No extractor found for site: dynamic-site"));
}
