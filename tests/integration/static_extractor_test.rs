// Copyright (c) 2025 UniFocus
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::build_task;
use std::collections::HashMap;
use std::time::Duration;
use unifocus_crawler::domain::models::crawl_task::CrawlFrequency;
use unifocus_crawler::extractors::static_extractor::StaticExtractor;
use unifocus_crawler::extractors::traits::{ExtractError, Extractor};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn extractor() -> StaticExtractor {
    StaticExtractor::new(
        vec!["integration-test-agent".to_string()],
        100.0,
        5,
        Duration::from_secs(5),
    )
    .unwrap()
}

const LIST_PAGE: &str = r#"
    <html><body>
        <div class="news-item">
            <h3>AI Competition</h3>
            <a href="/detail?id=1">more</a>
            <p>National robotics challenge.</p>
        </div>
        <div class="news-item">
            <h3>   </h3>
            <a href="/detail?id=2">more</a>
        </div>
        <div class="news-item">
            <h3>Summer Internship</h3>
            <a href="detail?id=3">more</a>
            <p>Research internship program.</p>
        </div>
    </body></html>
"#;

#[tokio::test]
async fn test_scrape_extracts_and_resolves_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/news/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LIST_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let task = build_task(
        "example",
        &format!("{}/news/list", server.uri()),
        HashMap::new(),
        CrawlFrequency::Hourly,
    );

    let records = extractor().scrape(&task).await.unwrap();

    // 空标题条目被跳过
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "AI Competition");
    assert_eq!(
        records[0].source_url,
        format!("{}/detail?id=1", server.uri())
    );
    assert_eq!(records[1].title, "Summer Internship");
    assert_eq!(
        records[1].source_url,
        format!("{}/news/detail?id=3", server.uri())
    );
    assert!(records.iter().all(|r| !r.title.trim().is_empty()));
}

#[tokio::test]
async fn test_scrape_non_success_status_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let task = build_task(
        "example",
        &server.uri(),
        HashMap::new(),
        CrawlFrequency::Hourly,
    );

    let result = extractor().scrape(&task).await;
    assert!(matches!(result, Err(ExtractError::UnexpectedStatus(503))));
}

#[tokio::test]
async fn test_scrape_connection_error_is_request_failed() {
    // 无人监听的端口，连接立即被拒绝
    let task = build_task(
        "example",
        "http://127.0.0.1:1/news",
        HashMap::new(),
        CrawlFrequency::Hourly,
    );

    let result = extractor().scrape(&task).await;
    assert!(matches!(result, Err(ExtractError::RequestFailed(_))));
}

#[tokio::test]
async fn test_scrape_invalid_target_url_is_invalid_task() {
    let task = build_task(
        "example",
        "not a url at all",
        HashMap::new(),
        CrawlFrequency::Hourly,
    );

    let result = extractor().scrape(&task).await;
    assert!(matches!(result, Err(ExtractError::InvalidTask(_))));
}

#[tokio::test]
async fn test_scrape_with_custom_selector_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/opportunities"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"
            <html><body>
                <article class="card">
                    <span class="headline">Custom Layout</span>
                    <a href="/x/1">open</a>
                    <div class="summary">Body text.</div>
                </article>
            </body></html>
            "#,
        ))
        .mount(&server)
        .await;

    let config = HashMap::from([
        ("item".to_string(), "article.card".to_string()),
        ("title".to_string(), ".headline".to_string()),
        ("content".to_string(), ".summary".to_string()),
    ]);

    let task = build_task(
        "custom",
        &format!("{}/opportunities", server.uri()),
        config,
        CrawlFrequency::Daily,
    );

    let records = extractor().scrape(&task).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Custom Layout");
    assert_eq!(records[0].description, "Body text.");
    assert_eq!(records[0].source_url, format!("{}/x/1", server.uri()));
}
