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
use crate::extractors::rate_limiter::RateLimiter;
use crate::extractors::traits::{ExtractError, Extractor};
use crate::utils::url_utils;
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use reqwest::header;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// 无配置时的内置选择器
static DEFAULT_SELECTORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("item", ".opportunity-item, .news-item, .notice-item"),
        ("title", "h3, .title, a"),
        ("link", "a"),
        ("content", ".content, .description, p"),
    ])
});

/// User-Agent列表为空时的兜底值
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// 静态页面提取器
///
/// 基于reqwest抓取静态HTML，按任务的selector_config规则提取条目。
/// 每次请求使用随机User-Agent。
pub struct StaticExtractor {
    client: reqwest::Client,
    user_agents: Vec<String>,
    rate_limiter: RateLimiter,
}

impl StaticExtractor {
    /// 创建静态页面提取器
    ///
    /// # 参数
    ///
    /// * `user_agents` - 轮换的User-Agent池
    /// * `requests_per_second` - 该提取器的出站速率
    /// * `burst` - 突发额度（配置兼容）
    /// * `request_timeout` - 单次HTTP请求超时
    pub fn new(
        user_agents: Vec<String>,
        requests_per_second: f64,
        burst: u32,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            user_agents,
            rate_limiter: RateLimiter::new(requests_per_second, burst),
        })
    }

    fn random_user_agent(&self) -> &str {
        if self.user_agents.is_empty() {
            return DEFAULT_USER_AGENT;
        }
        let index = rand::random_range(0..self.user_agents.len());
        &self.user_agents[index]
    }

    /// 取任务配置的选择器，缺省时回退到内置选择器
    fn selector(
        config: &HashMap<String, String>,
        key: &'static str,
    ) -> Result<Selector, ExtractError> {
        let raw = config
            .get(key)
            .map(String::as_str)
            .unwrap_or_else(|| DEFAULT_SELECTORS[key]);

        Selector::parse(raw)
            .map_err(|e| ExtractError::Parse(format!("invalid '{}' selector: {}", key, e)))
    }

    /// 从响应体中提取条目
    ///
    /// 标题去除首尾空白后为空的条目被跳过；相对链接基于任务URL
    /// 解析为绝对地址；条目没有链接时回退到任务URL本身。
    pub fn parse_records(
        base_url: &Url,
        selector_config: &HashMap<String, String>,
        body: &str,
    ) -> Result<Vec<RawOpportunity>, ExtractError> {
        let item_selector = Self::selector(selector_config, "item")?;
        let title_selector = Self::selector(selector_config, "title")?;
        let link_selector = Self::selector(selector_config, "link")?;
        let content_selector = Self::selector(selector_config, "content")?;

        let document = Html::parse_document(body);
        let mut records = Vec::new();

        for item in document.select(&item_selector) {
            let title = item
                .select(&title_selector)
                .next()
                .map(|e| e.text().collect::<Vec<_>>().join(" ").trim().to_string())
                .unwrap_or_default();

            if title.is_empty() {
                continue;
            }

            let source_url = item
                .select(&link_selector)
                .next()
                .and_then(|e| e.value().attr("href"))
                .filter(|href| !href.trim().is_empty())
                .and_then(|href| url_utils::resolve_url(base_url, href).ok())
                .map(|u| u.to_string())
                .unwrap_or_else(|| base_url.to_string());

            let description = item
                .select(&content_selector)
                .next()
                .map(|e| e.text().collect::<Vec<_>>().join(" ").trim().to_string())
                .unwrap_or_default();

            records.push(RawOpportunity {
                title,
                description,
                source_url,
                html_content: Some(item.html()),
                extracted_at: Utc::now(),
            });
        }

        Ok(records)
    }
}

#[async_trait]
impl Extractor for StaticExtractor {
    /// 抓取静态页面并提取条目
    async fn scrape(&self, task: &CrawlTask) -> Result<Vec<RawOpportunity>, ExtractError> {
        self.rate_limiter.wait().await;

        let base_url = Url::parse(&task.target_url)
            .map_err(|e| ExtractError::InvalidTask(format!("invalid target URL: {}", e)))?;

        let response = self
            .client
            .get(base_url.clone())
            .header(header::USER_AGENT, self.random_user_agent())
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(header::ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9,en;q=0.8")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.text().await?;

        // Html is not Send, keep parsing out of any await scope
        Self::parse_records(&base_url, &task.selector_config, &body)
    }

    /// 能处理http(s)目标且未要求渲染模式的任务
    fn can_handle(&self, task: &CrawlTask) -> bool {
        let scheme_ok = match Url::parse(&task.target_url) {
            Ok(url) => matches!(url.scheme(), "http" | "https"),
            Err(_) => false,
        };

        let mode_ok = task
            .selector_config
            .get("mode")
            .map(String::as_str)
            .is_none_or(|mode| mode == "static");

        scheme_ok && mode_ok
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
