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
use async_trait::async_trait;
use thiserror::Error;

/// 提取错误类型
///
/// 一次提取调用的所有失败都折叠为单个错误值，
/// 重试由调度器的退避策略负责，提取器内部从不重试
#[derive(Error, Debug)]
pub enum ExtractError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 非预期的HTTP状态码
    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(u16),
    /// 内容解析失败
    #[error("Parse error: {0}")]
    Parse(String),
    /// 执行超时
    #[error("Extraction timed out")]
    Timeout,
    /// 没有提取器能处理该任务
    #[error("No extractor found for site: {0}")]
    NoExtractorFound(String),
    /// 任务数据无效
    #[error("Invalid task: {0}")]
    InvalidTask(String),
    /// 其他错误
    #[error("Extraction error: {0}")]
    Other(String),
}

/// 提取器特质
///
/// 一个提取策略：抓取单个任务的目标页面并解析为规范化记录。
/// 新的抓取方式（如渲染页面提取）作为新的实现注册到注册表，
/// 而不是在现有提取器内部分支。
#[async_trait]
pub trait Extractor: Send + Sync {
    /// 执行提取
    ///
    /// 每发出一次物理请求必须恰好调用一次自身的限流器
    async fn scrape(&self, task: &CrawlTask) -> Result<Vec<RawOpportunity>, ExtractError>;

    /// 判断是否能处理该任务
    fn can_handle(&self, task: &CrawlTask) -> bool;

    /// 提取器名称
    fn name(&self) -> &'static str;
}
