// Copyright (c) 2025 UniFocus
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_task::CrawlTask;
use crate::extractors::traits::{ExtractError, Extractor};
use std::sync::Arc;

/// 提取器注册表
///
/// 负责把任务路由到能处理它的提取器。路由按注册顺序取第一个
/// 声明能处理的提取器，新的抓取策略通过追加注册项加入。
pub struct ExtractorRegistry {
    /// 提取器列表
    extractors: Vec<Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// 创建新的提取器注册表
    pub fn new(extractors: Vec<Arc<dyn Extractor>>) -> Self {
        Self { extractors }
    }

    /// 为任务解析提取器
    ///
    /// # 返回值
    ///
    /// * `Ok(Arc<dyn Extractor>)` - 第一个声明能处理该任务的提取器
    /// * `Err(ExtractError::NoExtractorFound)` - 没有提取器声明该任务，
    ///   属于单任务级失败，不影响调度器本身
    pub fn resolve(&self, task: &CrawlTask) -> Result<Arc<dyn Extractor>, ExtractError> {
        self.extractors
            .iter()
            .find(|extractor| extractor.can_handle(task))
            .cloned()
            .ok_or_else(|| ExtractError::NoExtractorFound(task.site_name.clone()))
    }
}
