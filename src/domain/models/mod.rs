// Copyright (c) 2025 UniFocus
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了爬虫子系统的核心业务实体，包括：
/// - 爬取任务（crawl_task）：周期性抓取的工作单元及其状态机
/// - 原始机会（raw_opportunity）：提取器产出的规范化记录
pub mod crawl_task;
pub mod raw_opportunity;
