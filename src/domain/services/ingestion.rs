// Copyright (c) 2025 UniFocus
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::raw_opportunity::RawOpportunity;
use async_trait::async_trait;
use thiserror::Error;

/// 摄取错误类型
#[derive(Error, Debug)]
pub enum IngestionError {
    /// 投递失败
    #[error("Delivery failed: {0}")]
    DeliveryFailed(#[from] reqwest::Error),
    /// 下游拒绝
    #[error("Rejected by downstream: {0}")]
    Rejected(String),
}

/// 摄取服务特质
///
/// 每次任务执行成功后接收一批规范化记录。投递语义为至少一次：
/// 提取完成但交付前崩溃会在下个周期重复投递，下游按source_url幂等去重。
#[async_trait]
pub trait IngestionSink: Send + Sync {
    /// 投递一批原始机会记录
    async fn ingest(
        &self,
        site_name: &str,
        records: Vec<RawOpportunity>,
    ) -> Result<(), IngestionError>;
}
