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

use crate::domain::models::raw_opportunity::RawOpportunity;
use crate::domain::services::ingestion::{IngestionError, IngestionSink};
use async_trait::async_trait;
use metrics::counter;
use reqwest::header;
use serde_json::json;
use std::time::Duration;
use tracing::info;

/// HTTP摄取服务
///
/// 把一批记录POST到下游摄取端点。下游按source_url幂等去重，
/// 因此重复投递是安全的。
pub struct HttpIngestionSink {
    /// HTTP客户端
    client: reqwest::Client,
    /// 摄取端点
    endpoint: String,
}

impl HttpIngestionSink {
    /// 创建HTTP摄取服务
    ///
    /// # 参数
    ///
    /// * `endpoint` - 下游摄取服务地址
    /// * `timeout` - 单次投递超时
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("UniFocus-Crawler/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl IngestionSink for HttpIngestionSink {
    async fn ingest(
        &self,
        site_name: &str,
        records: Vec<RawOpportunity>,
    ) -> Result<(), IngestionError> {
        counter!("crawler_ingestion_batches_total").increment(1);

        let count = records.len();
        let payload = json!({
            "site_name": site_name,
            "opportunities": records,
        });

        let response = self.client.post(&self.endpoint).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            counter!("crawler_ingestion_failures_total").increment(1);
            return Err(IngestionError::Rejected(format!(
                "unexpected status code: {}",
                status.as_u16()
            )));
        }

        info!("Delivered {} records for site {}", count, site_name);
        Ok(())
    }
}

/// 日志摄取服务
///
/// 未配置下游端点时的兜底实现，仅把记录写入日志
#[derive(Default)]
pub struct LoggingIngestionSink;

#[async_trait]
impl IngestionSink for LoggingIngestionSink {
    async fn ingest(
        &self,
        site_name: &str,
        records: Vec<RawOpportunity>,
    ) -> Result<(), IngestionError> {
        for record in &records {
            info!(
                site = site_name,
                title = %record.title,
                source_url = %record.source_url,
                "Extracted opportunity"
            );
        }
        Ok(())
    }
}
