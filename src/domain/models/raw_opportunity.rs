// Copyright (c) 2025 UniFocus
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 提取器产出的原始机会数据
///
/// 由一次提取调用产出，交付给下游摄取服务后爬虫不再持有引用。
/// 下游以source_url做幂等去重，因此允许至少一次投递。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOpportunity {
    /// 标题，非空
    pub title: String,
    /// 描述内容
    pub description: String,
    /// 来源URL，已解析为绝对地址
    pub source_url: String,
    /// 条目的原始HTML片段
    pub html_content: Option<String>,
    /// 提取时间戳
    pub extracted_at: DateTime<Utc>,
}
