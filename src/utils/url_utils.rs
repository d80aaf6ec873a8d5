// Copyright (c) 2025 UniFocus
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的链接解析为绝对路径URL
///
/// 绝对链接原样返回；以`/`开头的链接继承base的协议和域名；
/// 其余相对链接基于base的最后一个路径段解析
pub fn resolve_url(base_url: &Url, link: &str) -> Result<Url, ParseError> {
    base_url.join(link)
}
