// Copyright (c) 2025 UniFocus
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 服务实现模块
///
/// 提供领域服务接口的具体实现
pub mod ingestion_impl;
