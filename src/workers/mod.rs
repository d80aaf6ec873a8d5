// Copyright (c) 2025 UniFocus
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供有界并发的提取执行
/// 包括任务级超时、取消和panic隔离
pub mod pool;

pub use pool::{TaskOutcome, WorkerPool};
