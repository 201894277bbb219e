//! 批量请求处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量出题请求的处理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动日志、校验配置
//! 2. **批量加载**：扫描并加载所有待处理的请求（`Vec<RequestFile>`）
//! 3. **并发控制**：使用 Semaphore 限制并发数量
//! 4. **分批处理**：将请求分批次处理，每批完成后再开始下一批
//! 5. **全局统计**：汇总所有请求的处理结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个请求的细节，向下委托 request_processor
//! - **请求相互独立**：每个请求有自己的题目集合，集合内部不存在并发修改

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;
use tracing::{error, warn};

use crate::config::Config;
use crate::models::loaders::request_loader::{load_all_request_files, RequestFile};
use crate::orchestrator::request_processor;
use crate::utils::logging::{
    log_batch_complete, log_batch_start, log_requests_loaded, log_startup, print_final_stats,
};

/// 应用主结构
pub struct App {
    config: Config,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Self {
        log_startup(config.max_concurrent_requests);
        Self { config }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let all_requests = load_all_request_files(&self.config.request_folder).await?;

        if all_requests.is_empty() {
            warn!("⚠️ 没有找到待处理的请求文件，程序结束");
            return Ok(());
        }

        let total = all_requests.len();
        log_requests_loaded(total, self.config.max_concurrent_requests);

        let stats = self.process_all_requests(all_requests).await?;

        print_final_stats(stats.success, stats.failed, total, &self.config.output_folder);

        Ok(())
    }

    /// 分批处理所有请求
    async fn process_all_requests(&self, all_requests: Vec<RequestFile>) -> Result<ProcessingStats> {
        let batch_size = self.config.max_concurrent_requests.max(1);
        let semaphore = Arc::new(Semaphore::new(batch_size));
        let total = all_requests.len();
        let mut stats = ProcessingStats::default();

        for batch_start in (0..total).step_by(batch_size) {
            let batch_end = (batch_start + batch_size).min(total);
            let batch = &all_requests[batch_start..batch_end];
            let batch_num = batch_start / batch_size + 1;
            let total_batches = (total + batch_size - 1) / batch_size;

            log_batch_start(batch_num, total_batches, batch_start + 1, batch_end, total);

            let batch_result = self.process_batch(batch, batch_start, semaphore.clone()).await?;

            stats.success += batch_result.success;
            stats.failed += batch_result.failed;

            log_batch_complete(batch_num, batch_result.success, batch.len());
        }

        Ok(stats)
    }

    /// 处理单个批次
    async fn process_batch(
        &self,
        batch: &[RequestFile],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<BatchResult> {
        let mut handles = Vec::new();

        for (idx, request_file) in batch.iter().enumerate() {
            let request_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;

            let request_clone = request_file.clone();
            let config_clone = self.config.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                request_processor::process_request(&request_clone, request_index, &config_clone)
                    .await
            });
            handles.push((request_index, handle));
        }

        let mut result = BatchResult::default();
        for (request_index, handle) in handles {
            match handle.await {
                Ok(Ok(true)) => result.success += 1,
                Ok(Ok(false)) => result.failed += 1,
                Ok(Err(e)) => {
                    error!("[请求 {}] ❌ 处理过程中发生错误: {}", request_index, e);
                    result.failed += 1;
                }
                Err(e) => {
                    error!("[请求 {}] 任务执行失败: {}", request_index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
}
