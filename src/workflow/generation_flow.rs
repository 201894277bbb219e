//! 出题流程 - 流程层
//!
//! 核心职责：定义"一个出题请求"的完整处理流程
//!
//! 流程顺序：
//! 1. 调用 LLM 生成 → Normalizer 整形
//! 2. 编号接续后入库（整表追加）
//! 3. 按请求开关做后处理（打乱选项 / 打乱顺序 / 自动重排）
//!
//! 任何一步失败都让错误上抛，题目集合保持未修改状态

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, BusinessError};
use crate::models::bank::QuestionBank;
use crate::models::request::GenerationRequest;
use crate::services::shuffler;
use crate::services::GenerationService;
use crate::workflow::request_ctx::RequestCtx;

/// 出题流程
///
/// - 编排完整的请求处理流程
/// - 不持有题目集合，集合由调用方传入/接收
/// - 只依赖业务能力（services）
pub struct GenerationFlow {
    generation_service: GenerationService,
}

impl GenerationFlow {
    /// 创建新的出题流程
    pub fn new(config: &Config) -> Self {
        Self {
            generation_service: GenerationService::new(config),
        }
    }

    /// 执行一个完整的出题请求，返回装好的题目集合
    pub async fn run(&self, request: &GenerationRequest, ctx: &RequestCtx) -> Result<QuestionBank> {
        info!(
            "[请求 {}] 🧠 正在生成 {} 道题目...",
            ctx.request_index,
            request.total_questions()
        );

        let generated = self.generation_service.generate(request).await?;

        info!(
            "[请求 {}] ✓ 生成完成，得到 {} 道题目",
            ctx.request_index,
            generated.len()
        );

        let mut bank = QuestionBank::new();
        bank.append_generated(generated);

        self.post_process(&mut bank, request, ctx);

        Ok(bank)
    }

    /// 重新生成集合中的单个题目
    ///
    /// 新题保留原 `id` 和 `order`；失败时集合保持不变
    pub async fn regenerate_question(
        &self,
        bank: &mut QuestionBank,
        id: &str,
        instructions: Option<&str>,
    ) -> Result<()> {
        let Some(target) = bank.find(id).cloned() else {
            return Err(AppError::Business(BusinessError::QuestionNotFound {
                id: id.to_string(),
            })
            .into());
        };

        let regenerated = self
            .generation_service
            .regenerate(&target, instructions)
            .await?;

        bank.replace(regenerated);
        Ok(())
    }

    /// 补全集合中题目缺失的字段；失败时集合保持不变
    pub async fn repair_questions(&self, bank: &mut QuestionBank) -> Result<()> {
        let current = bank.sorted();
        let repaired = self.generation_service.repair(&current).await?;

        for question in repaired {
            bank.replace(question);
        }
        Ok(())
    }

    // 按请求开关执行后处理
    fn post_process(&self, bank: &mut QuestionBank, request: &GenerationRequest, ctx: &RequestCtx) {
        let mut rng = rand::thread_rng();

        if request.shuffle_options {
            info!("[请求 {}] 🔀 打乱每题的选项顺序", ctx.request_index);
            bank.apply(|questions| shuffler::shuffle_all_options(questions, &mut rng));
        }

        if request.shuffle_questions {
            info!("[请求 {}] 🔀 打乱题目顺序", ctx.request_index);
            bank.apply(|questions| shuffler::shuffle_questions(questions, &mut rng));
        }

        if request.auto_sort {
            info!("[请求 {}] 🔢 按令牌自动重排编号", ctx.request_index);
            bank.apply(shuffler::reorder_sequentially);
        }
    }
}
