//! 单请求处理器 - 编排层
//!
//! 负责一个出题请求文件的端到端处理：
//! 生成 → 后处理 → 导出（JSON / Excel / naskah / kisi-kisi）

use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::bank::QuestionBank;
use crate::models::loaders::request_loader::RequestFile;
use crate::models::loaders::save_questions;
use crate::services::exporter::{export_kisi_kisi_doc, export_naskah_doc, safe_file_stem};
use crate::services::spreadsheet::export_questions_xlsx;
use crate::utils::logging::truncate_text;
use crate::workflow::{GenerationFlow, RequestCtx};

/// 处理单个出题请求
///
/// # 参数
/// - `request_file`: 请求文件
/// - `request_index`: 请求索引（用于日志）
/// - `config`: 配置
///
/// # 返回
/// 返回是否成功处理
pub async fn process_request(
    request_file: &RequestFile,
    request_index: usize,
    config: &Config,
) -> Result<bool> {
    let ctx = RequestCtx::new(
        &request_file.name,
        request_index,
        &request_file.request.quiz_token,
    );

    log_request_start(request_index, request_file);

    let flow = GenerationFlow::new(config);
    let bank = flow.run(&request_file.request, &ctx).await?;

    if bank.is_empty() {
        warn!("[请求 {}] ⚠️ 没有生成任何题目，跳过导出", request_index);
        return Ok(false);
    }

    if config.verbose_logging {
        log_generated_questions(request_index, &bank);
    }

    export_bank(&bank, request_file, config).await?;

    info!(
        "[请求 {}] ✅ 请求处理完成，共 {} 道题目\n",
        request_index,
        bank.len()
    );

    Ok(true)
}

/// 把题目集合导出为全部目标格式
async fn export_bank(bank: &QuestionBank, request_file: &RequestFile, config: &Config) -> Result<()> {
    let output = Path::new(&config.output_folder);
    tokio::fs::create_dir_all(output).await?;

    // JSON 保留完整列表（含回收站），与导入格式互逆
    let json_path = output.join(format!("{}.json", request_file.name));
    save_questions(&json_path, &bank.sorted()).await?;

    let active = bank.active();

    let xlsx_path = output.join(format!("{}.xlsx", request_file.name));
    export_questions_xlsx(&active, &xlsx_path)?;

    let stem = safe_file_stem(&request_file.request.subject);
    export_naskah_doc(&active, &output.join(format!("Soal_{}.doc", stem))).await?;
    export_kisi_kisi_doc(&active, &output.join(format!("KisiKisi_{}.doc", stem))).await?;

    info!(
        "已导出: {}, {}, Soal_{}.doc, KisiKisi_{}.doc",
        json_path.display(),
        xlsx_path.display(),
        stem,
        stem
    );

    Ok(())
}

// ========== 日志辅助函数 ==========

fn log_request_start(request_index: usize, request_file: &RequestFile) {
    info!("[请求 {}] 开始处理", request_index);
    info!("[请求 {}] 名称: {}", request_index, request_file.name);
    info!(
        "[请求 {}] 学科: {} | 材料: {} | 令牌: {}",
        request_index,
        request_file.request.subject,
        truncate_text(&request_file.request.material, 40),
        request_file.request.quiz_token
    );
    info!(
        "[请求 {}] 计划题数: {}",
        request_index,
        request_file.request.total_questions()
    );
}

fn log_generated_questions(request_index: usize, bank: &QuestionBank) {
    for question in bank.sorted().iter().take(3) {
        info!(
            "[请求 {}]   {}. [{}] {}",
            request_index,
            question.order,
            question.qtype,
            truncate_text(&question.text, 60)
        );
    }
}
