use std::path::Path;

use tokio::fs;

use crate::error::{AppError, AppResult};
use crate::models::question::{Question, RawQuestion};

/// 从 JSON 文件加载原始题目数组
///
/// 文件本身不可读或不是合法 JSON 才算错误；
/// 单个题目字段畸形由 Normalizer 降级处理
pub async fn load_raw_questions(path: &Path) -> AppResult<Vec<RawQuestion>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    serde_json::from_str(&content)
        .map_err(|e| AppError::json_parse_failed(path.display().to_string(), e))
}

/// 从多个 JSON 文件加载并按拼接合并（文件顺序即合并顺序）
pub async fn load_and_merge_raw_questions(paths: &[&Path]) -> AppResult<Vec<RawQuestion>> {
    let results = futures::future::join_all(paths.iter().map(|path| load_raw_questions(path))).await;

    let mut merged = Vec::new();
    for (path, result) in paths.iter().zip(results) {
        let loaded = result?;
        tracing::info!("成功加载 {} 个题目: {}", loaded.len(), path.display());
        merged.extend(loaded);
    }
    Ok(merged)
}

/// 把题目集合写出为 JSON 文件（与导入格式互逆）
pub async fn save_questions(path: &Path, questions: &[Question]) -> AppResult<()> {
    let json = serde_json::to_string_pretty(questions)
        .map_err(|e| AppError::json_parse_failed(path.display().to_string(), e))?;

    fs::write(path, json)
        .await
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))
}
