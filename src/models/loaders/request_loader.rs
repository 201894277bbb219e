use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{AppError, AppResult, BusinessError, FileError};
use crate::models::request::GenerationRequest;

/// 出题请求文件（文件名主干用于输出命名）
#[derive(Debug, Clone)]
pub struct RequestFile {
    pub name: String,
    pub request: GenerationRequest,
}

/// 从 TOML 文件加载数据并转换为出题请求
pub async fn load_request_file(toml_file_path: &Path) -> AppResult<RequestFile> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(toml_file_path.display().to_string(), e))?;

    let request: GenerationRequest = toml::from_str(&content)
        .map_err(|e| AppError::toml_parse_failed(toml_file_path.display().to_string(), e))?;

    let name = toml_file_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    if request.type_counts.is_empty() {
        return Err(AppError::Business(BusinessError::EmptyTypeCounts {
            request_name: name,
        }));
    }

    Ok(RequestFile { name, request })
}

/// 从文件夹中加载所有 TOML 请求文件
///
/// 单个文件解析失败只记录警告，不中断整批加载
pub async fn load_all_request_files(folder_path: &str) -> AppResult<Vec<RequestFile>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(AppError::File(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }));
    }

    let mut requests = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            tracing::info!(
                "正在加载请求: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );

            match load_request_file(&path).await {
                Ok(request_file) => {
                    tracing::info!(
                        "成功加载请求 {} (共 {} 道题)",
                        request_file.name,
                        request_file.request.total_questions()
                    );
                    requests.push(request_file);
                }
                Err(e) => {
                    tracing::warn!("加载请求失败 {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_request_file() {
        let dir = std::env::temp_dir().join("educbt_request_loader_test");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("permintaan.toml");

        let content = r#"
            subject = "IPA"
            phase = "Fase D"
            material = "Sistem pencernaan"
            quiz_token = "IPA-01"

            [type_counts]
            "Pilihan Ganda" = 3
        "#;
        tokio::fs::write(&path, content).await.unwrap();

        let loaded = load_request_file(&path).await.unwrap();
        assert_eq!(loaded.name, "permintaan");
        assert_eq!(loaded.request.subject, "IPA");
        assert_eq!(loaded.request.total_questions(), 3);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_request_without_counts_is_error() {
        let dir = std::env::temp_dir().join("educbt_request_loader_test");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("kosong.toml");

        tokio::fs::write(&path, "subject = \"IPA\"\n").await.unwrap();

        let result = load_request_file(&path).await;
        assert!(result.is_err());

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_folder_is_error() {
        let result = load_all_request_files("/tidak/ada/folder").await;
        assert!(result.is_err());
    }
}
