use std::collections::BTreeMap;

use serde::Deserialize;

use crate::models::phase::Phase;

/// 出题请求配置
///
/// 从请求 TOML 文件加载；字段别名兼容外部 camelCase JSON 配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    /// 学科名称（如 "Matematika"、"IPA"）
    pub subject: String,
    /// 学段
    pub phase: Phase,
    /// 教学材料/知识点
    pub material: String,
    /// 每种题型的出题数量（键为题型标签）
    #[serde(alias = "typeCounts")]
    pub type_counts: BTreeMap<String, u32>,
    /// 每个认知层级的出题数量（键为 L1/L2/L3）
    #[serde(alias = "levelCounts")]
    pub level_counts: BTreeMap<String, u32>,
    /// 试卷包令牌
    #[serde(alias = "quizToken")]
    pub quiz_token: String,
    /// 参考文本（可选）
    #[serde(alias = "referenceText")]
    pub reference_text: Option<String>,
    /// 参考图片（可选）
    #[serde(alias = "referenceImage")]
    pub reference_image: Option<ReferenceImage>,
    /// 额外出题指令（可选）
    #[serde(alias = "specialInstructions")]
    pub special_instructions: Option<String>,

    // --- 后处理开关 ---
    /// 生成后打乱题目顺序
    #[serde(alias = "shuffleQuestions")]
    pub shuffle_questions: bool,
    /// 生成后打乱每题的选项顺序
    #[serde(alias = "shuffleOptions")]
    pub shuffle_options: bool,
    /// 生成后按（令牌, 原顺序）自动重排编号
    #[serde(alias = "autoSort")]
    pub auto_sort: bool,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            subject: String::new(),
            phase: Phase::D,
            material: String::new(),
            type_counts: BTreeMap::new(),
            level_counts: BTreeMap::new(),
            quiz_token: String::new(),
            reference_text: None,
            reference_image: None,
            special_instructions: None,
            shuffle_questions: false,
            shuffle_options: false,
            auto_sort: false,
        }
    }
}

impl GenerationRequest {
    /// 请求的总题数（按题型数量合计）
    pub fn total_questions(&self) -> u32 {
        self.type_counts.values().sum()
    }
}

/// 参考图片
///
/// `path` 指向本地文件（发送前编码为 base64），
/// `data` 直接携带已编码内容；二者至少提供一个
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceImage {
    pub path: Option<String>,
    pub data: Option<String>,
    #[serde(alias = "mimeType", default = "default_mime_type")]
    pub mime_type: String,
}

fn default_mime_type() -> String {
    "image/png".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_toml() {
        let content = r#"
            subject = "Matematika"
            phase = "Fase D"
            material = "Aljabar linear"
            quiz_token = "MTK-01"
            shuffle_options = true

            [type_counts]
            "Pilihan Ganda" = 5
            "(Benar/Salah)" = 2

            [level_counts]
            L1 = 3
            L2 = 4
        "#;

        let request: GenerationRequest = toml::from_str(content).unwrap();
        assert_eq!(request.subject, "Matematika");
        assert_eq!(request.phase, Phase::D);
        assert_eq!(request.total_questions(), 7);
        assert!(request.shuffle_options);
        assert!(!request.shuffle_questions);
        assert_eq!(request.level_counts.get("L2"), Some(&4));
    }
}
