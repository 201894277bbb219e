use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::answer::AnswerKey;
use crate::models::level::Level;
use crate::models::phase::Phase;
use crate::models::qtype::QuestionType;

/// 表格题两极的显示标签对（如 Benar/Salah、Sesuai/Tidak Sesuai）
///
/// JSON 中以 `{"true": "...", "false": "..."}` 形式存储
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfLabels {
    #[serde(rename = "true")]
    pub truthy: String,
    #[serde(rename = "false")]
    pub falsy: String,
}

impl TfLabels {
    pub fn new(truthy: impl Into<String>, falsy: impl Into<String>) -> Self {
        Self {
            truthy: truthy.into(),
            falsy: falsy.into(),
        }
    }
}

/// 题目实体
///
/// 核心不变量：`correct_answer` 的形态必须与 `qtype` 对应，
/// 任何改变题型或打乱选项的操作都要重新推导答案键。
/// JSON 字段名与外部导入/导出格式保持一致（camelCase）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub qtype: QuestionType,
    pub level: Level,
    pub subject: String,
    pub phase: Phase,
    pub material: String,
    pub text: String,
    /// 共享阅读材料，多个题目通过内容完全相等来分组（没有结构化的组 ID）
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stimulus_text: Option<String>,
    pub explanation: String,
    pub options: Vec<String>,
    /// 与 options 逐位对齐的选项图片，整体缺省或逐项为空
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub option_images: Option<Vec<Option<String>>>,
    pub correct_answer: AnswerKey,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tf_labels: Option<TfLabels>,
    /// 题目配图（URL 或 data URL）
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<String>,
    pub quiz_token: String,
    pub order: u32,
    #[serde(default)]
    pub is_deleted: bool,
    /// 创建时间（毫秒时间戳），创建后不再变化
    #[serde(default)]
    pub created_at: i64,
}

impl Question {
    /// 生成新的题目 ID（时间戳 + 随机后缀，满足抗冲突即可）
    pub fn new_id() -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(char::from)
            .collect();
        format!(
            "q_{}_{}",
            chrono::Utc::now().timestamp_millis(),
            suffix.to_lowercase()
        )
    }
}

/// 原始题目记录
///
/// LLM 响应和表格行的宽松镜像：所有字段可缺失，
/// 答案键和选项保留为 JSON 值，形态交给 Normalizer 解析。
/// 字段别名覆盖外部 camelCase 命名。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawQuestion {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub qtype: Option<String>,
    pub level: Option<String>,
    pub subject: Option<String>,
    pub phase: Option<String>,
    pub material: Option<String>,
    pub text: Option<String>,
    #[serde(alias = "stimulusText")]
    pub stimulus_text: Option<String>,
    pub explanation: Option<String>,
    pub options: Option<Vec<JsonValue>>,
    #[serde(alias = "optionImages")]
    pub option_images: Option<Vec<Option<String>>>,
    #[serde(alias = "correctAnswer")]
    pub correct_answer: Option<JsonValue>,
    #[serde(alias = "tfLabels")]
    pub tf_labels: Option<JsonValue>,
    pub image: Option<String>,
    #[serde(alias = "quizToken", deserialize_with = "deserialize_loose_string")]
    pub quiz_token: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_u32")]
    pub order: Option<u32>,
    #[serde(alias = "isDeleted")]
    pub is_deleted: Option<bool>,
    #[serde(alias = "createdAt")]
    pub created_at: Option<i64>,
}

// Helper: 把字符串或数字统一反序列化为字符串
fn deserialize_loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(match value {
        JsonValue::String(s) => Some(s),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

// Helper: 把字符串或数字统一反序列化为 u32，无法解析时为 None
fn deserialize_loose_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct LooseU32Visitor;

    impl<'de> Visitor<'de> for LooseU32Visitor {
        type Value = Option<u32>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer order value")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.trim().parse::<u32>().ok())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(u32::try_from(value).ok())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(u32::try_from(value).ok())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value.is_finite() && value >= 0.0 {
                Ok(Some(value as u32))
            } else {
                Ok(None)
            }
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(LooseU32Visitor)
}
