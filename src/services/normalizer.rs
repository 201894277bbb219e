//! 题目规范化服务 - 业务能力层
//!
//! 核心职责：把不可信的外部输入（LLM JSON 响应、表格行）整形为
//! 满足数据模型不变量的 Question
//!
//! - 只处理单个题目
//! - 答案键形态按解析出的题型强制对齐
//! - 对畸形输入永不报错，总是产出尽力而为的结果
//!   （输入来自非确定性的外部生成器，报错没有意义）
//! - 规范化是幂等的：对已规范的题目再跑一遍结果不变

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value as JsonValue;

use crate::models::answer::{letter_to_index, parse_bool_token, split_tokens, AnswerKey};
use crate::models::level::Level;
use crate::models::phase::Phase;
use crate::models::qtype::QuestionType;
use crate::models::question::{Question, RawQuestion, TfLabels};
use crate::models::request::GenerationRequest;

/// 规范化缺省值（字段缺失时从请求配置或原题目回填）
#[derive(Debug, Clone, Default)]
pub struct QuestionDefaults {
    pub subject: String,
    pub phase: Phase,
    pub material: String,
    pub quiz_token: String,
}

impl QuestionDefaults {
    /// 从出题请求提取缺省值
    pub fn from_request(request: &GenerationRequest) -> Self {
        Self {
            subject: request.subject.clone(),
            phase: request.phase,
            material: request.material.clone(),
            quiz_token: request.quiz_token.clone(),
        }
    }

    /// 从已有题目提取缺省值（单题重新生成时使用）
    pub fn from_question(question: &Question) -> Self {
        Self {
            subject: question.subject.clone(),
            phase: question.phase,
            material: question.material.clone(),
            quiz_token: question.quiz_token.clone(),
        }
    }
}

/// 规范化一批原始题目，顺位从 1 开始作为缺省编号
pub fn normalize_all(raws: Vec<RawQuestion>, defaults: &QuestionDefaults) -> Vec<Question> {
    raws.into_iter()
        .enumerate()
        .map(|(i, raw)| normalize(raw, defaults, i as u32 + 1))
        .collect()
}

/// 规范化单个原始题目
///
/// `fallback_order` 在输入没有编号时充当缺省编号
pub fn normalize(raw: RawQuestion, defaults: &QuestionDefaults, fallback_order: u32) -> Question {
    let qtype = raw
        .qtype
        .as_deref()
        .and_then(QuestionType::find)
        .unwrap_or(QuestionType::PilihanGanda);

    let options: Vec<String> = raw
        .options
        .unwrap_or_default()
        .into_iter()
        .map(value_to_plain_string)
        .collect();

    let correct_answer = coerce_answer(qtype, raw.correct_answer, options.len());
    let tf_labels = resolve_tf_labels(qtype, raw.tf_labels);
    let option_images = align_option_images(raw.option_images, options.len());

    Question {
        id: raw
            .id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(Question::new_id),
        qtype,
        level: raw
            .level
            .as_deref()
            .and_then(Level::find)
            .unwrap_or(Level::L1),
        subject: raw
            .subject
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| defaults.subject.clone()),
        phase: raw
            .phase
            .as_deref()
            .and_then(Phase::find)
            .unwrap_or(defaults.phase),
        material: raw
            .material
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| defaults.material.clone()),
        text: strip_markup(&raw.text.unwrap_or_default()),
        stimulus_text: raw
            .stimulus_text
            .map(|s| strip_markup(&s))
            .filter(|s| !s.is_empty()),
        explanation: strip_markup(&raw.explanation.unwrap_or_default()),
        options,
        option_images,
        correct_answer,
        tf_labels,
        image: raw.image.filter(|s| !s.trim().is_empty()),
        quiz_token: raw
            .quiz_token
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| defaults.quiz_token.clone())
            .to_uppercase(),
        order: raw.order.filter(|o| *o > 0).unwrap_or(fallback_order),
        is_deleted: raw.is_deleted.unwrap_or(false),
        created_at: raw
            .created_at
            .filter(|t| *t > 0)
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
    }
}

/// 把答案键 JSON 值强制对齐到题型要求的形态
pub fn coerce_answer(
    qtype: QuestionType,
    value: Option<JsonValue>,
    option_count: usize,
) -> AnswerKey {
    let value = value.map(unwrap_json_string);
    match qtype {
        QuestionType::PilihanGanda => {
            AnswerKey::Index(coerce_single_index(value.as_ref(), option_count))
        }
        QuestionType::Mcma => AnswerKey::Indices(coerce_index_list(value.as_ref(), option_count)),
        // 复合多选的字符串答案是字母表（"A, C"），表格题的才是 B/S 记号
        QuestionType::Kompleks => match value.as_ref() {
            Some(JsonValue::String(_)) => {
                let mut flags = vec![false; option_count];
                for i in coerce_index_list(value.as_ref(), option_count) {
                    if i < flags.len() {
                        flags[i] = true;
                    }
                }
                AnswerKey::Flags(flags)
            }
            _ => AnswerKey::Flags(coerce_flags(value.as_ref(), option_count)),
        },
        QuestionType::BenarSalah | QuestionType::SesuaiTidakSesuai => {
            AnswerKey::Flags(coerce_flags(value.as_ref(), option_count))
        }
        QuestionType::Isian | QuestionType::Uraian => AnswerKey::Text(coerce_text(value)),
    }
}

// 答案键可能以 JSON 编码的字符串到达（如 "\"[0,2]\""），先解开一层
fn unwrap_json_string(value: JsonValue) -> JsonValue {
    if let JsonValue::String(s) = &value {
        let trimmed = s.trim();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            if let Ok(parsed) = serde_json::from_str::<JsonValue>(trimmed) {
                return parsed;
            }
        }
    }
    value
}

/// 单选：任何输入收敛为单个下标，无法解释的输入回退到 0
fn coerce_single_index(value: Option<&JsonValue>, option_count: usize) -> usize {
    let index = match value {
        Some(JsonValue::Number(n)) => n.as_u64().map(|v| v as usize).unwrap_or(0),
        Some(JsonValue::String(s)) => parse_index_token(s).unwrap_or(0),
        Some(JsonValue::Array(items)) => {
            // 布尔数组取第一个为真的位置，其余数组取第一个元素
            if items.iter().all(|v| v.is_boolean()) {
                items
                    .iter()
                    .position(|v| v.as_bool() == Some(true))
                    .unwrap_or(0)
            } else {
                coerce_single_index(items.first(), option_count)
            }
        }
        _ => 0,
    };

    if option_count > 0 && index >= option_count {
        0
    } else {
        index
    }
}

/// 多选：收敛为升序去重的下标数组，标量被包装成单元素数组
fn coerce_index_list(value: Option<&JsonValue>, option_count: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = match value {
        Some(JsonValue::Number(n)) => n.as_u64().map(|v| vec![v as usize]).unwrap_or_default(),
        Some(JsonValue::String(s)) => split_tokens(s)
            .iter()
            .filter_map(|token| parse_index_token(token))
            .collect(),
        Some(JsonValue::Array(items)) => {
            if items.iter().all(|v| v.is_boolean()) {
                items
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.as_bool() == Some(true))
                    .map(|(i, _)| i)
                    .collect()
            } else {
                items
                    .iter()
                    .filter_map(|item| match item {
                        JsonValue::Number(n) => n.as_u64().map(|v| v as usize),
                        JsonValue::String(s) => parse_index_token(s),
                        _ => None,
                    })
                    .collect()
            }
        }
        _ => Vec::new(),
    };

    if option_count > 0 {
        indices.retain(|i| *i < option_count);
    }
    indices.sort_unstable();
    indices.dedup();
    indices
}

/// 布尔形态：收敛为与选项数量等长的布尔数组
///
/// 记号不足时补 false，关联不明确的槽位一律 false
fn coerce_flags(value: Option<&JsonValue>, option_count: usize) -> Vec<bool> {
    let mut flags = match value {
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(|item| match item {
                JsonValue::Bool(b) => *b,
                JsonValue::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
                JsonValue::String(s) => parse_bool_token(s).unwrap_or(false),
                _ => false,
            })
            .collect(),
        Some(JsonValue::String(s)) => split_tokens(s)
            .iter()
            .map(|token| parse_bool_token(token).unwrap_or(false))
            .collect(),
        // 单个下标视为"该陈述为真"
        Some(JsonValue::Number(n)) => {
            let mut base = vec![false; option_count];
            if let Some(i) = n.as_u64().map(|v| v as usize) {
                if i < base.len() {
                    base[i] = true;
                }
            }
            base
        }
        _ => Vec::new(),
    };

    flags.resize(option_count, false);
    flags
}

/// 简答/论述：字符串原样保留，其他标量转为文本
fn coerce_text(value: Option<JsonValue>) -> String {
    match value {
        Some(JsonValue::String(s)) => s,
        Some(JsonValue::Number(n)) => n.to_string(),
        Some(JsonValue::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

// 下标记号："2" 或 "C" 均可
fn parse_index_token(token: &str) -> Option<usize> {
    let trimmed = token.trim();
    if let Ok(index) = trimmed.parse::<usize>() {
        return Some(index);
    }

    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => letter_to_index(c),
        _ => None,
    }
}

// 表格题补全缺省标签对；非表格题保留已提供的标签
fn resolve_tf_labels(qtype: QuestionType, raw: Option<JsonValue>) -> Option<TfLabels> {
    let supplied = raw.and_then(|value| {
        let truthy = value.get("true")?.as_str()?.trim().to_string();
        let falsy = value.get("false")?.as_str()?.trim().to_string();
        if truthy.is_empty() || falsy.is_empty() {
            None
        } else {
            Some(TfLabels::new(truthy, falsy))
        }
    });

    if qtype.is_table() {
        supplied.or_else(|| qtype.default_tf_labels())
    } else {
        supplied
    }
}

// 选项图片与选项逐位对齐：多余截断，不足补空
fn align_option_images(
    images: Option<Vec<Option<String>>>,
    option_count: usize,
) -> Option<Vec<Option<String>>> {
    images.map(|mut imgs| {
        imgs.resize(option_count, None);
        imgs
    })
}

fn value_to_plain_string(value: JsonValue) -> String {
    match value {
        JsonValue::String(s) => s,
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// 清理自由文本里的标记语法
///
/// 去掉标签、粗体/斜体记号、代码围栏和标题记号，
/// 数学定界符 `$...$` / `$$...$$` 原样保留
pub fn strip_markup(text: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    static HEADING_RE: OnceLock<Regex> = OnceLock::new();

    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>?").expect("tag regex"));
    let heading_re =
        HEADING_RE.get_or_init(|| Regex::new(r"(?m)^\s*#{1,6}\s+").expect("heading regex"));

    let without_tags = tag_re.replace_all(text, "");
    let without_headings = heading_re.replace_all(&without_tags, "");

    without_headings
        .replace("**", "")
        .replace('*', "")
        .replace("__", "")
        .replace('`', "")
        .trim()
        .to_string()
}
