use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::models::question::TfLabels;

/// 答案键
///
/// 外部 JSON 中 `correctAnswer` 字段是多态的：
/// 数字 | 数字数组 | 布尔数组 | 字符串。
/// 内部用带标签的联合类型表示，形态必须与题型严格对应：
/// - 单选题 → `Index`
/// - 多选题 → `Indices`
/// - 布尔形态题（复合多选/表格题）→ `Flags`（与选项逐位对齐）
/// - 简答/论述 → `Text`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerKey {
    Index(usize),
    Indices(Vec<usize>),
    Flags(Vec<bool>),
    Text(String),
}

/// 布尔答案记号表（大写规范形式 → 布尔值）
///
/// 覆盖表格题答案列里出现过的全部写法
static BOOL_TOKENS: phf::Map<&'static str, bool> = phf_map! {
    "B" => true,
    "S" => false,
    "BENAR" => true,
    "SALAH" => false,
    "SESUAI" => true,
    "TIDAK SESUAI" => false,
    "TRUE" => true,
    "FALSE" => false,
    "1" => true,
    "0" => false,
};

/// 索引转选项字母（0 → A，1 → B ...）
pub fn index_to_letter(index: usize) -> char {
    if index < 26 {
        (b'A' + index as u8) as char
    } else {
        '?'
    }
}

/// 选项字母转索引（大小写均可）
pub fn letter_to_index(letter: char) -> Option<usize> {
    let upper = letter.to_ascii_uppercase();
    if upper.is_ascii_uppercase() {
        Some((upper as u8 - b'A') as usize)
    } else {
        None
    }
}

/// 解析单个布尔答案记号
pub fn parse_bool_token(token: &str) -> Option<bool> {
    let normalized = token.trim().to_uppercase();
    BOOL_TOKENS.get(normalized.as_str()).copied()
}

/// 按答案列分隔符（`,` `;` `|`）拆分记号
pub fn split_tokens(raw: &str) -> Vec<&str> {
    raw.split(&[',', ';', '|'][..])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

impl AnswerKey {
    /// 编码为答案列字符串（表格/文档导出共用，导入契约的逆运算）
    ///
    /// - `Index` → 单个字母
    /// - `Indices` → 逗号分隔的字母
    /// - `Flags` 有标签对时 → 标签首字母序列（如 "B, S, B"）
    /// - `Flags` 无标签对时（复合多选）→ 为真位置的字母
    /// - `Text` → 原文
    pub fn to_export_string(&self, tf_labels: Option<&TfLabels>) -> String {
        match self {
            AnswerKey::Index(i) => index_to_letter(*i).to_string(),
            AnswerKey::Indices(indices) => indices
                .iter()
                .map(|i| index_to_letter(*i).to_string())
                .collect::<Vec<_>>()
                .join(", "),
            AnswerKey::Flags(flags) => match tf_labels {
                Some(labels) => flags
                    .iter()
                    .map(|&v| {
                        let label = if v { &labels.truthy } else { &labels.falsy };
                        label
                            .chars()
                            .next()
                            .unwrap_or(if v { 'B' } else { 'S' })
                            .to_string()
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
                None => flags
                    .iter()
                    .enumerate()
                    .filter(|(_, &v)| v)
                    .map(|(i, _)| index_to_letter(i).to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            },
            AnswerKey::Text(s) => s.clone(),
        }
    }

    /// 编码为表格答案列字符串（Excel 导入契约的逆运算）
    ///
    /// 与 [`to_export_string`](Self::to_export_string) 的唯一区别：
    /// 表格题写完整标签词（"Benar, Salah"），因为 "Sesuai/Tidak Sesuai"
    /// 的首字母会与 B/S 记号冲突，无法解码回来
    pub fn to_answer_column(&self, tf_labels: Option<&TfLabels>) -> String {
        match (self, tf_labels) {
            (AnswerKey::Flags(flags), Some(labels)) => flags
                .iter()
                .map(|&v| if v { labels.truthy.clone() } else { labels.falsy.clone() })
                .collect::<Vec<_>>()
                .join(", "),
            _ => self.to_export_string(tf_labels),
        }
    }
}
