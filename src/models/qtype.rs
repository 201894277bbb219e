use crate::models::question::TfLabels;

/// 题型枚举
///
/// 覆盖 EduCBT 全部七种题型（不同批次的命名会合并到同一变体）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionType {
    /// 单选题
    PilihanGanda,
    /// 多选题（按索引记录答案）
    Mcma,
    /// 复合多选题（按布尔数组记录答案）
    Kompleks,
    /// 判断题（Benar/Salah 表格）
    BenarSalah,
    /// 符合/不符合 表格题
    SesuaiTidakSesuai,
    /// 简答题
    Isian,
    /// 论述题
    Uraian,
}

impl QuestionType {
    /// 获取标准显示名称（印尼语标签，与导入/导出格式一致）
    pub fn label(self) -> &'static str {
        match self {
            QuestionType::PilihanGanda => "Pilihan Ganda",
            QuestionType::Mcma => "Pilihan Jamak (MCMA)",
            QuestionType::Kompleks => "Pilihan Ganda Kompleks",
            QuestionType::BenarSalah => "(Benar/Salah)",
            QuestionType::SesuaiTidakSesuai => "(Sesuai/Tidak Sesuai)",
            QuestionType::Isian => "ISIAN",
            QuestionType::Uraian => "URAIAN",
        }
    }

    /// 从标准名称解析题型（精确匹配）
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "Pilihan Ganda" | "PG" => Some(QuestionType::PilihanGanda),
            "Pilihan Jamak (MCMA)" | "MCMA" => Some(QuestionType::Mcma),
            "Pilihan Ganda Kompleks" => Some(QuestionType::Kompleks),
            "(Benar/Salah)" | "Benar/Salah" => Some(QuestionType::BenarSalah),
            "(Sesuai/Tidak Sesuai)" | "Sesuai/Tidak Sesuai" => {
                Some(QuestionType::SesuaiTidakSesuai)
            }
            "ISIAN" | "Isian" => Some(QuestionType::Isian),
            "URAIAN" | "Uraian" => Some(QuestionType::Uraian),
            _ => None,
        }
    }

    /// 智能查找题型（支持模糊匹配）
    ///
    /// 外部输入（LLM 响应、表格行）的题型名称写法不统一，
    /// 先精确匹配，再按关键词模糊匹配
    pub fn find(s: &str) -> Option<Self> {
        // 先尝试精确匹配
        if let Some(qtype) = Self::from_label(s.trim()) {
            return Some(qtype);
        }

        // 模糊匹配
        let s_lower = s.to_lowercase();
        if s_lower.contains("sesuai") {
            return Some(QuestionType::SesuaiTidakSesuai);
        }
        if s_lower.contains("benar") || s_lower.contains("salah") || s_lower.contains("b/s") {
            return Some(QuestionType::BenarSalah);
        }
        if s_lower.contains("jamak") || s_lower.contains("mcma") {
            return Some(QuestionType::Mcma);
        }
        if s_lower.contains("kompleks") || s_lower.contains("complex") {
            return Some(QuestionType::Kompleks);
        }
        if s_lower.contains("isian") || s_lower.contains("singkat") {
            return Some(QuestionType::Isian);
        }
        if s_lower.contains("uraian") || s_lower.contains("esai") || s_lower.contains("essay") {
            return Some(QuestionType::Uraian);
        }
        if s_lower.contains("pilihan") || s_lower.contains("ganda") || s_lower == "pg" {
            return Some(QuestionType::PilihanGanda);
        }

        None
    }

    /// 是否为表格题（需要 tfLabels 标签对）
    pub fn is_table(self) -> bool {
        matches!(
            self,
            QuestionType::BenarSalah | QuestionType::SesuaiTidakSesuai
        )
    }

    /// 答案是否为布尔数组形态（与选项逐位对齐）
    pub fn is_boolean_shaped(self) -> bool {
        matches!(
            self,
            QuestionType::Kompleks | QuestionType::BenarSalah | QuestionType::SesuaiTidakSesuai
        )
    }

    /// 是否带选项列表（简答/论述没有选项）
    pub fn has_options(self) -> bool {
        !matches!(self, QuestionType::Isian | QuestionType::Uraian)
    }

    /// 表格题的默认标签对
    pub fn default_tf_labels(self) -> Option<TfLabels> {
        match self {
            QuestionType::BenarSalah => Some(TfLabels::new("Benar", "Salah")),
            QuestionType::SesuaiTidakSesuai => Some(TfLabels::new("Sesuai", "Tidak Sesuai")),
            _ => None,
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// 序列化为标准显示名称，保证 JSON 导入/导出与外部格式完全一致
impl serde::Serialize for QuestionType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

// 反序列化采用模糊匹配，无法识别时回退到单选题（外部数据永不报错）
impl<'de> serde::Deserialize<'de> for QuestionType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::Deserialize;
        let s = String::deserialize(deserializer)?;
        Ok(QuestionType::find(&s).unwrap_or(QuestionType::PilihanGanda))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_exact_labels() {
        assert_eq!(
            QuestionType::find("Pilihan Ganda"),
            Some(QuestionType::PilihanGanda)
        );
        assert_eq!(
            QuestionType::find("(Benar/Salah)"),
            Some(QuestionType::BenarSalah)
        );
        assert_eq!(QuestionType::find("URAIAN"), Some(QuestionType::Uraian));
    }

    #[test]
    fn test_find_fuzzy_variants() {
        assert_eq!(
            QuestionType::find("Pilihan Jamak"),
            Some(QuestionType::Mcma)
        );
        assert_eq!(
            QuestionType::find("Soal Benar Salah"),
            Some(QuestionType::BenarSalah)
        );
        assert_eq!(
            QuestionType::find("sesuai/tidak sesuai"),
            Some(QuestionType::SesuaiTidakSesuai)
        );
        assert_eq!(
            QuestionType::find("pilihan ganda kompleks"),
            Some(QuestionType::Kompleks)
        );
        assert_eq!(
            QuestionType::find("isian singkat"),
            Some(QuestionType::Isian)
        );
        assert_eq!(QuestionType::find("tipe aneh"), None);
    }

    #[test]
    fn test_table_defaults() {
        let labels = QuestionType::BenarSalah.default_tf_labels().unwrap();
        assert_eq!(labels.truthy, "Benar");
        assert_eq!(labels.falsy, "Salah");
        assert!(QuestionType::Kompleks.default_tf_labels().is_none());
    }

    #[test]
    fn test_shape_predicates() {
        assert!(QuestionType::BenarSalah.is_table());
        assert!(!QuestionType::Kompleks.is_table());
        assert!(QuestionType::Kompleks.is_boolean_shaped());
        assert!(!QuestionType::Isian.has_options());
        assert!(QuestionType::Mcma.has_options());
    }
}
