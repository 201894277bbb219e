/// 认知层级枚举（L1 理解 / L2 应用 / L3 推理）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    L1,
    L2,
    L3,
}

impl Level {
    /// 获取标准名称
    pub fn as_str(self) -> &'static str {
        match self {
            Level::L1 => "L1",
            Level::L2 => "L2",
            Level::L3 => "L3",
        }
    }

    /// 从字符串解析层级（精确匹配）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "L1" | "l1" => Some(Level::L1),
            "L2" | "l2" => Some(Level::L2),
            "L3" | "l3" => Some(Level::L3),
            _ => None,
        }
    }

    /// 智能查找层级（支持模糊匹配）
    ///
    /// LLM 返回的层级描述可能带额外文字（如 "Level 2 - Aplikasi"），
    /// 按出现的数字归类
    pub fn find(s: &str) -> Option<Self> {
        if let Some(level) = Self::from_str(s) {
            return Some(level);
        }

        if s.contains('3') {
            return Some(Level::L3);
        }
        if s.contains('2') {
            return Some(Level::L2);
        }
        if s.contains('1') {
            return Some(Level::L1);
        }

        None
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl serde::Serialize for Level {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

// 无法识别的层级回退到 L1
impl<'de> serde::Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::Deserialize;
        let s = String::deserialize(deserializer)?;
        Ok(Level::find(&s).unwrap_or(Level::L1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_level() {
        assert_eq!(Level::find("L2"), Some(Level::L2));
        assert_eq!(Level::find("Level 3 - Penalaran"), Some(Level::L3));
        assert_eq!(Level::find("tinggi"), None);
    }
}
