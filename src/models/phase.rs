/// 学段枚举（Kurikulum Merdeka 的 Fase A–F）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Phase {
    /// 获取标准显示名称
    pub fn label(self) -> &'static str {
        match self {
            Phase::A => "Fase A",
            Phase::B => "Fase B",
            Phase::C => "Fase C",
            Phase::D => "Fase D",
            Phase::E => "Fase E",
            Phase::F => "Fase F",
        }
    }

    /// 从字符串解析学段
    ///
    /// 接受 "Fase D"、"D"、"fase d" 等写法
    pub fn find(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        let letter = trimmed
            .strip_prefix("Fase ")
            .or_else(|| trimmed.strip_prefix("fase "))
            .unwrap_or(trimmed);

        match letter.to_ascii_uppercase().as_str() {
            "A" => Some(Phase::A),
            "B" => Some(Phase::B),
            "C" => Some(Phase::C),
            "D" => Some(Phase::D),
            "E" => Some(Phase::E),
            "F" => Some(Phase::F),
            _ => None,
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::D
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl serde::Serialize for Phase {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

// 无法识别的学段回退到 Fase D（初中段，使用频率最高）
impl<'de> serde::Deserialize<'de> for Phase {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::Deserialize;
        let s = String::deserialize(deserializer)?;
        Ok(Phase::find(&s).unwrap_or(Phase::D))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_phase() {
        assert_eq!(Phase::find("Fase E"), Some(Phase::E));
        assert_eq!(Phase::find("b"), Some(Phase::B));
        assert_eq!(Phase::find("Fase Z"), None);
    }
}
