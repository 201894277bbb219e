use crate::models::question::Question;

/// 题目集合
///
/// 整个应用唯一的可变题目列表。只暴露整表替换式的操作
/// （追加、按 ID 映射、整表变换），不做局部可变借用，
/// 保证任何失败的操作不会留下半改状态。
#[derive(Debug, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// 按 order 排序后的完整列表（含回收站）
    pub fn sorted(&self) -> Vec<Question> {
        let mut all = self.questions.clone();
        all.sort_by_key(|q| q.order);
        all
    }

    /// 活跃题目（未删除），按 order 排序
    pub fn active(&self) -> Vec<Question> {
        let mut active: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| !q.is_deleted)
            .cloned()
            .collect();
        active.sort_by_key(|q| q.order);
        active
    }

    /// 回收站中的题目
    pub fn trashed(&self) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| q.is_deleted)
            .cloned()
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// 追加新生成的题目，order 接在当前最大值之后
    pub fn append_generated(&mut self, generated: Vec<Question>) {
        let last_order = self.questions.iter().map(|q| q.order).max().unwrap_or(0);
        let numbered = generated.into_iter().enumerate().map(|(i, mut q)| {
            q.order = last_order + i as u32 + 1;
            q
        });
        self.questions.extend(numbered);
    }

    /// 合并导入的题目（多个文件按拼接合并）
    ///
    /// 缺失的 order 按导入位置顺延，已有题目不受影响
    pub fn merge_imported(&mut self, imported: Vec<Question>) {
        let existing = self.questions.len() as u32;
        let merged = imported.into_iter().enumerate().map(|(i, mut q)| {
            if q.order == 0 {
                q.order = existing + i as u32 + 1;
            }
            q
        });
        self.questions.extend(merged);
    }

    /// 用编辑后的题目替换同 ID 的旧题目
    pub fn replace(&mut self, updated: Question) -> bool {
        let id = updated.id.clone();
        self.map_by_id(&id, |_| updated)
    }

    /// 软删除 / 恢复
    pub fn set_trashed(&mut self, id: &str, is_deleted: bool) -> bool {
        self.map_by_id(id, |mut q| {
            q.is_deleted = is_deleted;
            q
        })
    }

    /// 硬删除（彻底移出列表）
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.questions.len();
        self.questions.retain(|q| q.id != id);
        self.questions.len() != before
    }

    /// 快速更新编号
    pub fn set_order(&mut self, id: &str, order: u32) -> bool {
        self.map_by_id(id, |mut q| {
            q.order = order;
            q
        })
    }

    /// 快速更新试卷包令牌
    pub fn set_quiz_token(&mut self, id: &str, token: &str) -> bool {
        let token = token.to_string();
        self.map_by_id(id, |mut q| {
            q.quiz_token = token;
            q
        })
    }

    /// 整表变换：用 f 的结果整体替换当前列表
    ///
    /// 打乱、重排等批量操作都通过这里完成
    pub fn apply<F>(&mut self, f: F)
    where
        F: FnOnce(Vec<Question>) -> Vec<Question>,
    {
        let current = std::mem::take(&mut self.questions);
        self.questions = f(current);
    }

    fn map_by_id<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(Question) -> Question,
    {
        let Some(position) = self.questions.iter().position(|q| q.id == id) else {
            return false;
        };

        let current = std::mem::take(&mut self.questions);
        let mut f = Some(f);
        self.questions = current
            .into_iter()
            .enumerate()
            .map(|(i, q)| {
                if i == position {
                    (f.take().expect("map_by_id closure invoked once"))(q)
                } else {
                    q
                }
            })
            .collect();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::AnswerKey;
    use crate::models::level::Level;
    use crate::models::phase::Phase;
    use crate::models::qtype::QuestionType;

    fn sample(id: &str, order: u32) -> Question {
        Question {
            id: id.to_string(),
            qtype: QuestionType::PilihanGanda,
            level: Level::L1,
            subject: "IPA".to_string(),
            phase: Phase::D,
            material: String::new(),
            text: format!("soal {}", id),
            stimulus_text: None,
            explanation: String::new(),
            options: vec!["a".to_string(), "b".to_string()],
            option_images: None,
            correct_answer: AnswerKey::Index(0),
            tf_labels: None,
            image: None,
            quiz_token: "T1".to_string(),
            order,
            is_deleted: false,
            created_at: 0,
        }
    }

    #[test]
    fn test_append_generated_continues_order() {
        let mut bank = QuestionBank::from_questions(vec![sample("a", 3)]);
        bank.append_generated(vec![sample("b", 0), sample("c", 0)]);

        let orders: Vec<u32> = bank.questions().iter().map(|q| q.order).collect();
        assert_eq!(orders, vec![3, 4, 5]);
    }

    #[test]
    fn test_merge_imported_fills_missing_order() {
        let mut bank = QuestionBank::from_questions(vec![sample("a", 1)]);
        bank.merge_imported(vec![sample("b", 9), sample("c", 0)]);

        assert_eq!(bank.find("b").unwrap().order, 9);
        assert_eq!(bank.find("c").unwrap().order, 3);
    }

    #[test]
    fn test_trash_partition() {
        let mut bank =
            QuestionBank::from_questions(vec![sample("a", 1), sample("b", 2), sample("c", 3)]);
        assert!(bank.set_trashed("b", true));

        assert_eq!(bank.active().len(), 2);
        assert_eq!(bank.trashed().len(), 1);
        assert_eq!(bank.trashed()[0].id, "b");

        assert!(bank.set_trashed("b", false));
        assert_eq!(bank.trashed().len(), 0);

        assert!(!bank.set_trashed("tidak-ada", true));
    }

    #[test]
    fn test_replace_and_remove() {
        let mut bank = QuestionBank::from_questions(vec![sample("a", 1), sample("b", 2)]);

        let mut edited = sample("a", 1);
        edited.text = "direvisi".to_string();
        assert!(bank.replace(edited));
        assert_eq!(bank.find("a").unwrap().text, "direvisi");

        assert!(bank.remove("b"));
        assert!(!bank.remove("b"));
        assert_eq!(bank.len(), 1);
    }

    #[test]
    fn test_quick_updates() {
        let mut bank = QuestionBank::from_questions(vec![sample("a", 1)]);
        assert!(bank.set_order("a", 10));
        assert!(bank.set_quiz_token("a", "T9"));

        let q = bank.find("a").unwrap();
        assert_eq!(q.order, 10);
        assert_eq!(q.quiz_token, "T9");
    }
}
