//! 题型转换服务 - 业务能力层
//!
//! 核心职责：把题目转换为目标题型，题干和选项保持不变，
//! 答案键按目标形态重新推导
//!
//! - 转换规则是确定性的
//! - 多值收敛到单值时取第一个满足条件的值（有意的有损转换策略）
//! - 题目的 `id` 和 `order` 在转换中始终保持不变

use crate::models::answer::AnswerKey;
use crate::models::qtype::QuestionType;
use crate::models::question::Question;

/// 把题目转换为目标题型
pub fn convert_question_type(question: Question, target: QuestionType) -> Question {
    let correct_answer = derive_answer(&question.correct_answer, target, question.options.len());

    // 表格题缺标签对时补默认值，其余题型保留原有标签
    let tf_labels = if target.is_table() {
        question.tf_labels.clone().or_else(|| target.default_tf_labels())
    } else {
        question.tf_labels.clone()
    };

    Question {
        qtype: target,
        correct_answer,
        tf_labels,
        ..question
    }
}

/// 按目标题型重新推导答案键
fn derive_answer(current: &AnswerKey, target: QuestionType, option_count: usize) -> AnswerKey {
    match target {
        QuestionType::PilihanGanda => {
            let index = match current {
                // 布尔数组取第一个为真的位置
                AnswerKey::Flags(flags) => flags.iter().position(|&v| v).unwrap_or(0),
                // 下标数组取第一个元素
                AnswerKey::Indices(indices) => indices.first().copied().unwrap_or(0),
                AnswerKey::Index(i) => *i,
                AnswerKey::Text(s) => s.trim().parse::<usize>().unwrap_or(0),
            };
            let index = if option_count > 0 && index >= option_count {
                0
            } else {
                index
            };
            AnswerKey::Index(index)
        }

        QuestionType::Mcma => {
            let indices = match current {
                AnswerKey::Index(i) => vec![*i],
                AnswerKey::Indices(indices) => indices.clone(),
                AnswerKey::Flags(flags) => flags
                    .iter()
                    .enumerate()
                    .filter(|(_, &v)| v)
                    .map(|(i, _)| i)
                    .collect(),
                AnswerKey::Text(s) => s.trim().parse::<usize>().map(|i| vec![i]).unwrap_or_default(),
            };
            AnswerKey::Indices(indices)
        }

        QuestionType::Kompleks | QuestionType::BenarSalah | QuestionType::SesuaiTidakSesuai => {
            let mut flags = vec![false; option_count];
            match current {
                AnswerKey::Index(i) => {
                    if *i < flags.len() {
                        flags[*i] = true;
                    }
                }
                AnswerKey::Indices(indices) => {
                    for &i in indices {
                        if i < flags.len() {
                            flags[i] = true;
                        }
                    }
                }
                AnswerKey::Flags(current_flags) => {
                    let mut reused = current_flags.clone();
                    reused.resize(option_count, false);
                    flags = reused;
                }
                AnswerKey::Text(_) => {}
            }
            AnswerKey::Flags(flags)
        }

        // 需要手工填写答案，选项原样保留以便转换回来
        QuestionType::Isian | QuestionType::Uraian => AnswerKey::Text(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::level::Level;
    use crate::models::phase::Phase;
    use crate::models::question::TfLabels;

    fn sample(qtype: QuestionType, answer: AnswerKey, option_count: usize) -> Question {
        Question {
            id: "q_tetap".to_string(),
            qtype,
            level: Level::L1,
            subject: "IPA".to_string(),
            phase: Phase::D,
            material: String::new(),
            text: "Soal uji".to_string(),
            stimulus_text: None,
            explanation: String::new(),
            options: (0..option_count).map(|i| format!("opsi {}", i)).collect(),
            option_images: None,
            correct_answer: answer,
            tf_labels: None,
            image: None,
            quiz_token: "T1".to_string(),
            order: 5,
            is_deleted: false,
            created_at: 0,
        }
    }

    #[test]
    fn test_single_to_multi_and_back() {
        let original = sample(QuestionType::PilihanGanda, AnswerKey::Index(2), 4);

        let multi = convert_question_type(original.clone(), QuestionType::Mcma);
        assert_eq!(multi.correct_answer, AnswerKey::Indices(vec![2]));

        // 不新增勾选的情况下转回单选必须还原出同一个下标
        let back = convert_question_type(multi, QuestionType::PilihanGanda);
        assert_eq!(back.correct_answer, AnswerKey::Index(2));
        assert_eq!(back.id, original.id);
        assert_eq!(back.order, original.order);
    }

    #[test]
    fn test_flags_to_single_takes_first_true() {
        let q = sample(
            QuestionType::Kompleks,
            AnswerKey::Flags(vec![false, true, true, false]),
            4,
        );
        let single = convert_question_type(q, QuestionType::PilihanGanda);
        assert_eq!(single.correct_answer, AnswerKey::Index(1));

        // 全 false 时回退到 0
        let q = sample(
            QuestionType::Kompleks,
            AnswerKey::Flags(vec![false, false, false, false]),
            4,
        );
        let single = convert_question_type(q, QuestionType::PilihanGanda);
        assert_eq!(single.correct_answer, AnswerKey::Index(0));
    }

    #[test]
    fn test_flags_to_multi() {
        let q = sample(
            QuestionType::BenarSalah,
            AnswerKey::Flags(vec![true, false, true]),
            3,
        );
        let multi = convert_question_type(q, QuestionType::Mcma);
        assert_eq!(multi.correct_answer, AnswerKey::Indices(vec![0, 2]));
    }

    #[test]
    fn test_single_to_table_sets_one_slot() {
        let q = sample(QuestionType::PilihanGanda, AnswerKey::Index(1), 3);
        let table = convert_question_type(q, QuestionType::BenarSalah);
        assert_eq!(
            table.correct_answer,
            AnswerKey::Flags(vec![false, true, false])
        );
        assert_eq!(table.tf_labels, Some(TfLabels::new("Benar", "Salah")));
    }

    #[test]
    fn test_indices_to_table_sets_each_slot() {
        let q = sample(QuestionType::Mcma, AnswerKey::Indices(vec![0, 2]), 4);
        let table = convert_question_type(q, QuestionType::SesuaiTidakSesuai);
        assert_eq!(
            table.correct_answer,
            AnswerKey::Flags(vec![true, false, true, false])
        );
        assert_eq!(
            table.tf_labels,
            Some(TfLabels::new("Sesuai", "Tidak Sesuai"))
        );
    }

    #[test]
    fn test_flags_resized_when_reused() {
        let q = sample(
            QuestionType::BenarSalah,
            AnswerKey::Flags(vec![true, false]),
            4,
        );
        let table = convert_question_type(q, QuestionType::Kompleks);
        assert_eq!(
            table.correct_answer,
            AnswerKey::Flags(vec![true, false, false, false])
        );
    }

    #[test]
    fn test_to_essay_empties_answer_keeps_options() {
        let q = sample(QuestionType::Mcma, AnswerKey::Indices(vec![1, 3]), 4);
        let essay = convert_question_type(q, QuestionType::Uraian);
        assert_eq!(essay.correct_answer, AnswerKey::Text(String::new()));
        assert_eq!(essay.options.len(), 4);
        assert_eq!(essay.id, "q_tetap");
        assert_eq!(essay.order, 5);
    }

    #[test]
    fn test_existing_tf_labels_survive_table_conversion() {
        let mut q = sample(QuestionType::PilihanGanda, AnswerKey::Index(0), 2);
        q.tf_labels = Some(TfLabels::new("Ya", "Tidak"));
        let table = convert_question_type(q, QuestionType::BenarSalah);
        assert_eq!(table.tf_labels, Some(TfLabels::new("Ya", "Tidak")));
    }
}
