//! 打乱与重排服务 - 业务能力层
//!
//! 核心职责：
//! - 打乱单个题目的选项，答案键随置换同步重推
//! - 打乱题目顺序 / 按令牌自动重排，两者对"活跃 vs 回收站"的
//!   划分方式完全一致：回收站里的题目永不参与、编号不变
//!
//! 不变量：打乱选项后每条陈述的正确性标记跟着陈述走，
//! 语义上的正确答案不会因打乱而改变

use rand::Rng;

use crate::models::answer::AnswerKey;
use crate::models::question::Question;

/// Fisher-Yates 洗牌
pub fn shuffle_in_place<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// 打乱单个题目的选项
///
/// 简答/论述没有选项，单选项题没有打乱意义，均原样返回
pub fn shuffle_question_options<R: Rng>(question: Question, rng: &mut R) -> Question {
    if !question.qtype.has_options() || question.options.len() <= 1 {
        return question;
    }

    let mut permutation: Vec<usize> = (0..question.options.len()).collect();
    shuffle_in_place(&mut permutation, rng);
    apply_option_permutation(question, &permutation)
}

/// 按给定置换重排选项并重推答案键（打乱的确定性内核）
///
/// `permutation[i]` 表示新位置 i 上放原位置 permutation[i] 的选项
pub fn apply_option_permutation(question: Question, permutation: &[usize]) -> Question {
    let new_options: Vec<String> = permutation
        .iter()
        .map(|&i| question.options.get(i).cloned().unwrap_or_default())
        .collect();

    // 选项图片跟随同一个置换
    let new_option_images = question.option_images.as_ref().map(|images| {
        permutation
            .iter()
            .map(|&i| images.get(i).cloned().flatten())
            .collect()
    });

    let new_answer = match &question.correct_answer {
        // 单选：新下标 = 旧下标在置换中的位置
        AnswerKey::Index(old) => AnswerKey::Index(
            permutation
                .iter()
                .position(|&i| i == *old)
                .unwrap_or(0),
        ),
        // 多选：逐个映射后按升序恢复规范顺序
        AnswerKey::Indices(olds) => {
            let mut mapped: Vec<usize> = olds
                .iter()
                .filter_map(|old| permutation.iter().position(|&i| i == *old))
                .collect();
            mapped.sort_unstable();
            AnswerKey::Indices(mapped)
        }
        // 布尔数组：布尔值跟着陈述走
        AnswerKey::Flags(flags) => AnswerKey::Flags(
            permutation
                .iter()
                .map(|&i| flags.get(i).copied().unwrap_or(false))
                .collect(),
        ),
        AnswerKey::Text(s) => AnswerKey::Text(s.clone()),
    };

    Question {
        options: new_options,
        option_images: new_option_images,
        correct_answer: new_answer,
        ..question
    }
}

/// 打乱所有题目的选项
pub fn shuffle_all_options<R: Rng>(questions: Vec<Question>, rng: &mut R) -> Vec<Question> {
    questions
        .into_iter()
        .map(|q| shuffle_question_options(q, rng))
        .collect()
}

/// 打乱题目顺序并把活跃题目重新编号为 1..n
///
/// 回收站里的题目不参与打乱、不重新编号，原样附加在活跃题目之后
pub fn shuffle_questions<R: Rng>(questions: Vec<Question>, rng: &mut R) -> Vec<Question> {
    let (mut active, trashed): (Vec<Question>, Vec<Question>) =
        questions.into_iter().partition(|q| !q.is_deleted);

    shuffle_in_place(&mut active, rng);
    for (i, q) in active.iter_mut().enumerate() {
        q.order = i as u32 + 1;
    }

    active.extend(trashed);
    active
}

/// 自动重排：按（令牌, 原编号）排序活跃题目并重新编号为 1..n
///
/// 打乱的逆操作，用来恢复规范顺序；对回收站的处理与打乱完全一致
pub fn reorder_sequentially(questions: Vec<Question>) -> Vec<Question> {
    let (mut active, trashed): (Vec<Question>, Vec<Question>) =
        questions.into_iter().partition(|q| !q.is_deleted);

    active.sort_by(|a, b| {
        a.quiz_token
            .cmp(&b.quiz_token)
            .then(a.order.cmp(&b.order))
    });
    for (i, q) in active.iter_mut().enumerate() {
        q.order = i as u32 + 1;
    }

    active.extend(trashed);
    active
}
