use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;

use educbt_studio::config::Config;
use educbt_studio::models::answer::AnswerKey;
use educbt_studio::models::bank::QuestionBank;
use educbt_studio::models::loaders::{load_raw_questions, save_questions};
use educbt_studio::models::phase::Phase;
use educbt_studio::models::qtype::QuestionType;
use educbt_studio::models::question::RawQuestion;
use educbt_studio::models::request::GenerationRequest;
use educbt_studio::services::normalizer::{normalize_all, QuestionDefaults};
use educbt_studio::services::shuffler;
use educbt_studio::services::spreadsheet::{export_questions_xlsx, import_questions_xlsx};
use educbt_studio::utils::logging;
use educbt_studio::workflow::{GenerationFlow, RequestCtx};

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("educbt_integration").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn defaults() -> QuestionDefaults {
    QuestionDefaults {
        subject: "IPA".to_string(),
        phase: Phase::D,
        material: "Ekosistem".to_string(),
        quiz_token: "T1".to_string(),
    }
}

/// 模拟一次 LLM 响应载荷（字段形态故意松散）
fn llm_style_payload() -> &'static str {
    r#"[
        {"type": "Pilihan Ganda", "level": "L1", "text": "Soal PG 1", "options": ["a","b","c","d"], "correctAnswer": "B", "explanation": "**Karena** b."},
        {"type": "Pilihan Ganda", "level": "L2", "text": "Soal PG 2", "options": ["a","b","c","d"], "correctAnswer": 3},
        {"type": "Pilihan Ganda", "level": "L2", "text": "Soal PG 3", "options": ["a","b","c","d"], "correctAnswer": "2"},
        {"type": "Pilihan Ganda", "level": "L1", "text": "Soal PG 4", "options": ["a","b","c","d"], "correctAnswer": 0},
        {"type": "Pilihan Ganda", "level": "L3", "text": "Soal PG 5 dengan $x^2$", "options": ["a","b","c","d"], "correctAnswer": 1},
        {"type": "(Benar/Salah)", "level": "L2", "text": "Soal BS", "options": ["p1","p2","p3"], "correctAnswer": ["B", "S"]},
        {"type": "(Sesuai/Tidak Sesuai)", "level": "L3", "text": "Soal STS", "options": ["q1","q2"], "correctAnswer": [true, false], "order": "7"}
    ]"#
}

#[test]
fn test_generation_payload_to_sorted_bank() {
    // 场景：5 道单选 + 2 道表格题，令牌 T1，走自动重排
    let raws: Vec<RawQuestion> = serde_json::from_str(llm_style_payload()).unwrap();
    let questions = normalize_all(raws, &defaults());
    assert_eq!(questions.len(), 7);

    let mut bank = QuestionBank::new();
    bank.append_generated(questions);

    bank.apply(shuffler::reorder_sequentially);

    let active = bank.active();
    assert_eq!(active.len(), 7);
    let orders: Vec<u32> = active.iter().map(|q| q.order).collect();
    assert_eq!(orders, vec![1, 2, 3, 4, 5, 6, 7]);
    assert!(active.iter().all(|q| q.quiz_token == "T1"));
    assert!(bank.trashed().is_empty());

    // 表格题标签对已补全，答案形态与题型对应
    let bs = active
        .iter()
        .find(|q| q.qtype == QuestionType::BenarSalah)
        .unwrap();
    assert_eq!(
        bs.correct_answer,
        AnswerKey::Flags(vec![true, false, false])
    );
    assert!(bs.tf_labels.is_some());

    // 自由文本里的标记被清理，数学定界符保留
    let pg5 = active.iter().find(|q| q.text.contains("$x^2$")).unwrap();
    assert_eq!(pg5.text, "Soal PG 5 dengan $x^2$");
    let pg1 = active.iter().find(|q| q.text == "Soal PG 1").unwrap();
    assert_eq!(pg1.explanation, "Karena b.");
}

#[test]
fn test_shuffle_and_reorder_never_touch_trash() {
    let raws: Vec<RawQuestion> = serde_json::from_str(llm_style_payload()).unwrap();
    let mut bank = QuestionBank::new();
    bank.append_generated(normalize_all(raws, &defaults()));

    let trashed_id = bank.active()[2].id.clone();
    let trashed_order = bank.active()[2].order;
    bank.set_trashed(&trashed_id, true);

    let mut rng = StdRng::seed_from_u64(11);
    bank.apply(|qs| shuffler::shuffle_questions(qs, &mut rng));
    bank.apply(shuffler::reorder_sequentially);

    // 回收站题目的编号和成员资格都没变
    let trashed = bank.trashed();
    assert_eq!(trashed.len(), 1);
    assert_eq!(trashed[0].id, trashed_id);
    assert_eq!(trashed[0].order, trashed_order);

    // 活跃题目重新编号为 1..n
    let mut orders: Vec<u32> = bank.active().iter().map(|q| q.order).collect();
    orders.sort_unstable();
    assert_eq!(orders, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_full_pipeline_shuffle_then_xlsx_round_trip() {
    let dir = test_dir("pipeline");
    let path = dir.join("paket.xlsx");

    let raws: Vec<RawQuestion> = serde_json::from_str(llm_style_payload()).unwrap();
    let questions = normalize_all(raws, &defaults());

    // 打乱前记录每道题"哪些选项内容是正确的"
    let semantics_before: Vec<Vec<String>> = questions.iter().map(selected_options).collect();

    let mut rng = StdRng::seed_from_u64(99);
    let shuffled = shuffler::shuffle_all_options(questions, &mut rng);

    export_questions_xlsx(&shuffled, &path).unwrap();
    let imported = import_questions_xlsx(&path, &defaults()).unwrap();
    assert_eq!(imported.len(), shuffled.len());

    // 打乱 + 导出 + 导入之后，每道题的正确选项内容保持不变
    for (before, question) in semantics_before.iter().zip(&imported) {
        assert_eq!(before, &selected_options(question));
    }

    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_json_save_load_round_trip_is_lossless() {
    let dir = test_dir("json_round_trip");
    let path = dir.join("soal.json");

    let raws: Vec<RawQuestion> = serde_json::from_str(llm_style_payload()).unwrap();
    let original = normalize_all(raws, &defaults());

    save_questions(&path, &original).await.unwrap();
    let reloaded_raws = load_raw_questions(&path).await.unwrap();
    let reloaded = normalize_all(reloaded_raws, &defaults());

    // 规范化幂等 + 文件往返无损（含 id、createdAt、编号）
    assert_eq!(original, reloaded);

    tokio::fs::remove_file(&path).await.unwrap();
}

/// 取出一道题里被标为正确的选项内容（与位置无关的语义表示）
fn selected_options(question: &educbt_studio::models::question::Question) -> Vec<String> {
    let mut selected: Vec<String> = match &question.correct_answer {
        AnswerKey::Index(i) => question.options.get(*i).cloned().into_iter().collect(),
        AnswerKey::Indices(indices) => indices
            .iter()
            .filter_map(|&i| question.options.get(i).cloned())
            .collect(),
        AnswerKey::Flags(flags) => question
            .options
            .iter()
            .zip(flags)
            .filter(|(_, &selected)| selected)
            .map(|(option, _)| option.clone())
            .collect(),
        AnswerKey::Text(s) => vec![s.clone()],
    };
    selected.sort();
    selected
}

/// 测试真实出题流程
///
/// 默认忽略，需要手动运行：
/// ```bash
/// LLM_API_KEY=... cargo test test_generation_flow_live -- --ignored --nocapture
/// ```
#[tokio::test]
#[ignore]
async fn test_generation_flow_live() {
    logging::init();

    let config = Config::from_env();
    let flow = GenerationFlow::new(&config);

    let mut request = GenerationRequest::default();
    request.subject = "IPA".to_string();
    request.material = "Fotosintesis".to_string();
    request.quiz_token = "UJI-01".to_string();
    request
        .type_counts
        .insert("Pilihan Ganda".to_string(), 2);
    request
        .type_counts
        .insert("(Benar/Salah)".to_string(), 1);

    let ctx = RequestCtx::new("uji", 1, "UJI-01");
    let bank = flow.run(&request, &ctx).await.expect("出题流程失败");

    assert!(!bank.is_empty());
    for question in bank.sorted() {
        println!("{}. [{}] {}", question.order, question.qtype, question.text);
    }
}

/// 测试单题重生成与数据补全（需要真实 API）
#[tokio::test]
#[ignore]
async fn test_regenerate_and_repair_live() {
    logging::init();

    let config = Config::from_env();
    let flow = GenerationFlow::new(&config);

    let raws: Vec<RawQuestion> = serde_json::from_str(llm_style_payload()).unwrap();
    let mut bank = QuestionBank::new();
    bank.append_generated(normalize_all(raws, &defaults()));

    let target_id = bank.active()[0].id.clone();
    let original_order = bank.active()[0].order;

    flow.regenerate_question(&mut bank, &target_id, Some("Buat lebih sulit."))
        .await
        .expect("重生成失败");

    let regenerated = bank.find(&target_id).expect("题目丢失");
    assert_eq!(regenerated.order, original_order);

    flow.repair_questions(&mut bank).await.expect("补全失败");
    assert!(bank.sorted().iter().all(|q| !q.explanation.is_empty()));
}

/// 测试批量入口（请求目录 → 导出目录）
#[tokio::test]
#[ignore]
async fn test_app_run_live() {
    logging::init();

    let config = Config::from_env();
    educbt_studio::App::initialize(config)
        .run()
        .await
        .expect("批量处理失败");
}
