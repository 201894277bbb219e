//! 出题服务 - 业务能力层
//!
//! 只负责"调用 LLM 生成题目"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Gemini 的 OpenAI 兼容端点）
//!
//! ## 重试与降级
//! - 只有限流/配额/过载类错误触发重试，退避时长按 (次数+1)*3 秒递增
//! - 首选模型重试耗尽后降级到备用模型
//! - 其他错误一律立即上抛，题目列表保持不变

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};
use crate::models::level::Level;
use crate::models::question::{Question, RawQuestion};
use crate::models::request::GenerationRequest;
use crate::services::normalizer::{normalize, normalize_all, strip_markup, QuestionDefaults};
use crate::utils::logging::truncate_text;

/// 出题系统指令（印尼语，和题目 JSON 契约绑定）
const SYSTEM_INSTRUCTION: &str = r#"Persona: Pakar Kurikulum Nasional & Pengembang EduCBT Pro.
Tugas: Membuat soal berkualitas tinggi dalam format JSON.

### ATURAN NOTASI MATEMATIKA & SAINS (WAJIB) ###
- Gunakan standar LaTeX untuk semua rumus, angka berpangkat, akar, pecahan, dan simbol kimia.
- Bungkus rumus dengan tanda dollar satu ($) untuk inline, atau dollar ganda ($$) untuk baris baru/penting.
- Contoh: $x^2$, $\frac{1}{2}$, $\sqrt{25}$, $H_2O$.
- Hindari penggunaan karakter ^ atau / biasa jika itu dimaksudkan sebagai notasi matematika formal.

### FITUR STIMULUS BERSAMA ###
- Jika soal merujuk bacaan yang sama, isi 'stimulusText' dengan teks identik.

### DAFTAR TIPE SOAL ###
1. Pilihan Ganda
2. Pilihan Jamak (MCMA)
3. Pilihan Ganda Kompleks
4. (Benar/Salah)
5. (Sesuai/Tidak Sesuai)
6. ISIAN
7. URAIAN

### ATURAN TEKNIS ###
- Balas HANYA dengan array JSON yang valid, tanpa teks lain.
- Setiap soal memuat: type, level, text, options, correctAnswer, explanation, material, quizToken, order.
- 'correctAnswer' sesuai tipe soal (Indeks, Array Indeks, atau Array Boolean).
- 'tfLabels' harus bersih."#;

/// 出题服务
///
/// 职责：
/// - 调用 LLM API 生成/重生成/补全题目
/// - 宽松解析响应 JSON 并交给 Normalizer 整形
/// - 只处理单个请求
/// - 不出现 QuestionBank
/// - 不关心流程顺序
pub struct GenerationService {
    client: Client<OpenAIConfig>,
    model_name: String,
    fallback_model_name: String,
    max_retries: usize,
}

impl GenerationService {
    /// 创建新的出题服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            fallback_model_name: config.llm_fallback_model_name.clone(),
            max_retries: config.llm_max_retries.max(1),
        }
    }

    /// 按请求配置生成一批题目
    ///
    /// # 参数
    /// - `request`: 出题请求配置
    ///
    /// # 返回
    /// 返回已规范化的题目列表（编号从 1 开始，由调用方再行偏移）
    pub async fn generate(&self, request: &GenerationRequest) -> AppResult<Vec<Question>> {
        let prompt = build_generation_prompt(request);
        let image = self.resolve_reference_image(request).await?;

        let response = self
            .smart_chat(&prompt, Some(SYSTEM_INSTRUCTION), image.as_deref())
            .await?;

        let raws = parse_question_array(&response)?;
        debug!("LLM 返回 {} 个原始题目", raws.len());

        let defaults = QuestionDefaults::from_request(request);
        Ok(normalize_all(raws, &defaults))
    }

    /// 重新生成单个题目
    ///
    /// 原题目的 `id` 和 `order` 始终保留
    pub async fn regenerate(
        &self,
        question: &Question,
        instructions: Option<&str>,
    ) -> AppResult<Question> {
        let original_json = serde_json::to_string(question)
            .map_err(|e| AppError::Other(format!("无法序列化原题目: {}", e)))?;

        let prompt = format!(
            r#"REGENERATE SOAL BERIKUT.
Data Asli: {}
Instruksi Tambahan: {}

Kembalikan SATU objek JSON dengan skema yang sama."#,
            original_json,
            instructions.unwrap_or("Buat soal serupa dengan kualitas lebih baik.")
        );

        let response = self.smart_chat(&prompt, Some(SYSTEM_INSTRUCTION), None).await?;
        let raw = parse_question_object(&response)?;

        let defaults = QuestionDefaults::from_question(question);
        let mut regenerated = normalize(raw, &defaults, question.order);
        regenerated.id = question.id.clone();
        regenerated.order = question.order;
        Ok(regenerated)
    }

    /// 补全题目集合中缺失的字段（pembahasan / level / materi）
    ///
    /// 题干和答案保持不变，`id` 与 `order` 按位保留
    pub async fn repair(&self, questions: &[Question]) -> AppResult<Vec<Question>> {
        let questions_json = serde_json::to_string(questions)
            .map_err(|e| AppError::Other(format!("无法序列化题目集合: {}", e)))?;

        let prompt = format!(
            r#"LENGKAPI DATA KOSONG (pembahasan, level, atau materi) pada kumpulan soal berikut tanpa mengubah teks soal asli:
{}

Kembalikan array objek JSON lengkap sesuai skema yang diberikan."#,
            questions_json
        );

        let response = self.smart_chat(&prompt, Some(SYSTEM_INSTRUCTION), None).await?;
        let raws = parse_question_array(&response)?;

        let repaired = raws
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let (defaults, fallback_order) = match questions.get(i) {
                    Some(original) => (QuestionDefaults::from_question(original), original.order),
                    None => (QuestionDefaults::default(), i as u32 + 1),
                };
                let mut question = normalize(raw, &defaults, fallback_order);
                if let Some(original) = questions.get(i) {
                    question.id = original.id.clone();
                    question.order = original.order;
                }
                question
            })
            .collect();

        Ok(repaired)
    }

    /// 为单个题目补写解析文本
    ///
    /// 返回去掉标记的纯文本；失败时回退到占位文案，不打断调用方
    pub async fn generate_explanation(&self, question: &Question) -> String {
        let key = serde_json::to_string(&question.correct_answer).unwrap_or_default();
        let prompt = format!(
            "Buat pembahasan untuk: {} dengan kunci: {}. Gunakan LaTeX jika ada rumus.",
            question.text, key
        );

        match self.smart_chat(&prompt, Some("Pakar pedagogi."), None).await {
            Ok(response) => strip_markup(&response),
            Err(e) => {
                warn!("解析生成失败: {}", e);
                "Pembahasan gagal dibuat.".to_string()
            }
        }
    }

    /// 建议题目的认知层级
    ///
    /// 任何失败都回退到 L1，不打断调用方
    pub async fn suggest_level(&self, text: &str, options: &[String]) -> Level {
        let prompt = format!(
            "Analisis level kognitif untuk soal: {}. Opsi: {}. Balas L1, L2, atau L3 saja.",
            text,
            options.join(", ")
        );

        match self.smart_chat(&prompt, Some("Pakar asesmen."), None).await {
            Ok(response) => Level::find(&response).unwrap_or(Level::L1),
            Err(e) => {
                warn!("层级建议失败，回退到 L1: {}", e);
                Level::L1
            }
        }
    }

    /// 带重试与模型降级的聊天调用
    pub async fn smart_chat(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        image_url: Option<&str>,
    ) -> AppResult<String> {
        let models = [self.model_name.as_str(), self.fallback_model_name.as_str()];
        let mut last_error = None;

        for model in models {
            for attempt in 0..self.max_retries {
                match self
                    .send_chat(model, user_message, system_message, image_url)
                    .await
                {
                    Ok(content) => return Ok(content),
                    Err(e) if is_rate_limited(&e) => {
                        let wait = (attempt as u64 + 1) * 3;
                        warn!(
                            "限流 (模型: {}, 尝试 {}/{}), 等待 {} 秒后重试...",
                            model,
                            attempt + 1,
                            self.max_retries,
                            wait
                        );
                        sleep(Duration::from_secs(wait)).await;
                        last_error = Some(e);
                    }
                    // 其他错误立即上抛，不做重试
                    Err(e) => return Err(e),
                }
            }
            warn!("模型 {} 重试次数用尽，切换备用模型", model);
        }

        Err(last_error.unwrap_or_else(|| AppError::Other("LLM 调用失败".to_string())))
    }

    /// 发送单次聊天请求
    async fn send_chat(
        &self,
        model: &str,
        user_message: &str,
        system_message: Option<&str>,
        image_url: Option<&str>,
    ) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", model);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| AppError::llm_api_failed(model, e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        // 带参考图片时使用 Vision 内容分段
        let user_msg = if let Some(url) = image_url {
            let content_parts = vec![
                ChatCompletionRequestUserMessageContentPart::Text(
                    ChatCompletionRequestMessageContentPartText {
                        text: user_message.to_string(),
                    },
                ),
                ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: url.to_string(),
                            detail: Some(ImageDetail::Auto),
                        },
                    },
                ),
            ];

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
                .build()
                .map_err(|e| AppError::llm_api_failed(model, e))?
        } else {
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()
                .map_err(|e| AppError::llm_api_failed(model, e))?
        };

        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(0.7)
            .max_tokens(8192u32)
            .build()
            .map_err(|e| AppError::llm_api_failed(model, e))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::llm_api_failed(model, e))?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                AppError::Llm(LlmError::EmptyContent {
                    model: model.to_string(),
                })
            })?;

        Ok(content.trim().to_string())
    }

    // 参考图片统一编码为 data URL
    async fn resolve_reference_image(
        &self,
        request: &GenerationRequest,
    ) -> AppResult<Option<String>> {
        let Some(image) = &request.reference_image else {
            return Ok(None);
        };

        if let Some(data) = &image.data {
            return Ok(Some(format!("data:{};base64,{}", image.mime_type, data)));
        }

        if let Some(path) = &image.path {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| AppError::file_read_failed(path.clone(), e))?;
            let encoded = STANDARD.encode(bytes);
            return Ok(Some(format!(
                "data:{};base64,{}",
                image.mime_type, encoded
            )));
        }

        Ok(None)
    }
}

/// 构建出题用户提示词
fn build_generation_prompt(request: &GenerationRequest) -> String {
    let type_lines: Vec<String> = request
        .type_counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(label, count)| format!("- {}: {} soal", label, count))
        .collect();

    let level_lines: Vec<String> = request
        .level_counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(label, count)| format!("- {}: {} soal", label, count))
        .collect();

    let mut prompt = format!(
        "BUAT SOAL UNTUK {}. FASE: {}. MATERI: {}. TOKEN: {}.\n\nJumlah soal per tipe:\n{}\n",
        request.subject,
        request.phase,
        request.material,
        request.quiz_token,
        type_lines.join("\n")
    );

    if !level_lines.is_empty() {
        prompt.push_str(&format!(
            "\nDistribusi level kognitif:\n{}\n",
            level_lines.join("\n")
        ));
    }

    if let Some(reference) = &request.reference_text {
        prompt.push_str(&format!("\nREFERENSI TEKS: {}\n", reference));
    }

    if let Some(instructions) = &request.special_instructions {
        prompt.push_str(&format!("\nINSTRUKSI KHUSUS: {}\n", instructions));
    }

    prompt.push_str(
        "\nGunakan notasi LaTeX $ ... $ untuk setiap rumus matematika/sains agar terbaca sistem.",
    );

    prompt
}

// 限流/配额/过载类错误才触发重试
fn is_rate_limited(error: &AppError) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("quota")
        || msg.contains("429")
        || msg.contains("rate limit")
        || msg.contains("overload")
        || msg.contains("resource exhausted")
        || msg.contains("503")
}

/// 从响应文本中解析题目数组
///
/// LLM 偶尔会包上代码围栏或附加说明，先把 JSON 片段切出来
fn parse_question_array(response: &str) -> AppResult<Vec<RawQuestion>> {
    let slice = extract_json_slice(response, '[', ']');
    serde_json::from_str(slice).map_err(|e| {
        AppError::Llm(LlmError::ResponseParseFailed {
            snippet: truncate_text(slice, 80),
            source: Box::new(e),
        })
    })
}

/// 从响应文本中解析单个题目对象
fn parse_question_object(response: &str) -> AppResult<RawQuestion> {
    let slice = extract_json_slice(response, '{', '}');
    serde_json::from_str(slice).map_err(|e| {
        AppError::Llm(LlmError::ResponseParseFailed {
            snippet: truncate_text(slice, 80),
            source: Box::new(e),
        })
    })
}

// 切出首尾定界符之间的片段；找不到时返回去围栏后的全文
fn extract_json_slice(response: &str, open: char, close: char) -> &str {
    let without_fences = response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    match (without_fences.find(open), without_fences.rfind(close)) {
        (Some(start), Some(end)) if start < end => &without_fences[start..=end],
        _ => without_fences,
    }
}
