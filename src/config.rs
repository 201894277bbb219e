/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时处理的请求文件数量
    pub max_concurrent_requests: usize,
    /// 出题请求 TOML 文件存放目录
    pub request_folder: String,
    /// 导出文件输出目录
    pub output_folder: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    /// 首选模型
    pub llm_model_name: String,
    /// 首选模型重试耗尽后的备用模型
    pub llm_fallback_model_name: String,
    /// 每个模型的限流重试次数
    pub llm_max_retries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 4,
            request_folder: "requests".to_string(),
            output_folder: "output".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-3-pro-preview".to_string(),
            llm_fallback_model_name: "gemini-3-flash-preview".to_string(),
            llm_max_retries: 4,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_requests: std::env::var("MAX_CONCURRENT_REQUESTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_requests),
            request_folder: std::env::var("REQUEST_FOLDER").unwrap_or(default.request_folder),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(default.output_folder),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_fallback_model_name: std::env::var("LLM_FALLBACK_MODEL_NAME").unwrap_or(default.llm_fallback_model_name),
            llm_max_retries: std::env::var("LLM_MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_max_retries),
        }
    }
}
