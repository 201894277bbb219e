//! # EduCBT Studio
//!
//! 一个用于批量生成、整形和导出教学测验题目的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 数据模型层（Models）
//! - `models/` - 题目实体与不变量；答案键形态必须与题型对应
//! - `Question` / `AnswerKey` / `QuestionType` - 核心数据模型
//! - `QuestionBank` - 唯一的可变题目列表，只做整表替换
//! - `loaders/` - 请求 TOML 与题目 JSON 的文件装载
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个题目/单个集合
//! - `normalizer` - 把不可信外部输入整形为严格模型（永不报错）
//! - `transformer` - 题型转换，答案键按目标形态重推
//! - `shuffler` - 选项/题目打乱与自动重排，答案语义不变
//! - `GenerationService` - LLM 出题能力（重试 + 模型降级）
//! - `spreadsheet` / `exporter` - Excel 与文档导入导出
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个请求"的完整处理流程
//! - `RequestCtx` - 上下文封装（请求名 + 令牌）
//! - `GenerationFlow` - 流程编排（生成 → 入库 → 后处理）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 批量请求处理器，管理并发和统计
//! - `orchestrator/request_processor` - 单个请求处理器，负责导出
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{
    AnswerKey, GenerationRequest, Question, QuestionBank, QuestionType, RawQuestion,
};
pub use orchestrator::{process_request, App};
pub use workflow::{GenerationFlow, RequestCtx};
