//! # Exam Proctor
//!
//! 带监考信号的在线考试客户端
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（摄像头），只暴露能力
//! - `CameraManager` - 唯一的采集流持有者，提供申请 / 释放能力
//! - `clients/` - 检测服务的 REST 客户端（`DetectionApi`）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，互不依赖
//! - `AnswerStore` - 作答存储与评分
//! - `Countdown` - 倒计时
//! - `StatusPoller` - 定时拉取检测状态
//! - `evaluate` - 根据检测快照生成警告
//! - `admission` - 登录与考前须知校验
//! - `SubmissionWriter` - 写提交记录
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一场考试"的状态流转
//! - `ExamSession` - Active / Paused / Submitted 状态机
//! - `SessionView` - 发布给界面的只读视图
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session_orchestrator` - 单任务事件循环，管理资源和后台任务
//! - `orchestrator/app` - 命令行应用，考生准入和命令转发
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{DetectionApi, DetectionClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{CameraDevice, CameraManager};
pub use models::question::{Question, QuestionBank};
pub use models::student::Student;
pub use orchestrator::{App, SessionHandle, SessionOrchestrator, SessionReport};
pub use workflow::{CommandOutcome, ExamSession, Lifecycle, SessionCommand, SessionView};
