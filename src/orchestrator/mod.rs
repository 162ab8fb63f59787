//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责会话调度和资源管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `session_orchestrator` - 会话编排器
//! - 持有摄像头、轮询器、时钟等所有后台资源
//! - 单任务事件循环：命令 / 轮询结果 / tick 按到达顺序处理
//! - 通过 watch 通道发布只读视图
//! - 卸载时取消所有任务、停止监控、释放摄像头
//!
//! ### `app` - 命令行应用
//! - 初始化配置、题库和检测服务客户端
//! - 考生准入（登录、考前须知）
//! - 把标准输入转换成会话命令
//!
//! ## 层次关系
//!
//! ```text
//! app (标准输入 / 输出)
//!     ↓
//! session_orchestrator (事件循环，持有资源)
//!     ↓
//! workflow::ExamSession (纯状态机)
//!     ↓
//! services (能力层：answer_store / countdown / poller / warning / admission / writer)
//!     ↓
//! infrastructure + clients (摄像头设备、检测服务 HTTP)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一写者**：只有编排器任务修改会话状态
//! 2. **资源隔离**：只有编排层持有 CameraManager 和 JoinHandle
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：状态判断全部在 ExamSession 中

pub mod app;
pub mod session_orchestrator;

// 重新导出主要类型
pub use app::{parse_input, App, UserInput};
pub use session_orchestrator::{SessionEvent, SessionHandle, SessionOrchestrator, SessionReport};
