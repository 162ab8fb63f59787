/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use crate::config::Config;
use crate::models::student::Student;
use crate::workflow::session_view::SessionView;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。
/// 重复调用不会报错，方便测试。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, student: &Student) {
    info!("{}", "=".repeat(60));
    info!("🚀 考试会话启动 - {}", student);
    info!("🌐 检测服务: {}", config.api_base_url);
    info!(
        "⏱ 考试时长: {} | 暂停时冻结时钟: {}",
        format_clock(config.exam_duration_secs),
        config.freeze_clock_while_paused
    );
    info!(
        "🔄 轮询间隔: exam_status {}ms | camera_status {}ms | camera_events {}ms",
        config.exam_status_poll_ms, config.camera_status_poll_ms, config.camera_events_poll_ms
    );
    info!("📷 摄像头: {}", config.camera_device);
    info!("{}", "=".repeat(60));
}

/// 打印会话结束统计
pub fn log_session_summary(view: &SessionView, submission_file: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 考试会话结束");
    info!(
        "结束时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("👤 考生: {}", view.student);
    info!("📌 状态: {}", view.lifecycle);
    info!("⏱ 剩余时间: {}", view.clock());
    info!(
        "✍ 已作答: {}/{}",
        view.answered_count(),
        view.question_count
    );
    if let Some(score) = view.score {
        info!("✅ 得分: {}/{}", score.correct, score.multiple_choice_total);
    }
    info!("{}", "=".repeat(60));
    if view.final_submitted {
        info!("\n提交记录已保存至: {}", submission_file);
    }
}

/// 把秒数格式化为 mm:ss
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
