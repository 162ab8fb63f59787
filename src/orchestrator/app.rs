//! 命令行应用 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：校验配置、加载题库、创建检测服务客户端
//! 2. **考生准入**：登录表单 → 考前须知 → 姓名确认
//! 3. **运行会话**：启动 SessionOrchestrator，把标准输入的命令转发给它
//! 4. **结束统计**：输出会话摘要
//!
//! 界面只通过 `SessionHandle` 读写会话，不直接持有任何状态。

use crate::clients::{DetectionApi, DetectionClient};
use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::{CameraDevice, LocalCamera};
use crate::models::loaders::load_configured_bank;
use crate::models::question::QuestionBank;
use crate::models::student::{Credentials, Student};
use crate::orchestrator::session_orchestrator::{SessionHandle, SessionOrchestrator};
use crate::services::admission::{confirm_instructions, validate_login};
use crate::utils::logging::{log_session_summary, log_startup};
use crate::workflow::exam_session::{CommandOutcome, SessionCommand};
use crate::workflow::session_view::{Lifecycle, SessionView};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;
use tracing::{debug, info, warn};

type Input = Lines<BufReader<Stdin>>;

const EXAM_RULES: [&str; 4] = [
    "You must complete the exam within the allocated time.",
    "Your webcam must remain on throughout the exam session.",
    "No other person should be present in your room during the exam.",
    "You cannot use additional devices, books, or notes.",
];

const MONITORED: [&str; 3] = [
    "Your webcam video feed",
    "Browser activity and tab switching",
    "Suspicious movements or behaviors",
];

const HELP: &str = "Commands: n (next) | p (previous) | a <option> | t <text> | s (submit) | f (final submit) | alerts | resume | q (quit)";

/// 标准输入的一行命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Next,
    Previous,
    /// 选项编号，从 1 开始
    Choose(usize),
    Text(String),
    Submit,
    FinalSubmit,
    Alerts,
    Resume,
    Quit,
    Help,
}

/// 解析一行输入
pub fn parse_input(line: &str) -> Result<UserInput, String> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    match head.to_lowercase().as_str() {
        "n" | "next" => Ok(UserInput::Next),
        "p" | "prev" | "previous" => Ok(UserInput::Previous),
        "a" | "answer" => match rest.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(UserInput::Choose(n)),
            _ => Err(format!("Invalid option: '{}'", rest)),
        },
        "t" | "text" => Ok(UserInput::Text(rest.to_string())),
        "s" | "submit" => Ok(UserInput::Submit),
        "f" | "final" => Ok(UserInput::FinalSubmit),
        "alerts" => Ok(UserInput::Alerts),
        "resume" => Ok(UserInput::Resume),
        "q" | "quit" | "exit" => Ok(UserInput::Quit),
        "h" | "help" | "?" | "" => Ok(UserInput::Help),
        other => Err(format!("Unknown command: '{}'", other)),
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    bank: QuestionBank,
    api: Arc<dyn DetectionApi>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate().context("配置无效")?;

        let bank = load_configured_bank(config.question_bank_path.as_deref()).await?;
        info!("✓ 题库已加载: {} 道题", bank.len());

        let api: Arc<dyn DetectionApi> = Arc::new(DetectionClient::new(&config)?);

        Ok(Self { config, bank, api })
    }

    /// 运行应用主逻辑
    pub async fn run(self) -> Result<()> {
        let mut input = BufReader::new(tokio::io::stdin()).lines();

        let Some(student) = self.admit(&mut input).await? else {
            warn!("⚠️ 输入已结束，未进入考试");
            return Ok(());
        };

        log_startup(&self.config, &student);

        let device: Arc<dyn CameraDevice> = Arc::new(LocalCamera::new(&self.config.camera_device));
        let (orchestrator, handle) = SessionOrchestrator::new(
            self.config.clone(),
            self.bank.clone(),
            student,
            self.api.clone(),
            device,
        );
        let session = tokio::spawn(orchestrator.run());
        let notifier = tokio::spawn(notify_changes(handle.subscribe()));

        println!("\n{}", HELP);
        print_question(&handle.view());

        let loop_result = self.command_loop(&handle, &mut input).await;

        handle.shutdown().await;
        let report = session.await.context("会话任务异常退出")??;
        notifier.abort();

        log_session_summary(&handle.view(), &self.config.submission_file);
        debug!("会话报告: {}", serde_json::to_string(&report)?);

        loop_result
    }

    /// 登录 + 考前须知，输入结束时返回 None
    async fn admit(&self, input: &mut Input) -> Result<Option<Student>> {
        println!("{}", "=".repeat(60));
        println!("Dragon Proctoring System - Student Login");
        println!("{}", "=".repeat(60));

        let student = loop {
            let Some(full_name) = prompt(input, "Full name: ").await? else {
                return Ok(None);
            };
            let Some(registration_number) = prompt(input, "Registration number: ").await? else {
                return Ok(None);
            };
            let Some(password) = prompt(input, "Password: ").await? else {
                return Ok(None);
            };
            let credentials = Credentials {
                full_name,
                registration_number,
                password,
            };
            match validate_login(&credentials, &self.config.exam_password) {
                Ok(student) => break student,
                Err(AppError::Validation(e)) => println!("✗ {}", e),
                Err(e) => return Err(e.into()),
            }
        };

        println!("\nExam Rules");
        for rule in EXAM_RULES {
            println!("  • {}", rule);
        }
        println!("\nThis exam is proctored using Dragon Proctoring System. The following will be monitored:");
        for item in MONITORED {
            println!("  • {}", item);
        }
        println!();

        loop {
            let Some(agree) = prompt(input, "Do you agree to the terms and conditions? (y/n): ").await?
            else {
                return Ok(None);
            };
            let agreed = matches!(agree.trim().to_lowercase().as_str(), "y" | "yes");
            let Some(typed_name) = prompt(input, "Type your full name to confirm: ").await? else {
                return Ok(None);
            };
            match confirm_instructions(&student, agreed, &typed_name) {
                Ok(()) => break,
                Err(AppError::Validation(e)) => println!("✗ {}", e),
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Some(student))
    }

    /// 命令循环：直到输入结束、退出或最终提交完成
    async fn command_loop(&self, handle: &SessionHandle, input: &mut Input) -> Result<()> {
        while let Some(line) = input.next_line().await? {
            let command = match parse_input(&line) {
                Ok(command) => command,
                Err(msg) => {
                    println!("{}\n{}", msg, HELP);
                    continue;
                }
            };

            let view = handle.view();
            let outcome = match command {
                UserInput::Quit => break,
                UserInput::Help => {
                    println!("{}", HELP);
                    print_question(&view);
                    continue;
                }
                UserInput::Alerts => {
                    self.show_alerts().await;
                    continue;
                }
                UserInput::Resume => {
                    self.request_resume().await;
                    continue;
                }
                UserInput::Next => handle.send(SessionCommand::Next).await,
                UserInput::Previous => handle.send(SessionCommand::Previous).await,
                UserInput::Choose(option) => {
                    handle
                        .send(SessionCommand::SelectOption {
                            question: view.current_index,
                            option: option - 1,
                        })
                        .await
                }
                UserInput::Text(text) => {
                    handle
                        .send(SessionCommand::SetText {
                            question: view.current_index,
                            text,
                        })
                        .await
                }
                UserInput::Submit => handle.send(SessionCommand::Submit).await,
                UserInput::FinalSubmit => handle.send(SessionCommand::FinalSubmit).await,
            };

            if let CommandOutcome::Rejected(e) = outcome {
                println!("✗ {}", e);
            }

            let view = handle.view();
            print_question(&view);
            if view.final_submitted {
                println!("Exam completed successfully!");
                break;
            }
        }
        Ok(())
    }

    /// 查看可疑行为记录
    async fn show_alerts(&self) {
        match self.api.suspicious_activities().await {
            Ok(activities) if activities.is_empty() => println!("No suspicious activities recorded."),
            Ok(activities) => {
                println!("Suspicious activities ({}):", activities.len());
                for activity in activities {
                    println!("  {}", activity);
                }
            }
            Err(e) => warn!("⚠️ 获取可疑行为记录失败: {}", e),
        }
    }

    /// 请求服务端恢复考试；本地状态等下一次轮询再变化
    async fn request_resume(&self) {
        match self.api.resume_exam().await {
            Ok(_) => println!("Resume requested. Waiting for the proctoring service to confirm."),
            Err(e) => warn!("⚠️ 请求恢复考试失败: {}", e),
        }
    }
}

async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>> {
    use std::io::Write;
    print!("{}", label);
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}

/// 打印当前题目
fn print_question(view: &SessionView) {
    println!("\n{}", "─".repeat(60));
    println!(
        "Question {} of {} [{}%] | Time left {} | Answered {}/{} | {}",
        view.current_index + 1,
        view.question_count,
        view.progress_percent(),
        view.clock(),
        view.answered_count(),
        view.question_count,
        view.lifecycle
    );

    if let Some(notice) = &view.camera_notice {
        println!("📷 {}", notice);
    }
    if view.lifecycle == Lifecycle::Paused {
        print_pause(view);
    }
    if view.warning.should_warn {
        print_warning(view);
    }

    if let Some(summary) = view.summary {
        if let Some(score) = view.score {
            println!("{}", score);
        }
        println!("{}", summary);
        if view.controls.can_final_submit {
            println!("Type 'f' to submit your exam.");
        }
        return;
    }

    if let (Some(question), Some(answer)) = (&view.question, &view.answer) {
        println!("{}", question.prompt);
        if question.is_multiple_choice() {
            for (i, option) in question.options.iter().enumerate() {
                let mark = if answer.selected == i as i32 { "(*)" } else { "( )" };
                println!("  {} {}) {}", mark, i + 1, option);
            }
        } else if answer.text.trim().is_empty() {
            println!("  (type your answer with: t <text>)");
        } else {
            println!("  Your answer: {}", answer.text);
        }
    }
}

fn print_pause(view: &SessionView) {
    println!("⏸ Exam Paused");
    for reason in &view.pause.reasons {
        println!("  - {}", reason);
    }
    println!("  Please wait for the proctor to resume your exam.");
}

fn print_warning(view: &SessionView) {
    for line in view.warning.lines() {
        println!("⚠ {}", line);
    }
}

/// 只在暂停状态、警告、提示或事件变化时打印
async fn notify_changes(mut views: watch::Receiver<SessionView>) {
    let mut last_lifecycle = views.borrow().lifecycle;
    let mut last_warning = views.borrow().warning.clone();
    let mut last_toast = views.borrow().toast_seq;
    let mut last_events = views.borrow().recent_events.clone();

    while views.changed().await.is_ok() {
        let view = views.borrow_and_update().clone();

        if view.lifecycle != last_lifecycle {
            match view.lifecycle {
                Lifecycle::Paused => print_pause(&view),
                Lifecycle::Active => println!("▶ Your exam has been resumed."),
                Lifecycle::Submitted => print_question(&view),
            }
            last_lifecycle = view.lifecycle;
        }
        if view.warning != last_warning {
            if view.warning.should_warn {
                print_warning(&view);
            }
            last_warning = view.warning.clone();
        }
        if view.toast_seq != last_toast {
            if let Some(toast) = &view.toast {
                let icon = if toast.destructive { "✗" } else { "ℹ" };
                println!("{} {}: {}", icon, toast.title, toast.description);
            }
            last_toast = view.toast_seq;
        }
        if view.recent_events != last_events {
            for event in &view.recent_events {
                debug!("📋 事件: {} @ {}", event.event_type, event.timestamp);
            }
            last_events = view.recent_events.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_navigation_and_answers() {
        assert_eq!(parse_input("n"), Ok(UserInput::Next));
        assert_eq!(parse_input(" P "), Ok(UserInput::Previous));
        assert_eq!(parse_input("a 2"), Ok(UserInput::Choose(2)));
        assert_eq!(
            parse_input("t  identity checks and gaze tracking "),
            Ok(UserInput::Text("identity checks and gaze tracking".to_string()))
        );
        assert_eq!(parse_input("s"), Ok(UserInput::Submit));
        assert_eq!(parse_input("f"), Ok(UserInput::FinalSubmit));
        assert_eq!(parse_input("alerts"), Ok(UserInput::Alerts));
        assert_eq!(parse_input("resume"), Ok(UserInput::Resume));
        assert_eq!(parse_input("q"), Ok(UserInput::Quit));
        assert_eq!(parse_input(""), Ok(UserInput::Help));
    }

    #[test]
    fn test_parse_rejects_bad_option() {
        assert!(parse_input("a 0").is_err());
        assert!(parse_input("a x").is_err());
        assert!(parse_input("jump").is_err());
    }
}
