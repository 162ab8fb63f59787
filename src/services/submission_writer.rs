//! 提交记录写入服务 - 业务能力层
//!
//! 只负责"写 submissions.txt"能力，不关心流程

use crate::error::{AppError, AppResult};
use crate::models::question::QuestionBank;
use crate::models::student::Student;
use crate::services::answer_store::{AnswerStore, ScoreReport};
use crate::utils::logging::truncate_text;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// 提交记录写入服务
///
/// 职责：
/// - 把最终提交的作答追加写入文件
/// - 不判断会话状态
pub struct SubmissionWriter {
    path: PathBuf,
}

impl SubmissionWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// 追加一条提交记录
    pub async fn write(
        &self,
        student: &Student,
        bank: &QuestionBank,
        answers: &AnswerStore,
        score: ScoreReport,
        remaining_secs: u32,
    ) -> AppResult<()> {
        let record = render_record(student, bank, answers, score, remaining_secs);
        debug!("写入提交记录: {} | {} 字节", self.path.display(), record.len());

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            file.write_all(record.as_bytes())
        })
        .await
        .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))?
        .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))
    }
}

fn render_record(
    student: &Student,
    bank: &QuestionBank,
    answers: &AnswerStore,
    score: ScoreReport,
    remaining_secs: u32,
) -> String {
    let mut out = format!(
        "{}\n提交时间: {} | 考生: {} | 得分: {}/{} | 剩余: {}s\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        student,
        score.correct,
        score.multiple_choice_total,
        remaining_secs
    );
    for (index, question) in bank.questions().iter().enumerate() {
        let answer = match answers.record(index) {
            Some(record) if question.is_multiple_choice() => match record.selected {
                -1 => "(未作答)".to_string(),
                n => format!("选项 {}", n + 1),
            },
            Some(record) if record.text.trim().is_empty() => "(未作答)".to_string(),
            Some(record) => truncate_text(record.text.trim(), 500),
            None => "(未作答)".to_string(),
        };
        out.push_str(&format!("  题目 {}: {}\n", question.id, answer));
    }
    out
}
