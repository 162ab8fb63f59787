use crate::models::question::{QuestionBank, QuestionKind};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载题库
pub async fn load_question_bank(toml_file_path: &Path) -> Result<QuestionBank> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let bank = parse_question_bank(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    tracing::info!("成功加载 {} 个题目", bank.len());

    Ok(bank)
}

/// 解析题库文本并检查题目是否自洽
pub fn parse_question_bank(content: &str) -> Result<QuestionBank> {
    let bank: QuestionBank = toml::from_str(content)?;

    if bank.is_empty() {
        anyhow::bail!("题库为空");
    }

    for (index, question) in bank.questions().iter().enumerate() {
        if question.kind == QuestionKind::MultipleChoice {
            if question.options.is_empty() {
                anyhow::bail!("第 {} 题是单选题但没有选项", index + 1);
            }
            if question.correct_answer >= question.options.len() {
                anyhow::bail!(
                    "第 {} 题的正确答案 {} 超出选项范围 [0, {}]",
                    index + 1,
                    question.correct_answer,
                    question.options.len() - 1
                );
            }
        }
    }

    Ok(bank)
}

/// 按配置加载题库，未配置路径时使用内置题库
pub async fn load_configured_bank(path: Option<&str>) -> Result<QuestionBank> {
    match path {
        Some(p) => {
            tracing::info!("正在加载题库: {}", p);
            load_question_bank(Path::new(p)).await
        }
        None => {
            tracing::info!("未配置题库文件，使用内置题库");
            Ok(QuestionBank::builtin())
        }
    }
}
