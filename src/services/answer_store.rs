//! 作答存储 - 业务能力层
//!
//! 只负责"保存每道题的作答"能力，不关心会话状态

use crate::error::LifecycleError;
use crate::models::question::{QuestionBank, QuestionKind};
use serde::Serialize;

/// 单道题的作答记录
///
/// 两个字段都存在，按题型只解释其中一个
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    /// 选中的选项，-1 表示未作答
    pub selected: i32,
    /// 主观题文本，空串表示未作答
    pub text: String,
}

impl Default for AnswerRecord {
    fn default() -> Self {
        Self {
            selected: -1,
            text: String::new(),
        }
    }
}

/// 单选题得分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreReport {
    pub correct: usize,
    pub multiple_choice_total: usize,
}

impl std::fmt::Display for ScoreReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "You scored {} out of {} multiple-choice questions correctly.",
            self.correct, self.multiple_choice_total
        )
    }
}

/// 作答存储
///
/// 职责：
/// - 独占所有 AnswerRecord
/// - 每次写入只影响一道题
/// - 判断是否已作答、计算单选题得分
#[derive(Debug, Clone)]
pub struct AnswerStore {
    bank: QuestionBank,
    records: Vec<AnswerRecord>,
}

impl AnswerStore {
    pub fn new(bank: QuestionBank) -> Self {
        let records = vec![AnswerRecord::default(); bank.len()];
        Self { bank, records }
    }

    /// 覆盖某道题的选项
    pub fn select_option(&mut self, question_index: usize, option_index: usize) -> Result<(), LifecycleError> {
        let question = self.check_index(question_index)?;
        if question.kind != QuestionKind::MultipleChoice {
            return Err(LifecycleError::WrongQuestionKind { index: question_index });
        }
        if option_index >= question.options.len() {
            return Err(LifecycleError::IndexOutOfRange {
                index: option_index,
                max_index: question.options.len().saturating_sub(1),
            });
        }
        self.records[question_index].selected = option_index as i32;
        Ok(())
    }

    /// 覆盖某道题的文本作答
    pub fn set_text(&mut self, question_index: usize, text: impl Into<String>) -> Result<(), LifecycleError> {
        let question = self.check_index(question_index)?;
        if question.kind != QuestionKind::Theoretical {
            return Err(LifecycleError::WrongQuestionKind { index: question_index });
        }
        self.records[question_index].text = text.into();
        Ok(())
    }

    /// 单选题：选项 ≠ -1；主观题：去空白后非空
    pub fn is_answered(&self, question_index: usize) -> bool {
        match (self.bank.get(question_index), self.records.get(question_index)) {
            (Some(question), Some(record)) => match question.kind {
                QuestionKind::MultipleChoice => record.selected != -1,
                QuestionKind::Theoretical => !record.text.trim().is_empty(),
            },
            _ => false,
        }
    }

    pub fn answered_count(&self) -> usize {
        (0..self.records.len()).filter(|&i| self.is_answered(i)).count()
    }

    /// 只统计单选题，主观题不参与自动评分
    pub fn score(&self) -> ScoreReport {
        let correct = self
            .bank
            .questions()
            .iter()
            .zip(&self.records)
            .filter(|(q, r)| q.is_multiple_choice() && r.selected == q.correct_answer as i32)
            .count();
        ScoreReport {
            correct,
            multiple_choice_total: self.bank.multiple_choice_count(),
        }
    }

    pub fn record(&self, question_index: usize) -> Option<&AnswerRecord> {
        self.records.get(question_index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<&crate::models::Question, LifecycleError> {
        self.bank.get(index).ok_or(LifecycleError::IndexOutOfRange {
            index,
            max_index: self.bank.len().saturating_sub(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> AnswerStore {
        AnswerStore::new(QuestionBank::builtin())
    }

    #[test]
    fn test_last_selection_wins_without_cross_index_effect() {
        let mut store = store();
        store.select_option(0, 2).unwrap();
        store.select_option(0, 1).unwrap();
        store.select_option(2, 0).unwrap();

        assert_eq!(store.record(0).unwrap().selected, 1);
        assert!(store.is_answered(0));
        assert!(!store.is_answered(1));
        assert!(store.is_answered(2));
        assert_eq!(store.answered_count(), 2);
    }

    #[test]
    fn test_whitespace_text_is_unanswered() {
        let mut store = store();
        store.set_text(5, "   \n").unwrap();
        assert!(!store.is_answered(5));
        store.set_text(5, "Continuous identity checks").unwrap();
        assert!(store.is_answered(5));
    }

    #[test]
    fn test_score_counts_only_multiple_choice() {
        let mut store = store();
        store.select_option(0, 1).unwrap(); // correct
        store.select_option(1, 0).unwrap(); // wrong
        store.select_option(2, 3).unwrap(); // correct
        store.set_text(5, "a very thorough essay").unwrap();

        let score = store.score();
        assert_eq!(score.correct, 2);
        assert_eq!(score.multiple_choice_total, 5);

        store.set_text(5, "").unwrap();
        assert_eq!(store.score().correct, 2);
    }

    #[test]
    fn test_mutation_rejections_leave_state_untouched() {
        let mut store = store();
        assert_eq!(
            store.select_option(9, 0),
            Err(LifecycleError::IndexOutOfRange { index: 9, max_index: 5 })
        );
        assert_eq!(
            store.select_option(5, 0),
            Err(LifecycleError::WrongQuestionKind { index: 5 })
        );
        assert!(store.select_option(0, 4).is_err());
        assert!(store.set_text(0, "text").is_err());
        assert_eq!(store.answered_count(), 0);
    }

    #[test]
    fn test_score_message() {
        let report = ScoreReport {
            correct: 3,
            multiple_choice_total: 5,
        };
        assert_eq!(
            report.to_string(),
            "You scored 3 out of 5 multiple-choice questions correctly."
        );
    }
}
