use serde::{Deserialize, Serialize};

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    /// 单选题
    #[default]
    MultipleChoice,
    /// 主观题（人工批改）
    Theoretical,
}

/// 单道题目，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    #[serde(rename = "question")]
    pub prompt: String,
    /// 主观题为空
    #[serde(default)]
    pub options: Vec<String>,
    /// 正确选项下标，只对单选题有意义
    #[serde(default)]
    pub correct_answer: usize,
    #[serde(default, rename = "type")]
    pub kind: QuestionKind,
}

impl Question {
    pub fn is_multiple_choice(&self) -> bool {
        self.kind == QuestionKind::MultipleChoice
    }
}

/// 固定题库
///
/// 作为显式配置注入会话，测试中可替换为夹具
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBank {
    #[serde(rename = "questions")]
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// 单选题总数
    pub fn multiple_choice_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_multiple_choice()).count()
    }

    /// 内置参考题库
    pub fn builtin() -> Self {
        let dragon_options = || {
            vec![
                "The mascot of the institution".to_string(),
                "The password for access".to_string(),
                "The developer's name".to_string(),
                "The security protocol used".to_string(),
            ]
        };
        let mut questions = vec![
            Question {
                id: 1,
                prompt: "Which of the following is a characteristic of a secure proctoring system?"
                    .to_string(),
                options: vec![
                    "Recording the screen without student's consent".to_string(),
                    "Continuous identity verification during the exam".to_string(),
                    "Allowing unlimited access to external resources".to_string(),
                    "Disabling computer functionality completely".to_string(),
                ],
                correct_answer: 1,
                kind: QuestionKind::MultipleChoice,
            },
            Question {
                id: 2,
                prompt: "Which of the following is a benefit of online proctoring?".to_string(),
                options: vec![
                    "Reduced accessibility".to_string(),
                    "Increased exam costs".to_string(),
                    "Remote exam supervision".to_string(),
                    "Slower grading process".to_string(),
                ],
                correct_answer: 2,
                kind: QuestionKind::MultipleChoice,
            },
        ];
        for id in 3..=5 {
            questions.push(Question {
                id,
                prompt: "What does 'Dragon' represent in this system?".to_string(),
                options: dragon_options(),
                correct_answer: 3,
                kind: QuestionKind::MultipleChoice,
            });
        }
        questions.push(Question {
            id: 6,
            prompt: "Describe three key security features of the Dragon proctoring system and explain how they prevent academic dishonesty.".to_string(),
            options: Vec::new(),
            correct_answer: 0,
            kind: QuestionKind::Theoretical,
        });
        Self { questions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_bank_shape() {
        let bank = QuestionBank::builtin();
        assert_eq!(bank.len(), 6);
        assert_eq!(bank.multiple_choice_count(), 5);
        assert_eq!(bank.get(5).map(|q| q.kind), Some(QuestionKind::Theoretical));
        assert!(bank.get(5).map(|q| q.options.is_empty()).unwrap_or(false));
    }

    #[test]
    fn test_kind_defaults_to_multiple_choice() {
        let q: Question = toml::from_str(
            r#"
            id = 9
            question = "Pick one"
            options = ["a", "b"]
            correct_answer = 1
            "#,
        )
        .unwrap();
        assert!(q.is_multiple_choice());
    }
}
