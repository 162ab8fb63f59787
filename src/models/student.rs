use serde::{Deserialize, Serialize};

/// 登录表单
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub full_name: String,
    pub registration_number: String,
    pub password: String,
}

/// 通过登录校验的考生
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub name: String,
    pub id: String,
}

impl std::fmt::Display for Student {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (ID: {})", self.name, self.id)
    }
}
