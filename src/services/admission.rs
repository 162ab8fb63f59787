//! 考生准入 - 业务能力层
//!
//! 登录表单校验和考前须知确认。只是客户端的简单检查，不是安全边界。

use crate::error::{AppResult, ValidationError};
use crate::models::student::{Credentials, Student};
use regex::Regex;
use tracing::{debug, info};

/// 学号格式：RA + 13 位数字
fn is_registration_number(value: &str) -> bool {
    Regex::new(r"^RA\d{13}$")
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

/// 校验登录表单
///
/// 按 姓名 → 学号 → 学号格式 → 口令 的顺序检查，返回第一个错误
pub fn validate_login(credentials: &Credentials, expected_password: &str) -> AppResult<Student> {
    let name = credentials.full_name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingName.into());
    }

    let registration = credentials.registration_number.trim();
    if registration.is_empty() {
        return Err(ValidationError::MissingRegistrationNumber.into());
    }
    if !is_registration_number(&credentials.registration_number) {
        debug!("学号格式不正确: {}", credentials.registration_number);
        return Err(ValidationError::MalformedRegistrationNumber.into());
    }

    if credentials.password != expected_password {
        return Err(ValidationError::InvalidPassword.into());
    }

    info!("✓ 登录成功: {} ({})", name, registration);
    Ok(Student {
        name: name.to_string(),
        id: registration.to_string(),
    })
}

/// 确认考前须知
///
/// 必须同意条款，并输入与登录时一致的姓名（忽略大小写和首尾空白）
pub fn confirm_instructions(student: &Student, agreed: bool, typed_name: &str) -> AppResult<()> {
    if !agreed {
        return Err(ValidationError::TermsNotAccepted.into());
    }
    let typed = typed_name.trim();
    if typed.is_empty() {
        return Err(ValidationError::MissingNameConfirmation.into());
    }
    if typed.to_lowercase() != student.name.trim().to_lowercase() {
        return Err(ValidationError::NameMismatch.into());
    }
    Ok(())
}
