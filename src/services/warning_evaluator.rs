//! 警告评估 - 业务能力层
//!
//! 纯函数：同一个快照永远得到同一个结果

use crate::models::status::ProctoringSnapshot;

pub const VOICE_WARNING: &str = "Voice detected. Please remain silent during the exam.";
pub const PHONE_WARNING: &str = "Mobile phone detected. Please put away all electronic devices.";
pub const LOOKING_AWAY_WARNING: &str = "You appear to be looking away. Please keep your eyes on the screen.";
pub const NO_FACE_WARNING: &str = "Face not detected. Please stay in front of the camera.";

/// 展示给考生的警告
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub should_warn: bool,
}

impl Warning {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.message.lines()
    }
}

/// 根据快照生成警告
///
/// 所有命中的条件都会报告，顺序固定：声音、手机、视线、人脸。
/// 人脸只有明确为 `false` 时才告警，字段缺失不算。
/// 视线与人脸同时命中时，视线一行在前。
pub fn evaluate(snapshot: &ProctoringSnapshot) -> Warning {
    let checks = [
        (snapshot.voice_detected == Some(true), VOICE_WARNING),
        (snapshot.phone_detected == Some(true), PHONE_WARNING),
        (snapshot.looking_away == Some(true), LOOKING_AWAY_WARNING),
        (snapshot.face_detected == Some(false), NO_FACE_WARNING),
    ];

    let lines: Vec<&str> = checks
        .iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, line)| *line)
        .collect();

    Warning {
        should_warn: !lines.is_empty(),
        message: lines.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_snapshot_has_no_warning() {
        let snapshot = ProctoringSnapshot {
            face_detected: Some(true),
            voice_detected: Some(false),
            ..Default::default()
        };
        assert_eq!(evaluate(&snapshot), Warning::default());
    }

    #[test]
    fn test_absent_face_field_is_not_a_warning() {
        assert!(!evaluate(&ProctoringSnapshot::default()).should_warn);
    }

    #[test]
    fn test_all_conditions_reported_in_fixed_order() {
        let snapshot = ProctoringSnapshot {
            face_detected: Some(false),
            phone_detected: Some(true),
            looking_away: Some(true),
            voice_detected: Some(true),
            ..Default::default()
        };
        let warning = evaluate(&snapshot);
        assert!(warning.should_warn);
        assert_eq!(
            warning.lines().collect::<Vec<_>>(),
            vec![VOICE_WARNING, PHONE_WARNING, LOOKING_AWAY_WARNING, NO_FACE_WARNING]
        );
        assert_eq!(evaluate(&snapshot), warning);
    }

    #[test]
    fn test_looking_away_and_no_face() {
        let snapshot = ProctoringSnapshot {
            face_detected: Some(false),
            looking_away: Some(true),
            phone_detected: Some(false),
            voice_detected: Some(false),
            ..Default::default()
        };
        let warning = evaluate(&snapshot);
        assert!(warning.should_warn);
        let lines: Vec<_> = warning.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines, vec![LOOKING_AWAY_WARNING, NO_FACE_WARNING]);
    }
}
