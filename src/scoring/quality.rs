use serde::Serialize;

use super::form::{FormAssessment, Grade, IssueKey};

/// 1レップに対するフィードバック分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    /// まだ評価対象のレップがない
    Waiting,
    GoodForm,
    /// 軽微な問題のみ（優先度付きの分類に当てはまらない）
    Acceptable,
    TooShallow,
    /// 目標範囲より深く曲げすぎ
    TooDeep,
    LeanTooFar,
    HeelsRising,
    KneesTooForward,
}

impl FeedbackKind {
    pub fn is_valid(self) -> bool {
        self != FeedbackKind::Waiting
    }
}

/// 優先順位: 深さ不足 > 過度な前傾(hard) > かかと浮き > 膝の前方移動
/// > 深すぎ > 低グレード(浅いとみなす) > 良好（問題なしの場合のみ）
pub fn evaluate(assessment: &FormAssessment) -> FeedbackKind {
    if assessment.has_issue(IssueKey::Depth) {
        FeedbackKind::TooShallow
    } else if assessment.penalty(IssueKey::TrunkLean) >= 1.0 {
        FeedbackKind::LeanTooFar
    } else if assessment.has_issue(IssueKey::HeelRise) {
        FeedbackKind::HeelsRising
    } else if assessment.has_issue(IssueKey::KneeForward) {
        FeedbackKind::KneesTooForward
    } else if assessment.has_issue(IssueKey::OverDepth) {
        FeedbackKind::TooDeep
    } else if assessment.scores.grade == Grade::Poor {
        FeedbackKind::TooShallow
    } else if assessment.penalties.is_empty() {
        FeedbackKind::GoodForm
    } else {
        FeedbackKind::Acceptable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoreConfig;
    use crate::scoring::form::{FormScorer, FormScores, ScoreContext};
    use crate::scoring::RepExtremes;

    fn assessment(penalties: Vec<(IssueKey, f32)>, grade: Grade) -> FormAssessment {
        FormAssessment {
            scores: FormScores {
                depth: 100,
                alignment: 100,
                posture: 100,
                stability: 100,
                overall: 100,
                grade,
            },
            feedback_keys: penalties.iter().take(2).map(|(k, _)| *k).collect(),
            penalties,
            side: None,
        }
    }

    #[test]
    fn test_depth_beats_everything() {
        let a = assessment(
            vec![(IssueKey::Depth, 0.1), (IssueKey::TrunkLean, 1.0), (IssueKey::HeelRise, 1.0)],
            Grade::Good,
        );
        assert_eq!(evaluate(&a), FeedbackKind::TooShallow);
    }

    #[test]
    fn test_only_hard_lean_counts() {
        let soft = assessment(vec![(IssueKey::TrunkLean, 0.6), (IssueKey::KneeForward, 0.2)], Grade::Good);
        assert_eq!(evaluate(&soft), FeedbackKind::KneesTooForward);

        let hard = assessment(vec![(IssueKey::TrunkLean, 1.0), (IssueKey::HeelRise, 0.5)], Grade::Good);
        assert_eq!(evaluate(&hard), FeedbackKind::LeanTooFar);
    }

    #[test]
    fn test_heel_rise_before_knee_forward() {
        let a = assessment(vec![(IssueKey::HeelRise, 0.2), (IssueKey::KneeForward, 0.9)], Grade::Good);
        assert_eq!(evaluate(&a), FeedbackKind::HeelsRising);
    }

    #[test]
    fn test_over_depth_is_too_deep() {
        let a = assessment(vec![(IssueKey::OverDepth, 1.0), (IssueKey::Stability, 1.0)], Grade::Poor);
        assert_eq!(evaluate(&a), FeedbackKind::TooDeep);

        let lean = assessment(vec![(IssueKey::OverDepth, 0.5), (IssueKey::TrunkLean, 1.0)], Grade::Fair);
        assert_eq!(evaluate(&lean), FeedbackKind::LeanTooFar);
    }

    #[test]
    fn test_scored_deep_rep_is_too_deep() {
        let extremes = RepExtremes {
            min_angle: Some(40.0),
            max_trunk_lean: Some(5.0),
            frames: 8,
            ..Default::default()
        };
        let a = FormScorer::new(ScoreConfig::squat()).score(&extremes, &ScoreContext::default());
        assert_eq!(evaluate(&a), FeedbackKind::TooDeep);
    }

    #[test]
    fn test_poor_grade_falls_back_to_shallow() {
        let a = assessment(vec![(IssueKey::Stability, 1.0), (IssueKey::KneeCollapse, 1.0)], Grade::Poor);
        assert_eq!(evaluate(&a), FeedbackKind::TooShallow);
    }

    #[test]
    fn test_good_form_needs_no_issues() {
        assert_eq!(evaluate(&assessment(Vec::new(), Grade::Excellent)), FeedbackKind::GoodForm);
        let minor = assessment(vec![(IssueKey::Stability, 0.3)], Grade::Excellent);
        assert_eq!(evaluate(&minor), FeedbackKind::Acceptable);
    }

    #[test]
    fn test_waiting_is_not_valid() {
        assert!(!FeedbackKind::Waiting.is_valid());
        assert!(FeedbackKind::Acceptable.is_valid());
    }
}
