//! Per-frame orchestration: one analyzer per exercise, all producing
//! [`AnalysisResult`]s.

pub mod lunge;
pub mod result;
mod review;
pub mod squat;

pub use lunge::LungeAnalyzer;
pub use result::{AnalysisResult, Feedback, FrameMetrics, RepCount, RepSummary, SkipReason, SummaryKind};
pub use squat::SquatAnalyzer;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::pose::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Squat,
    Lunge,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 2] = [ExerciseKind::Squat, ExerciseKind::Lunge];

    pub fn name(self) -> &'static str {
        match self {
            ExerciseKind::Squat => "squat",
            ExerciseKind::Lunge => "lunge",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExerciseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExerciseKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown exercise '{}' (expected squat or lunge)", s))
    }
}

/// 1フレームずつ呼ばれる種目別の解析器
///
/// フレームは時刻順に渡すこと。古い時刻のフレームは状態を変えずにスキップされる。
pub trait ExerciseAnalyzer {
    fn kind(&self) -> ExerciseKind;

    /// 必ず1フレームにつき1つの結果を返す
    fn process_frame(&mut self, frame: &Frame) -> AnalysisResult;

    fn rep_count(&self) -> u32;

    /// セッションを破棄して初期状態に戻す（基準姿勢も取り直す）
    fn reset(&mut self);
}

/// 種目ごとの解析器をまとめたもの
pub enum Analyzer {
    Squat(SquatAnalyzer),
    Lunge(LungeAnalyzer),
}

impl Analyzer {
    pub fn new(kind: ExerciseKind, config: &Config) -> Self {
        match kind {
            ExerciseKind::Squat => Analyzer::Squat(SquatAnalyzer::new(config)),
            ExerciseKind::Lunge => Analyzer::Lunge(LungeAnalyzer::new(config)),
        }
    }

    fn inner(&self) -> &dyn ExerciseAnalyzer {
        match self {
            Analyzer::Squat(a) => a,
            Analyzer::Lunge(a) => a,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ExerciseAnalyzer {
        match self {
            Analyzer::Squat(a) => a,
            Analyzer::Lunge(a) => a,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        match self {
            Analyzer::Squat(a) => a.is_calibrated(),
            Analyzer::Lunge(a) => a.is_calibrated(),
        }
    }
}

impl ExerciseAnalyzer for Analyzer {
    fn kind(&self) -> ExerciseKind {
        self.inner().kind()
    }

    fn process_frame(&mut self, frame: &Frame) -> AnalysisResult {
        self.inner_mut().process_frame(frame)
    }

    fn rep_count(&self) -> u32 {
        self.inner().rep_count()
    }

    fn reset(&mut self) {
        self.inner_mut().reset()
    }
}
