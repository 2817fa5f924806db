use serde::Serialize;

use crate::config::SideConfig;
use crate::pose::{Frame, Side};

/// 1フレーム分の左右選択結果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SideSelection {
    /// 確定した側（安定時間を満たすまでは None）
    pub selected: Option<Side>,
    /// 計測に使う側。未確定の間はこのフレームの候補で代用する
    pub side: Option<Side>,
    /// このフレームで信頼度が高い側
    pub candidate: Option<Side>,
    pub locked: bool,
    pub left_sum: f32,
    pub right_sum: f32,
}

/// 信頼度合計から計測に使う側を選ぶ
///
/// 候補が `stable_window_ms` の間変わらなければ確定する。確定前は候補を暫定的に
/// 使い、確定しないまま休止相を離れたらその時点の候補で確定する。休止相を離れると
/// 選択をロックし、休止相に戻って同じ時間留まるまでロックを解除しない。
pub struct SideSelector {
    min_confidence: f32,
    stable_window_ms: u64,
    candidate: Option<Side>,
    candidate_since: u64,
    selected: Option<Side>,
    locked: bool,
    rest_since: Option<u64>,
}

impl SideSelector {
    pub fn new(min_confidence: f32, stable_window_ms: u64) -> Self {
        Self {
            min_confidence,
            stable_window_ms,
            candidate: None,
            candidate_since: 0,
            selected: None,
            locked: false,
            rest_since: None,
        }
    }

    pub fn from_config(config: &SideConfig) -> Self {
        Self::new(config.min_confidence, config.stable_window_ms)
    }

    /// 肩・腰・膝・足首の信頼度合計。一つでも欠けるか閾値未満なら 0
    pub fn confidence_sum(&self, frame: &Frame, side: Side) -> f32 {
        let mut sum = 0.0;
        for kind in side.joints() {
            match frame.get_valid(kind, self.min_confidence) {
                Some(lm) => sum += lm.confidence,
                None => return 0.0,
            }
        }
        sum
    }

    /// `resting` はこのフレームを処理する前の状態機械が休止相にあるか
    pub fn update(&mut self, frame: &Frame, resting: bool) -> SideSelection {
        let now = frame.timestamp_ms;
        let left_sum = self.confidence_sum(frame, Side::Left);
        let right_sum = self.confidence_sum(frame, Side::Right);

        let candidate = if left_sum <= 0.0 && right_sum <= 0.0 {
            None
        } else if left_sum >= right_sum {
            Some(Side::Left)
        } else {
            Some(Side::Right)
        };

        if candidate != self.candidate {
            self.candidate = candidate;
            self.candidate_since = now;
        }

        if !resting {
            if self.selected.is_none() {
                self.selected = self.candidate;
            }
            if self.selected.is_some() {
                self.locked = true;
            }
            self.rest_since = None;
        } else if self.locked {
            let since = *self.rest_since.get_or_insert(now);
            if now.saturating_sub(since) >= self.stable_window_ms {
                self.locked = false;
                self.rest_since = None;
            }
        }

        if !self.locked {
            if let Some(side) = self.candidate {
                if now.saturating_sub(self.candidate_since) >= self.stable_window_ms {
                    self.selected = Some(side);
                }
            }
        }

        SideSelection {
            selected: self.selected,
            side: self.selected.or(candidate),
            candidate,
            locked: self.locked,
            left_sum,
            right_sum,
        }
    }

    pub fn reset(&mut self) {
        self.candidate = None;
        self.candidate_since = 0;
        self.selected = None;
        self.locked = false;
        self.rest_since = None;
    }
}
