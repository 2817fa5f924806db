use std::collections::VecDeque;

use crate::pose::Side;

/// 膝角度が小さい側（曲がっている前脚）を多数決で安定化して選ぶ
pub struct LeadLegSelector {
    window: usize,
    picks: VecDeque<Side>,
    stable: Option<Side>,
    locked: bool,
}

impl LeadLegSelector {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            picks: VecDeque::with_capacity(window),
            stable: None,
            locked: false,
        }
    }

    /// 左右の膝角度から今フレームの前脚を更新する
    ///
    /// ロック中も投票は記録するが、出力はロック時の脚のまま。
    pub fn update(&mut self, left_knee: f32, right_knee: f32) -> Side {
        let raw = if left_knee <= right_knee {
            Side::Left
        } else {
            Side::Right
        };
        if self.picks.len() == self.window {
            self.picks.pop_front();
        }
        self.picks.push_back(raw);

        if self.locked {
            if let Some(stable) = self.stable {
                return stable;
            }
        }

        let left = self.picks.iter().filter(|s| **s == Side::Left).count();
        let right = self.picks.len() - left;
        let voted = if left > right {
            Side::Left
        } else if right > left {
            Side::Right
        } else {
            self.stable.unwrap_or(raw)
        };
        self.stable = Some(voted);
        voted
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn reset(&mut self) {
        self.picks.clear();
        self.stable = None;
        self.locked = false;
    }
}
