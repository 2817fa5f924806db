use crate::config::SmoothConfig;

/// スカラー信号1本分のEMA平滑化フィルタ
///
/// 最初のサンプルはそのまま採用し、サンプルが無いフレームでは直前の値を保持する。
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f32,
    value: Option<f32>,
}

impl Ema {
    pub fn new(alpha: f32) -> Self {
        Self { alpha, value: None }
    }

    pub fn from_config(config: &SmoothConfig) -> Self {
        Self::new(config.alpha)
    }

    /// 新しいサンプルで更新し、平滑化後の値を返す
    pub fn update(&mut self, raw: Option<f32>) -> Option<f32> {
        let raw = match raw {
            Some(raw) => raw,
            None => return self.value,
        };
        let next = match self.value {
            Some(prev) => self.alpha * raw + (1.0 - self.alpha) * prev,
            None => raw,
        };
        self.value = Some(next);
        self.value
    }

    pub fn current(&self) -> Option<f32> {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}
