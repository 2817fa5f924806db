/// Welford's online mean / variance.
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f32) {
        let value = value as f64;
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn mean(&self) -> f32 {
        self.mean as f32
    }

    /// Sample standard deviation; 0 until two samples exist.
    pub fn stddev(&self) -> f32 {
        if self.count > 1 {
            (self.m2 / (self.count - 1) as f64).sqrt() as f32
        } else {
            0.0
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_constant_has_zero_stddev() {
        let mut stats = RunningStats::new();
        for _ in 0..20 {
            stats.push(0.42);
        }
        assert_eq!(stats.count(), 20);
        assert_abs_diff_eq!(stats.mean(), 0.42, epsilon = 1e-6);
        assert_abs_diff_eq!(stats.stddev(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_known_sample_stddev() {
        // 2,4,4,4,5,5,7,9: mean 5, sum of squared deviations 32, sample var 32/7
        let mut stats = RunningStats::new();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            stats.push(v);
        }
        assert_abs_diff_eq!(stats.mean(), 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(stats.stddev(), (32.0f32 / 7.0).sqrt(), epsilon = 1e-5);
    }

    #[test]
    fn test_single_sample() {
        let mut stats = RunningStats::new();
        assert_eq!(stats.stddev(), 0.0);
        stats.push(3.0);
        assert_eq!(stats.stddev(), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut stats = RunningStats::new();
        stats.push(1.0);
        stats.push(5.0);
        stats.reset();
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.stddev(), 0.0);
    }
}
