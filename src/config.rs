use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub smoothing: SmoothConfig,
    #[serde(default)]
    pub side: SideConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub squat: SquatConfig,
    #[serde(default)]
    pub lunge: LungeConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmoothConfig {
    /// EMA係数 (0 < alpha < 1)。大きいほど追従が速い
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SideConfig {
    /// ランドマーク採用の最小信頼度
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    /// 候補が確定するまでの安定時間（ミリ秒）
    #[serde(default = "default_stable_window_ms")]
    pub stable_window_ms: u64,
    /// 前脚判定の多数決窓（フレーム数）
    #[serde(default = "default_lead_leg_window")]
    pub lead_leg_window: usize,
    /// 肩幅 / 胴長 がこれ以上ならカメラ正対とみなす
    #[serde(default = "default_facing_ratio")]
    pub facing_ratio: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalibrationConfig {
    /// 基準姿勢の確定に必要な安定フレーム数
    #[serde(default = "default_required_frames")]
    pub required_frames: u32,
}

/// 二相（UP/DOWN）カウンタの閾値
#[derive(Debug, Clone, Deserialize)]
pub struct SquatConfig {
    #[serde(default = "default_squat_down")]
    pub down_threshold: f32,
    #[serde(default = "default_squat_up")]
    pub up_threshold: f32,
    #[serde(default = "default_squat_frames")]
    pub down_frames: u32,
    #[serde(default = "default_squat_frames")]
    pub up_frames: u32,
}

/// 五相カウンタの閾値
#[derive(Debug, Clone, Deserialize)]
pub struct LungeConfig {
    #[serde(default = "default_lunge_descend")]
    pub descend_threshold: f32,
    #[serde(default = "default_lunge_bottom")]
    pub bottom_threshold: f32,
    #[serde(default = "default_lunge_ascend")]
    pub ascend_threshold: f32,
    #[serde(default = "default_lunge_standing")]
    pub standing_threshold: f32,
    #[serde(default = "default_lunge_hysteresis")]
    pub hysteresis_frames: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "ScoreConfig::squat")]
    pub squat: ScoreConfig,
    #[serde(default = "ScoreConfig::lunge")]
    pub lunge: ScoreConfig,
}

/// soft以下でペナルティ0、hard以上で1
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Band {
    pub soft: f32,
    pub hard: f32,
}

impl Band {
    pub const fn new(soft: f32, hard: f32) -> Self {
        Self { soft, hard }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Weights {
    pub depth: f32,
    pub alignment: f32,
    pub posture: f32,
    pub stability: f32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            depth: 0.4,
            alignment: 0.2,
            posture: 0.25,
            stability: 0.15,
        }
    }
}

/// 種目ごとのフォーム採点パラメータ
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreConfig {
    /// 最下点の膝角度の目標範囲（度）
    pub depth_min: f32,
    pub depth_max: f32,
    /// 目標範囲外でペナルティ1になる距離（度）
    pub depth_max_deviation: f32,
    pub trunk_lean: Band,
    pub heel_rise: Band,
    pub knee_forward: Band,
    pub knee_collapse: Band,
    pub stability: Band,
    #[serde(default)]
    pub weights: Weights,
    /// 総合スコアがこれ未満ならPoor判定
    #[serde(default = "default_poor_below")]
    pub poor_below: u8,
}

impl ScoreConfig {
    pub fn squat() -> Self {
        Self {
            depth_min: 50.0,
            depth_max: 90.0,
            depth_max_deviation: 40.0,
            trunk_lean: Band::new(35.0, 55.0),
            heel_rise: Band::new(0.03, 0.08),
            knee_forward: Band::new(0.15, 0.30),
            knee_collapse: Band::new(0.05, 0.15),
            stability: Band::new(0.015, 0.05),
            weights: Weights::default(),
            poor_below: default_poor_below(),
        }
    }

    pub fn lunge() -> Self {
        Self {
            depth_min: 70.0,
            depth_max: 105.0,
            depth_max_deviation: 35.0,
            trunk_lean: Band::new(20.0, 40.0),
            heel_rise: Band::new(0.05, 0.12),
            knee_forward: Band::new(0.18, 0.32),
            knee_collapse: Band::new(0.05, 0.15),
            stability: Band::new(0.02, 0.06),
            weights: Weights::default(),
            poor_below: default_poor_below(),
        }
    }
}

fn default_alpha() -> f32 { 0.7 }
fn default_min_confidence() -> f32 { 0.5 }
fn default_stable_window_ms() -> u64 { 200 }
fn default_lead_leg_window() -> usize { 5 }
fn default_facing_ratio() -> f32 { 0.5 }
fn default_required_frames() -> u32 { 15 }
fn default_squat_down() -> f32 { 100.0 }
fn default_squat_up() -> f32 { 160.0 }
fn default_squat_frames() -> u32 { 2 }
fn default_lunge_descend() -> f32 { 150.0 }
fn default_lunge_bottom() -> f32 { 105.0 }
fn default_lunge_ascend() -> f32 { 115.0 }
fn default_lunge_standing() -> f32 { 160.0 }
fn default_lunge_hysteresis() -> u32 { 2 }
fn default_poor_below() -> u8 { 50 }

impl Default for SmoothConfig {
    fn default() -> Self {
        Self { alpha: default_alpha() }
    }
}

impl Default for SideConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            stable_window_ms: default_stable_window_ms(),
            lead_leg_window: default_lead_leg_window(),
            facing_ratio: default_facing_ratio(),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            required_frames: default_required_frames(),
        }
    }
}

impl Default for SquatConfig {
    fn default() -> Self {
        Self {
            down_threshold: default_squat_down(),
            up_threshold: default_squat_up(),
            down_frames: default_squat_frames(),
            up_frames: default_squat_frames(),
        }
    }
}

impl Default for LungeConfig {
    fn default() -> Self {
        Self {
            descend_threshold: default_lunge_descend(),
            bottom_threshold: default_lunge_bottom(),
            ascend_threshold: default_lunge_ascend(),
            standing_threshold: default_lunge_standing(),
            hysteresis_frames: default_lunge_hysteresis(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            squat: ScoreConfig::squat(),
            lunge: ScoreConfig::lunge(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// ファイルが無ければデフォルト設定を返す。壊れた設定はエラーにする
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("{} not found; using default config", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<()> {
        let alpha = self.smoothing.alpha;
        if !(alpha > 0.0 && alpha < 1.0) {
            bail!("smoothing.alpha must be in (0, 1), got {}", alpha);
        }
        if !(0.0..=1.0).contains(&self.side.min_confidence) {
            bail!("side.min_confidence must be in [0, 1], got {}", self.side.min_confidence);
        }
        if self.side.lead_leg_window == 0 {
            bail!("side.lead_leg_window must be at least 1");
        }
        if self.calibration.required_frames == 0 {
            bail!("calibration.required_frames must be at least 1");
        }

        let sq = &self.squat;
        if sq.down_threshold >= sq.up_threshold {
            bail!(
                "squat.down_threshold ({}) must be below squat.up_threshold ({})",
                sq.down_threshold,
                sq.up_threshold
            );
        }
        if sq.down_frames == 0 || sq.up_frames == 0 {
            bail!("squat hysteresis frame counts must be at least 1");
        }

        let lu = &self.lunge;
        if !(lu.bottom_threshold < lu.ascend_threshold
            && lu.ascend_threshold <= lu.descend_threshold
            && lu.descend_threshold < lu.standing_threshold)
        {
            bail!(
                "lunge thresholds must satisfy bottom < ascend <= descend < standing, got {} / {} / {} / {}",
                lu.bottom_threshold,
                lu.ascend_threshold,
                lu.descend_threshold,
                lu.standing_threshold
            );
        }
        if lu.hysteresis_frames == 0 {
            bail!("lunge.hysteresis_frames must be at least 1");
        }

        self.scoring.squat.validate("scoring.squat")?;
        self.scoring.lunge.validate("scoring.lunge")?;
        Ok(())
    }
}

impl ScoreConfig {
    fn validate(&self, section: &str) -> Result<()> {
        if self.depth_min > self.depth_max {
            bail!("{}: depth_min must not exceed depth_max", section);
        }
        if self.depth_max_deviation <= 0.0 {
            bail!("{}: depth_max_deviation must be positive", section);
        }
        let bands = [
            ("trunk_lean", self.trunk_lean),
            ("heel_rise", self.heel_rise),
            ("knee_forward", self.knee_forward),
            ("knee_collapse", self.knee_collapse),
            ("stability", self.stability),
        ];
        for (name, band) in bands {
            if band.soft >= band.hard {
                bail!("{}.{}: soft ({}) must be below hard ({})", section, name, band.soft, band.hard);
            }
        }
        let w = self.weights;
        let total = w.depth + w.alignment + w.posture + w.stability;
        if total <= 0.0 || [w.depth, w.alignment, w.posture, w.stability].iter().any(|v| *v < 0.0) {
            bail!("{}.weights must be non-negative with a positive sum", section);
        }
        Ok(())
    }
}
