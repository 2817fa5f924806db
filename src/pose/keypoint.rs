use serde::{Deserialize, Serialize};

/// 解析に使うランドマーク種別（鼻 + 左右の肩・腰・膝・足首）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkKind {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

/// 体の左右
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// 片脚の計測に使う (肩, 腰, 膝, 足首)
    pub fn joints(self) -> [LandmarkKind; 4] {
        use LandmarkKind::*;
        match self {
            Side::Left => [LeftShoulder, LeftHip, LeftKnee, LeftAnkle],
            Side::Right => [RightShoulder, RightHip, RightKnee, RightAnkle],
        }
    }
}

/// 単一ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub kind: LandmarkKind,
    /// 正規化されたX座標 (0.0〜1.0)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0)
    pub y: f32,
    /// 奥行き（検出器の出力をそのまま保持）
    #[serde(default)]
    pub z: f32,
    /// 信頼度スコア (0.0〜1.0)
    pub confidence: f32,
}

impl Landmark {
    pub fn new(kind: LandmarkKind, x: f32, y: f32, confidence: f32) -> Self {
        Self {
            kind,
            x,
            y,
            z: 0.0,
            confidence,
        }
    }

    /// 信頼度が閾値以上か
    pub fn is_valid(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }
}

/// 検出器から届く1フレーム分の入力
///
/// 同じアナライザに渡すフレームの `timestamp_ms` は単調非減少であること。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub landmarks: Vec<Landmark>,
    pub timestamp_ms: u64,
    /// 回転後の画像幅（ピクセル）
    pub width: u32,
    /// 回転後の画像高さ（ピクセル）
    pub height: u32,
    #[serde(default)]
    pub rotation_deg: i32,
    #[serde(default)]
    pub front_camera: bool,
    #[serde(default)]
    pub mirrored: bool,
}

impl Frame {
    pub fn new(landmarks: Vec<Landmark>, timestamp_ms: u64, width: u32, height: u32) -> Self {
        Self {
            landmarks,
            timestamp_ms,
            width,
            height,
            rotation_deg: 0,
            front_camera: false,
            mirrored: false,
        }
    }

    /// 種別でランドマークを取得（重複時は先頭）
    pub fn get(&self, kind: LandmarkKind) -> Option<&Landmark> {
        self.landmarks.iter().find(|l| l.kind == kind)
    }

    /// 閾値以上の信頼度を持つランドマークのみ取得
    pub fn get_valid(&self, kind: LandmarkKind, threshold: f32) -> Option<&Landmark> {
        self.get(kind).filter(|l| l.is_valid(threshold))
    }

    /// 縦横比補正用のスケール (x, y)
    ///
    /// 正規化座標に掛けると画素比に揃う。幅か高さが0なら (1, 1)。
    pub fn aspect_scale(&self) -> (f32, f32) {
        if self.width == 0 || self.height == 0 {
            return (1.0, 1.0);
        }
        (self.width as f32, self.height as f32)
    }

    /// ランドマークを縦横比補正済みの座標に変換
    pub fn scaled(&self, landmark: &Landmark) -> (f32, f32) {
        let (sx, sy) = self.aspect_scale();
        (landmark.x * sx, landmark.y * sy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_kind_names() {
        let kind: LandmarkKind = serde_json::from_str("\"right_shoulder\"").unwrap();
        assert_eq!(kind, LandmarkKind::RightShoulder);
        assert_eq!(serde_json::to_string(&LandmarkKind::Nose).unwrap(), "\"nose\"");
    }

    #[test]
    fn test_side_joints() {
        assert_eq!(Side::Left.joints()[2], LandmarkKind::LeftKnee);
        assert_eq!(Side::Right.joints()[3], LandmarkKind::RightAnkle);
    }

    #[test]
    fn test_landmark_is_valid() {
        let lm = Landmark::new(LandmarkKind::LeftKnee, 0.5, 0.5, 0.7);
        assert!(lm.is_valid(0.5));
        assert!(lm.is_valid(0.7));
        assert!(!lm.is_valid(0.8));
    }

    #[test]
    fn test_frame_get_valid() {
        let frame = Frame::new(
            vec![
                Landmark::new(LandmarkKind::LeftHip, 0.4, 0.5, 0.9),
                Landmark::new(LandmarkKind::RightHip, 0.6, 0.5, 0.2),
            ],
            0,
            640,
            480,
        );
        assert!(frame.get_valid(LandmarkKind::LeftHip, 0.5).is_some());
        assert!(frame.get_valid(LandmarkKind::RightHip, 0.5).is_none());
        assert!(frame.get(LandmarkKind::RightHip).is_some());
        assert!(frame.get(LandmarkKind::Nose).is_none());
    }

    #[test]
    fn test_scaled_uses_image_geometry() {
        let frame = Frame::new(Vec::new(), 0, 640, 480);
        let lm = Landmark::new(LandmarkKind::Nose, 0.5, 0.25, 1.0);
        assert_eq!(frame.scaled(&lm), (320.0, 120.0));

        let degenerate = Frame::new(Vec::new(), 0, 0, 480);
        assert_eq!(degenerate.scaled(&lm), (0.5, 0.25));
    }

    #[test]
    fn test_frame_deserialize_defaults() {
        let json = r#"{"landmarks":[{"kind":"left_knee","x":0.5,"y":0.6,"confidence":0.9}],
                       "timestamp_ms":33,"width":720,"height":1280}"#;
        let frame: Frame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.timestamp_ms, 33);
        assert!(!frame.mirrored);
        assert_eq!(frame.landmarks[0].kind, LandmarkKind::LeftKnee);
        assert_eq!(frame.landmarks[0].z, 0.0);
    }
}
