//! 合成セッション生成ツール
//!
//! スクワット / ランジの骨格ランドマーク列を JSONL で書き出す。
//! 再生CLI (`rep-tracker`) の動作確認とデモ用。

use std::f32::consts::PI;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use rep_tracker::analyzer::ExerciseKind;
use rep_tracker::pose::{Frame, Landmark, LandmarkKind, Side};
use rep_tracker::protocol;

const STANDING_ANGLE: f32 = 172.0;
const THIGH_PX: f32 = 250.0;
const TORSO_PX: f32 = 350.0;

#[derive(Parser, Debug)]
#[command(name = "synth_session", about = "合成ランドマークセッションを生成")]
struct Args {
    /// 種目 (squat / lunge)
    #[arg(short, long, default_value = "squat")]
    exercise: ExerciseKind,

    /// レップ数
    #[arg(short, long, default_value_t = 5)]
    reps: u32,

    /// フレームレート
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// 最下点の膝角度（度）
    #[arg(short, long, default_value_t = 85.0)]
    depth: f32,

    /// 1レップの秒数
    #[arg(long, default_value_t = 2.0)]
    rep_secs: f32,

    /// 揺らぎの位相を決めるシード
    #[arg(long, default_value_t = 1)]
    seed: u32,

    /// 揺らぎの振幅（度）
    #[arg(long, default_value_t = 1.5)]
    jitter: f32,

    #[arg(long, default_value_t = 720)]
    width: u32,

    #[arg(long, default_value_t = 1280)]
    height: u32,

    /// 出力先。省略時は標準出力
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// 乱数を使わない決定的な揺らぎ
struct Jitter {
    phase: f32,
    amplitude: f32,
}

impl Jitter {
    fn new(seed: u32, amplitude: f32) -> Self {
        Self {
            phase: (seed as f32 * 1.618_034).fract() * 2.0 * PI,
            amplitude,
        }
    }

    fn at(&self, t: f32, channel: f32) -> f32 {
        let a = (t * 7.3 + self.phase + channel * 1.7).sin();
        let b = (t * 13.1 + self.phase * 2.0 + channel * 0.9).sin();
        self.amplitude * (0.6 * a + 0.4 * b)
    }
}

struct Synth {
    width: f32,
    height: f32,
}

impl Synth {
    fn landmark(&self, kind: LandmarkKind, (x, y): (f32, f32), confidence: f32) -> Landmark {
        Landmark::new(kind, x / self.width, y / self.height, confidence)
    }

    /// 側面スクワット: 足首と膝を固定し太腿を回転、上体は屈曲に応じて前傾
    fn squat(&self, knee_deg: f32, lean_deg: f32) -> Vec<Landmark> {
        let rad = knee_deg.to_radians();
        let knee = (self.width * 0.5, self.height * 0.66);
        let ankle = (knee.0, knee.1 + THIGH_PX);
        let hip = (knee.0 - THIGH_PX * rad.sin(), knee.1 + THIGH_PX * rad.cos());
        let lean = lean_deg.to_radians();
        let shoulder = (hip.0 + TORSO_PX * lean.sin(), hip.1 - TORSO_PX * lean.cos());

        let mut landmarks = Vec::with_capacity(8);
        let [s, h, k, a] = Side::Left.joints();
        landmarks.extend([
            self.landmark(s, shoulder, 0.92),
            self.landmark(h, hip, 0.9),
            self.landmark(k, knee, 0.93),
            self.landmark(a, ankle, 0.88),
        ]);
        // 奥側の脚は隠れて信頼度が低い
        let [s, h, k, a] = Side::Right.joints();
        landmarks.extend([
            self.landmark(s, (shoulder.0 + 6.0, shoulder.1), 0.35),
            self.landmark(h, (hip.0 + 6.0, hip.1), 0.3),
            self.landmark(k, (knee.0 + 6.0, knee.1), 0.3),
            self.landmark(a, (ankle.0 + 6.0, ankle.1), 0.25),
        ]);
        landmarks
    }

    /// 斜め前からのランジ: 足首・腰のxは固定、膝が前に出て屈曲する
    fn lunge_leg(&self, side: Side, ankle_x: f32, knee_deg: f32, lean_deg: f32) -> [Landmark; 4] {
        let half = (knee_deg / 2.0).to_radians();
        let ankle = (ankle_x, self.height * 0.86);
        let knee = (ankle_x + THIGH_PX * half.cos(), ankle.1 - THIGH_PX * half.sin());
        let hip = (ankle_x, ankle.1 - 2.0 * THIGH_PX * half.sin());
        let lean = lean_deg.to_radians();
        let shoulder = (hip.0 + TORSO_PX * lean.sin(), hip.1 - TORSO_PX * lean.cos());
        let [s, h, k, a] = side.joints();
        [
            self.landmark(s, shoulder, 0.9),
            self.landmark(h, hip, 0.9),
            self.landmark(k, knee, 0.9),
            self.landmark(a, ankle, 0.9),
        ]
    }

    fn lunge(&self, lead_deg: f32, lean_deg: f32) -> Vec<Landmark> {
        let back_deg = (lead_deg + 20.0).min(178.0);
        let mut landmarks = Vec::with_capacity(8);
        landmarks.extend(self.lunge_leg(Side::Left, self.width * 0.42, back_deg, lean_deg));
        landmarks.extend(self.lunge_leg(Side::Right, self.width * 0.58, lead_deg, lean_deg));
        landmarks
    }
}

/// 立位 → 最下点 → 立位 を余弦で補間した膝角度
fn knee_profile(t: f32, lead_in: f32, rep_secs: f32, reps: u32, depth: f32) -> f32 {
    let t = t - lead_in;
    if t < 0.0 || t >= rep_secs * reps as f32 {
        return STANDING_ANGLE;
    }
    let phase = (t % rep_secs) / rep_secs;
    let flex = (1.0 - (2.0 * PI * phase).cos()) / 2.0;
    STANDING_ANGLE - (STANDING_ANGLE - depth) * flex
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.fps == 0 {
        bail!("fps must be positive");
    }
    if !(20.0..STANDING_ANGLE).contains(&args.depth) {
        bail!("depth must be within 20..{}", STANDING_ANGLE);
    }
    if args.rep_secs <= 0.0 {
        bail!("rep_secs must be positive");
    }

    let synth = Synth {
        width: args.width as f32,
        height: args.height as f32,
    };
    let jitter = Jitter::new(args.seed, args.jitter);
    // 基準姿勢の取得に十分な立位時間を前後に置く
    let lead_in = 1.5;
    let total = lead_in * 2.0 + args.rep_secs * args.reps as f32;
    let frame_count = (total * args.fps as f32).ceil() as u64;
    let frame_ms = 1000.0 / args.fps as f32;

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path).with_context(|| format!("failed to create {}", path.display()))?),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(writer);

    for i in 0..frame_count {
        let t = i as f32 / args.fps as f32;
        let knee = knee_profile(t, lead_in, args.rep_secs, args.reps, args.depth) + jitter.at(t, 0.0);
        let knee = knee.clamp(10.0, 179.5);
        let flexion = (STANDING_ANGLE - knee).max(0.0) / (STANDING_ANGLE - args.depth);
        let landmarks = match args.exercise {
            ExerciseKind::Squat => synth.squat(knee, 25.0 * flexion + jitter.at(t, 1.0)),
            ExerciseKind::Lunge => synth.lunge(knee, 5.0 * flexion + jitter.at(t, 1.0)),
        };
        let timestamp_ms = (i as f32 * frame_ms).round() as u64;
        protocol::write_frame(&mut out, &Frame::new(landmarks, timestamp_ms, args.width, args.height))?;
    }
    out.flush()?;

    eprintln!(
        "{} frames ({} x{} reps, {}fps, depth {:.0}°)",
        frame_count, args.exercise, args.reps, args.fps, args.depth
    );
    Ok(())
}
