use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use rep_tracker::analyzer::{Analyzer, ExerciseAnalyzer, ExerciseKind, RepSummary, SkipReason, SummaryKind};
use rep_tracker::config::Config;
use rep_tracker::protocol;

/// 記録済みのランドマーク列(JSONL)を再生してレップ数とフォームを解析する
#[derive(Parser, Debug)]
#[command(name = "rep-tracker", version = env!("GIT_VERSION"))]
struct Args {
    /// 種目 (squat / lunge)
    #[arg(short, long, default_value = "squat")]
    exercise: ExerciseKind,

    /// 設定ファイル。無ければデフォルト値
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// 結果を出力せずサマリーだけ表示する
    #[arg(short, long)]
    quiet: bool,

    /// セッションファイル (1行1フレームのJSON)。`-` で標準入力
    session: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "rep_tracker=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load_or_default(&args.config)?;

    info!("rep-tracker {} ({})", env!("GIT_VERSION"), args.exercise);

    let frames = if args.session.as_os_str() == "-" {
        protocol::read_frames(io::stdin().lock())?
    } else {
        let file = File::open(&args.session).with_context(|| format!("failed to open {}", args.session.display()))?;
        protocol::read_frames(BufReader::new(file))?
    };
    info!("{} frames loaded", frames.len());

    let mut analyzer = Analyzer::new(args.exercise, &config);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let mut reps: Vec<RepSummary> = Vec::new();
    let mut low_confidence = 0usize;
    let mut out_of_order = 0usize;
    for frame in &frames {
        let result = analyzer.process_frame(frame);
        match result.skip_reason {
            Some(SkipReason::LowConfidence) => low_confidence += 1,
            Some(SkipReason::OutOfOrder) => out_of_order += 1,
            None => {}
        }
        if !args.quiet {
            protocol::write_result(&mut out, &result)?;
        }
        if let Some(summary) = result.rep_summary {
            if summary.kind == SummaryKind::RepComplete {
                reps.push(summary);
            }
        }
    }
    out.flush()?;

    print_summary(&analyzer, &reps, frames.len(), (low_confidence, out_of_order));
    Ok(())
}

fn print_summary(analyzer: &Analyzer, reps: &[RepSummary], frames: usize, skipped: (usize, usize)) {
    eprintln!();
    eprintln!("=== {} ===", analyzer.kind());
    eprintln!(
        "フレーム: {} (スキップ: 低信頼度 {} / 時刻逆行 {})",
        frames, skipped.0, skipped.1
    );
    eprintln!("キャリブレーション: {}", if analyzer.is_calibrated() { "完了" } else { "未完了" });
    eprintln!("レップ数: {}", analyzer.rep_count());
    for rep in reps {
        let min_angle = rep
            .extremes
            .min_angle
            .map_or_else(|| "-".to_string(), |a| format!("{:.1}°", a));
        eprintln!(
            "  #{:<3} {:>3}点 {:?} 最小角度={} {:?} {:?}",
            rep.rep_index, rep.scores.overall, rep.scores.grade, min_angle, rep.classification, rep.issues
        );
    }
    if !reps.is_empty() {
        let mean = reps.iter().map(|r| r.scores.overall as f32).sum::<f32>() / reps.len() as f32;
        eprintln!("平均スコア: {:.1}", mean);
    }
}
