//! JSON-lines session format: one [`Frame`] per input line, one
//! [`AnalysisResult`] per output line.
//!
//! Blank lines are ignored on input so recorded sessions can be edited by hand.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analyzer::AnalysisResult;
use crate::pose::Frame;

/// Parse a whole session. Errors name the 1-based line that failed.
pub fn read_frames<R: BufRead>(reader: R) -> Result<Vec<Frame>> {
    let mut frames = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("failed to read line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: Frame =
            serde_json::from_str(&line).with_context(|| format!("invalid frame on line {}", line_no))?;
        frames.push(frame);
    }
    Ok(frames)
}

/// Write any serializable record as a single JSON line.
pub fn write_line<W: Write, T: Serialize>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}

pub fn write_frame<W: Write>(writer: W, frame: &Frame) -> Result<()> {
    write_line(writer, frame)
}

pub fn write_result<W: Write>(writer: W, result: &AnalysisResult) -> Result<()> {
    write_line(writer, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Analyzer, ExerciseAnalyzer, ExerciseKind};
    use crate::config::Config;
    use crate::pose::{Landmark, LandmarkKind};

    #[test]
    fn test_read_skips_blank_lines() {
        let input = concat!(
            r#"{"landmarks":[{"kind":"left_knee","x":0.5,"y":0.6,"confidence":0.9}],"timestamp_ms":0,"width":640,"height":480}"#,
            "\n\n   \n",
            r#"{"landmarks":[],"timestamp_ms":33,"width":640,"height":480,"rotation_deg":90,"mirrored":true}"#,
            "\n",
        );
        let frames = read_frames(input.as_bytes()).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].landmarks[0].kind, LandmarkKind::LeftKnee);
        assert_eq!(frames[0].landmarks[0].z, 0.0);
        assert_eq!(frames[1].timestamp_ms, 33);
        assert_eq!(frames[1].rotation_deg, 90);
        assert!(frames[1].mirrored);
        assert!(!frames[1].front_camera);
    }

    #[test]
    fn test_error_names_line() {
        let input = "\n{\"landmarks\":[],\"timestamp_ms\":0,\"width\":1,\"height\":1}\n{not json}\n";
        let err = read_frames(input.as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"));
    }

    #[test]
    fn test_unknown_landmark_rejected() {
        let input = r#"{"landmarks":[{"kind":"left_elbow","x":0,"y":0,"confidence":1}],"timestamp_ms":0,"width":1,"height":1}"#;
        assert!(read_frames(input.as_bytes()).is_err());
    }

    #[test]
    fn test_written_frames_read_back() {
        let frame = Frame::new(vec![Landmark::new(LandmarkKind::RightHip, 0.25, 0.5, 0.8)], 1234, 720, 1280);
        let mut buf = Vec::new();
        write_frame(&mut buf, &frame).unwrap();
        write_frame(&mut buf, &frame).unwrap();
        assert_eq!(buf.iter().filter(|b| **b == b'\n').count(), 2);
        assert_eq!(read_frames(buf.as_slice()).unwrap(), vec![frame.clone(), frame]);
    }

    #[test]
    fn test_result_line_shape() {
        let mut analyzer = Analyzer::new(ExerciseKind::Squat, &Config::default());
        let result = analyzer.process_frame(&Frame::new(Vec::new(), 0, 640, 480));
        let mut buf = Vec::new();
        write_result(&mut buf, &result).unwrap();

        let line = String::from_utf8(buf).unwrap();
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["skipped_low_confidence"], true);
        assert_eq!(value["skip_reason"], "low_confidence");
        assert_eq!(value["phase"], "up");
        assert_eq!(value["feedback"]["classification"], "waiting");
        assert_eq!(value["rep_count"]["value"], 0);
        assert!(value["rep_summary"].is_null());
    }
}
