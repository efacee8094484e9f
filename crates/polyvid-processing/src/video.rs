//! Video technical-metadata extraction via ffprobe.
//!
//! Metadata is advisory: extraction failures never fail an upload, they
//! produce zeroed values (the file size is still taken from the filesystem).

use anyhow::{anyhow, Context, Result};
use polyvid_core::models::VideoTechMetadata;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Reject paths that could smuggle shell metacharacters into the probe call.
fn validate_path(path: &str) -> Result<()> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(anyhow!("Path contains dangerous characters: {}", path));
    }
    if path.contains("..") {
        return Err(anyhow!("Path contains directory traversal: {}", path));
    }
    Ok(())
}

/// ffprobe-backed metadata extractor.
#[derive(Debug, Clone)]
pub struct VideoProbe {
    ffprobe_path: String,
}

impl VideoProbe {
    pub fn new(ffprobe_path: String) -> Self {
        Self { ffprobe_path }
    }

    /// Probe a video file; errors on any probe or parse failure.
    pub async fn probe(&self, video_path: &Path) -> Result<VideoTechMetadata> {
        let path_str = video_path.to_string_lossy();
        validate_path(&path_str).context("Invalid video path")?;

        let file_size = tokio::fs::metadata(video_path)
            .await
            .map(|m| m.len() as i64)
            .unwrap_or(0);

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(video_path)
            .stdin(Stdio::null())
            .output()
            .await
            .context("Failed to execute ffprobe")?;

        if !output.status.success() {
            return Err(anyhow!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        let probe_data: serde_json::Value =
            serde_json::from_slice(&output.stdout).context("Failed to parse ffprobe output")?;

        let stream = probe_data["streams"]
            .get(0)
            .ok_or_else(|| anyhow!("No video stream found"))?;

        let duration_seconds = probe_data["format"]["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0)
            .max(0.0) as u64;

        let width = stream["width"].as_u64().unwrap_or(0) as u32;
        let height = stream["height"].as_u64().unwrap_or(0) as u32;
        let fps = stream["r_frame_rate"]
            .as_str()
            .and_then(parse_frame_rate)
            .unwrap_or(0.0);

        Ok(VideoTechMetadata {
            duration_seconds,
            duration_string: VideoTechMetadata::format_duration(duration_seconds),
            width,
            height,
            fps,
            file_size,
        })
    }

    /// Probe with graceful degradation: on failure the result is zeroed,
    /// keeping only the filesystem size.
    pub async fn probe_or_default(&self, video_path: &Path) -> VideoTechMetadata {
        match self.probe(video_path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(
                    path = %video_path.display(),
                    error = %e,
                    "Video metadata extraction failed, using zeroed metadata"
                );
                let file_size = tokio::fs::metadata(video_path)
                    .await
                    .map(|m| m.len() as i64)
                    .unwrap_or(0);
                VideoTechMetadata::zeroed(file_size)
            }
        }
    }
}

/// Parse an ffprobe rational frame rate like `30000/1001`.
fn parse_frame_rate(raw: &str) -> Option<f32> {
    match raw.split_once('/') {
        Some((num, den)) => {
            let num: f32 = num.parse().ok()?;
            let den: f32 = den.parse().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => raw.parse().ok(),
    }
}
