use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use tokio::process::Command;
use uuid::Uuid;

use crate::clients::{preview, watch_url, ClientError};

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedAudio {
    pub path: PathBuf,
    pub duration_seconds: Option<f64>,
}

#[async_trait]
pub trait AudioDownloader: Send + Sync {
    /// Downloads the best available audio stream to a fresh local file.
    /// The caller owns the file and must remove it.
    async fn download(
        &self,
        video_id: &str,
        cookie_file: Option<&Path>,
    ) -> Result<DownloadedAudio, ClientError>;
}

pub struct YtDlpAudioDownloader {
    ytdlp_path: String,
    output_dir: PathBuf,
    timeout: Duration,
}

impl YtDlpAudioDownloader {
    pub fn new(ytdlp_path: impl Into<String>, output_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            output_dir,
            timeout,
        }
    }

    /// File name prefix shared by everything one download attempt writes.
    fn attempt_prefix(video_id: &str) -> String {
        format!("{}-{}.", video_id, Uuid::new_v4())
    }
}

/// Deletes every file written under one attempt prefix unless the download
/// completed. yt-dlp leaves partial and intermediate files behind when it
/// fails or is killed.
struct PartialDownload {
    dir: PathBuf,
    prefix: String,
    completed: bool,
}

impl PartialDownload {
    fn new(dir: &Path, prefix: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
            completed: false,
        }
    }

    fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for PartialDownload {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            if !entry.file_name().to_string_lossy().starts_with(&self.prefix) {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(()) => log::debug!("Removed partial download {}", entry.path().display()),
                Err(e) => log::warn!(
                    "Failed to remove partial download {}: {}",
                    entry.path().display(),
                    e
                ),
            }
        }
    }
}

#[async_trait]
impl AudioDownloader for YtDlpAudioDownloader {
    async fn download(
        &self,
        video_id: &str,
        cookie_file: Option<&Path>,
    ) -> Result<DownloadedAudio, ClientError> {
        let prefix = Self::attempt_prefix(video_id);
        let guard = PartialDownload::new(&self.output_dir, &prefix);

        let mut command = Command::new(&self.ytdlp_path);
        command
            .args(["-f", "bestaudio/best", "-x", "--audio-format", "mp3"])
            // Mono 16 kHz speech keeps long lectures under transcription upload limits.
            .args(["--postprocessor-args", "ExtractAudio:-ac 1 -ar 16000 -b:a 32k"])
            .args(["--no-playlist", "--no-warnings", "--no-simulate"])
            .args(["--print", "duration", "--print", "after_move:filepath"])
            .args(["--extractor-args", "youtube:player_client=android,web"])
            .arg("-o")
            .arg(self.output_dir.join(format!("{}%(ext)s", prefix)));

        match cookie_file {
            Some(path) if path.exists() => {
                command.arg("--cookies").arg(path);
            }
            Some(path) => {
                log::debug!("Cookie file {} not found, downloading without it", path.display());
            }
            None => {}
        }

        command.arg(watch_url(video_id)).kill_on_drop(true);

        log::info!("Downloading audio for {}", video_id);
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(stderr.trim()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let audio = parse_download_output(&stdout).ok_or_else(|| {
            ClientError::Parse(format!("yt-dlp printed no file path: {}", preview(&stdout, 200)))
        })?;

        if !audio.path.exists() {
            return Err(ClientError::NotFound(format!(
                "downloaded audio missing at {}",
                audio.path.display()
            )));
        }
        guard.complete();
        Ok(audio)
    }
}

/// yt-dlp prints the duration first and the final file path last.
fn parse_download_output(stdout: &str) -> Option<DownloadedAudio> {
    let lines: Vec<&str> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let path = lines.last()?;
    let duration_seconds = if lines.len() >= 2 {
        lines[0].parse::<f64>().ok()
    } else {
        None
    };

    Some(DownloadedAudio {
        path: PathBuf::from(path),
        duration_seconds,
    })
}

fn classify_failure(stderr: &str) -> ClientError {
    let message = preview(stderr, 300);
    if stderr.contains("Private video")
        || stderr.contains("Sign in")
        || stderr.contains("Video unavailable")
    {
        ClientError::Unavailable(message)
    } else {
        ClientError::NotFound(message)
    }
}
