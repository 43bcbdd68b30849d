use crate::configuration::Configuration;
use crate::playlist::media::{DEFAULT_ASPECT_RATIO, MediaDisplay, MediaEntry, MediaSource, UNKNOWN_LENGTH_IN_SECONDS};
use crate::resolver::backend::{BackendError, MediaBackend};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};
use url::Url;

/// One external metadata call per second, shared across all references, so a
/// burst of adds doesn't hammer the hosting site.
const QUOTA: Quota = Quota::per_second(nonzero!(1u32));

/// The output template making yt-dlp print exactly the metadata fields we use.
const METADATA_OUTPUT_TEMPLATE: &str = "%(.{title,channel,duration,width,height})#j";

/// Media resolution backed by the `yt-dlp` and `ffprobe` commandline tools.
pub struct YtDlpBackend {
	ytdlp_command: String,
	ffprobe_command: String,
	tool_timeout: Duration,
	limiter: DefaultDirectRateLimiter,
}

#[derive(Debug, Default, Deserialize)]
struct VideoMetadata {
	#[serde(default)]
	title: Option<String>,
	#[serde(default)]
	channel: Option<String>,
	#[serde(default)]
	duration: Option<f64>,
	#[serde(default)]
	width: Option<u32>,
	#[serde(default)]
	height: Option<u32>,
}

impl YtDlpBackend {
	pub fn new(configuration: &Configuration) -> Self {
		Self {
			ytdlp_command: configuration.resolver_command.clone(),
			ffprobe_command: configuration.probe_command.clone(),
			tool_timeout: configuration.resolver_timeout,
			limiter: RateLimiter::direct(QUOTA),
		}
	}

	async fn run_tool(&self, command: &str, arguments: &[&str]) -> Result<String, BackendError> {
		debug!("Running '{command}' with arguments {arguments:?}");
		let output = tokio::time::timeout(
			self.tool_timeout,
			Command::new(command).args(arguments).kill_on_drop(true).output(),
		)
		.await
		.map_err(|_elapsed| BackendError::Timeout)?
		.map_err(|error| BackendError::Failed(format!("Failed to run '{command}': {error}")))?;

		if !output.status.success() {
			return Err(BackendError::Failed(format!("'{command}' exited with {}", output.status)));
		}

		String::from_utf8(output.stdout)
			.map_err(|error| BackendError::Failed(format!("'{command}' produced invalid UTF-8: {error}")))
	}

	async fn first_search_result(&self, query: &str) -> Result<String, BackendError> {
		let search_term = format!("ytsearch1:{query}");
		let stdout = self.run_tool(&self.ytdlp_command, &[search_term.as_str(), "--get-id"]).await?;
		let id = stdout.trim();
		if id.is_empty() {
			return Err(BackendError::Failed(format!("No search result for '{query}'")));
		}
		Ok(id.to_string())
	}

	async fn fetch_video_metadata(&self, video_id: &str) -> Result<VideoMetadata, BackendError> {
		let video_url = format!("https://www.youtube.com/watch?v={video_id}");
		let stdout = self
			.run_tool(&self.ytdlp_command, &[video_url.as_str(), "-O", METADATA_OUTPUT_TEMPLATE])
			.await?;
		serde_json::from_str(&stdout)
			.map_err(|error| BackendError::Failed(format!("Unparsable video metadata: {error}")))
	}
}

#[async_trait]
impl MediaBackend for YtDlpBackend {
	async fn resolve_video(&self, video_id: &str) -> Result<MediaEntry, BackendError> {
		let mut video_id = video_id.to_string();
		if let Some(query) = video_id.strip_prefix("search:") {
			let query = query.trim().to_string();
			self.limiter.until_ready().await;
			video_id = self.first_search_result(&query).await?;
		}

		self.limiter.until_ready().await;
		let metadata = self.fetch_video_metadata(&video_id).await?;
		Ok(entry_from_metadata(&video_id, &metadata, Utc::now().date_naive()))
	}

	async fn resolve_collection(&self, collection_id: &str) -> Result<Vec<String>, BackendError> {
		let collection_url = format!("https://www.youtube.com/playlist?list={collection_id}");
		let stdout = self
			.run_tool(
				&self.ytdlp_command,
				&["--flat-playlist", "--print", "id", collection_url.as_str()],
			)
			.await?;
		Ok(stdout
			.lines()
			.map(str::trim)
			.filter(|line| !line.is_empty())
			.map(ToString::to_string)
			.collect())
	}

	async fn resolve_local(&self, path: &Path) -> Result<MediaEntry, BackendError> {
		let length_in_seconds = match self.probe_length(path).await {
			Some(length) => length,
			None => {
				warn!("Could not probe the length of {}, falling back to unknown.", path.display());
				UNKNOWN_LENGTH_IN_SECONDS
			}
		};

		let title = path
			.file_name()
			.map(|file_name| file_name.to_string_lossy().into_owned());
		let link = Url::from_file_path(path)
			.map(|url| url.to_string())
			.map_err(|()| BackendError::Failed(format!("'{}' is not an absolute path", path.display())))?;

		Ok(MediaEntry {
			display: MediaDisplay {
				title,
				author: None,
				added_on: Some(Utc::now().date_naive()),
			},
			length_in_seconds,
			link,
			source: MediaSource::Local { path: path.to_path_buf() },
		})
	}
}

impl YtDlpBackend {
	async fn probe_length(&self, path: &Path) -> Option<u64> {
		let path = path.to_str()?;
		let stdout = self
			.run_tool(
				&self.ffprobe_command,
				&[
					"-v",
					"error",
					"-show_entries",
					"format=duration",
					"-of",
					"default=noprint_wrappers=1:nokey=1",
					path,
				],
			)
			.await
			.ok()?;
		let length: f64 = stdout.trim().parse().ok()?;
		Some(length.round() as u64)
	}
}

fn entry_from_metadata(video_id: &str, metadata: &VideoMetadata, added_on: NaiveDate) -> MediaEntry {
	let aspect_ratio = match (metadata.width, metadata.height) {
		(Some(width), Some(height)) => format!("{width}/{height}"),
		_ => DEFAULT_ASPECT_RATIO.to_string(),
	};

	MediaEntry {
		display: MediaDisplay {
			title: metadata.title.clone(),
			author: metadata.channel.clone(),
			added_on: Some(added_on),
		},
		length_in_seconds: metadata
			.duration
			.map_or(UNKNOWN_LENGTH_IN_SECONDS, |duration| duration.round() as u64),
		link: format!("https://youtu.be/{video_id}"),
		source: MediaSource::External {
			video_id: video_id.to_string(),
			aspect_ratio,
		},
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn backend_with_commands(command: &str, timeout: Duration) -> YtDlpBackend {
		YtDlpBackend {
			ytdlp_command: command.to_string(),
			ffprobe_command: command.to_string(),
			tool_timeout: timeout,
			limiter: RateLimiter::direct(QUOTA),
		}
	}

	#[tokio::test]
	async fn tool_runs_should_be_aborted_once_they_exceed_the_timeout() {
		let backend = backend_with_commands("sleep", Duration::from_millis(20));
		let result = backend.run_tool("sleep", &["5"]).await;
		assert_eq!(Err(BackendError::Timeout), result);
	}

	#[tokio::test]
	async fn failing_tool_runs_should_report_the_exit_status() {
		let backend = backend_with_commands("false", Duration::from_secs(1));
		let result = backend.run_tool("false", &[]).await;
		assert!(matches!(result, Err(BackendError::Failed(_))));
	}

	#[test]
	fn metadata_should_parse_the_tool_output() {
		let json = r#"{"title": "Metropolis", "channel": "Fritz Lang", "duration": 9180, "width": 640, "height": 480}"#;
		let metadata: VideoMetadata = serde_json::from_str(json).unwrap();
		assert_eq!(Some("Metropolis".to_string()), metadata.title);
		assert_eq!(Some(9180.0), metadata.duration);
	}

	#[test]
	fn entries_should_carry_the_video_metadata() {
		let metadata = VideoMetadata {
			title: Some("Metropolis".to_string()),
			channel: Some("Fritz Lang".to_string()),
			duration: Some(9180.0),
			width: Some(640),
			height: Some(480),
		};
		let added_on = NaiveDate::from_ymd_opt(2026, 8, 8).unwrap();

		let entry = entry_from_metadata("dGFptqm3E5c", &metadata, added_on);

		assert_eq!(Some("Metropolis".to_string()), entry.display.title);
		assert_eq!(Some("Fritz Lang".to_string()), entry.display.author);
		assert_eq!(Some(added_on), entry.display.added_on);
		assert_eq!(9180, entry.length_in_seconds);
		assert_eq!("https://youtu.be/dGFptqm3E5c", entry.link);
		assert_eq!(
			MediaSource::External {
				video_id: "dGFptqm3E5c".to_string(),
				aspect_ratio: "640/480".to_string(),
			},
			entry.source,
		);
	}

	#[test]
	fn entries_without_metadata_should_fall_back_to_defaults() {
		let added_on = NaiveDate::from_ymd_opt(2026, 8, 8).unwrap();
		let entry = entry_from_metadata("dGFptqm3E5c", &VideoMetadata::default(), added_on);

		assert_eq!(None, entry.display.title);
		assert_eq!(UNKNOWN_LENGTH_IN_SECONDS, entry.length_in_seconds);
		assert_eq!(
			MediaSource::External {
				video_id: "dGFptqm3E5c".to_string(),
				aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
			},
			entry.source,
		);
	}
}
