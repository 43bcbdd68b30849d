use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fallback length ("99:99") for media whose real length could not be
/// determined, so that clients never render an unknown length as zero.
pub const UNKNOWN_LENGTH_IN_SECONDS: u64 = 99 * 60 + 99;

pub const DEFAULT_ASPECT_RATIO: &str = "16/9";

/// A resolved, playable piece of media. Immutable once created.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct MediaEntry {
	pub display: MediaDisplay,
	pub length_in_seconds: u64,
	/// Dereferenceable link to play this entry.
	pub link: String,
	#[serde(flatten)]
	pub source: MediaSource,
}

/// Renderable description of a media entry. Plain data fields only, so that
/// untrusted titles or author names can never carry markup into a page.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct MediaDisplay {
	pub title: Option<String>,
	pub author: Option<String>,
	pub added_on: Option<NaiveDate>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind")]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
	External { video_id: String, aspect_ratio: String },
	Local { path: PathBuf },
}
