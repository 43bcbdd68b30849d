use crate::resolver::error::ResolverError;
use std::path::PathBuf;
use url::Url;

const EXTERNAL_HOST_FRAGMENTS: [&str; 3] = ["youtube", "youtu.be", "yt.be"];

/// What a submitted reference string points at, before any network access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaReference {
	/// A single externally hosted video, by id or `search:` query.
	Video { id: String },
	/// A remote collection of videos (a playlist on the hosting site).
	Collection { id: String },
	/// A media file reachable from the server itself.
	LocalFile { path: PathBuf },
}

impl MediaReference {
	/// Classify a submitted reference. Scheme-less input is retried as
	/// `https://`; anything that is neither a known video host nor a `file:`
	/// URL is unresolvable.
	pub fn parse(reference: &str) -> Result<MediaReference, ResolverError> {
		let unresolvable = || ResolverError::UnresolvableReference(reference.to_string());

		if reference.starts_with("search:") {
			return Ok(MediaReference::Video {
				id: reference.to_string(),
			});
		}

		if let Ok(url) = Url::parse(reference) {
			if url.scheme() == "file" {
				let path = url.to_file_path().map_err(|()| unresolvable())?;
				return Ok(MediaReference::LocalFile { path });
			}
		}

		let normalized = if reference.starts_with("http") {
			reference.to_string()
		} else {
			format!("https://{reference}")
		};
		let url = Url::parse(&normalized).map_err(|_error| unresolvable())?;
		let host = url.host_str().ok_or_else(unresolvable)?;
		if !EXTERNAL_HOST_FRAGMENTS.iter().any(|fragment| host.contains(fragment)) {
			return Err(unresolvable());
		}

		if let Some(id) = query_parameter(&url, "v") {
			return Ok(MediaReference::Video { id });
		}
		if let Some(id) = query_parameter(&url, "list") {
			return Ok(MediaReference::Collection { id });
		}

		// Short links carry the video id as the last path component.
		let id = url
			.path_segments()
			.and_then(|mut segments| segments.next_back())
			.filter(|segment| !segment.is_empty())
			.ok_or_else(unresolvable)?;
		Ok(MediaReference::Video { id: id.to_string() })
	}
}

fn query_parameter(url: &Url, name: &str) -> Option<String> {
	url.query_pairs()
		.find(|(key, _value)| key == name)
		.map(|(_key, value)| value.into_owned())
}
