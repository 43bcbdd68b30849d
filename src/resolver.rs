use crate::playlist::media::MediaEntry;
use crate::resolver::backend::MediaBackend;
use crate::resolver::cache::AsyncCache;
use crate::resolver::error::ResolverError;
use crate::resolver::reference::MediaReference;
use futures_util::future::try_join_all;
use std::sync::Arc;

pub mod backend;
pub mod cache;
pub mod error;
pub mod reference;
pub mod ytdlp;

/// Deduplicating, restartable front of the media resolution backend.
///
/// Videos and collection listings are cached by reference key with
/// single-flight semantics; local files are probed per request. Only the
/// backend ever suspends on the network.
pub struct MediaResolver {
	backend: Arc<dyn MediaBackend>,
	media: AsyncCache<MediaEntry, ResolverError>,
	collections: AsyncCache<Vec<String>, ResolverError>,
}

impl MediaResolver {
	pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
		Self {
			backend,
			media: AsyncCache::default(),
			collections: AsyncCache::default(),
		}
	}

	/// A resolver whose caches are pre-populated from a snapshot.
	pub fn restore(
		backend: Arc<dyn MediaBackend>,
		media: impl IntoIterator<Item = (String, MediaEntry)>,
		collections: impl IntoIterator<Item = (String, Vec<String>)>,
	) -> Self {
		Self {
			backend,
			media: AsyncCache::from_resolved(media),
			collections: AsyncCache::from_resolved(collections),
		}
	}

	/// Resolve a submitted reference into playable entries, in the order they
	/// should appear on the playlist.
	pub async fn resolve(&self, reference: &str) -> Result<Vec<MediaEntry>, ResolverError> {
		match MediaReference::parse(reference)? {
			MediaReference::Video { id } => Ok(vec![self.fetch_video(&id).await?]),
			MediaReference::Collection { id } => {
				let video_ids = self.fetch_collection(&id).await?;
				// Resolutions run concurrently; the backend's rate limiter is
				// what serializes the actual external calls.
				try_join_all(video_ids.iter().map(|video_id| self.fetch_video(video_id))).await
			}
			MediaReference::LocalFile { path } => {
				let entry = self.backend.resolve_local(&path).await?;
				Ok(vec![entry])
			}
		}
	}

	pub fn resolved_media(&self) -> Vec<(String, MediaEntry)> {
		self.media.resolved_entries()
	}

	pub fn resolved_collections(&self) -> Vec<(String, Vec<String>)> {
		self.collections.resolved_entries()
	}

	async fn fetch_video(&self, video_id: &str) -> Result<MediaEntry, ResolverError> {
		let backend = Arc::clone(&self.backend);
		let id = video_id.to_string();
		self.media
			.fetch(video_id, async move { Ok(backend.resolve_video(&id).await?) })
			.await
	}

	async fn fetch_collection(&self, collection_id: &str) -> Result<Vec<String>, ResolverError> {
		let backend = Arc::clone(&self.backend);
		let id = collection_id.to_string();
		self.collections
			.fetch(collection_id, async move { Ok(backend.resolve_collection(&id).await?) })
			.await
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::playlist::media::{MediaDisplay, MediaSource, UNKNOWN_LENGTH_IN_SECONDS};
	use crate::resolver::backend::BackendError;
	use async_trait::async_trait;
	use std::path::{Path, PathBuf};
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn video_entry(video_id: &str) -> MediaEntry {
		MediaEntry {
			display: MediaDisplay {
				title: Some(video_id.to_string()),
				author: None,
				added_on: None,
			},
			length_in_seconds: UNKNOWN_LENGTH_IN_SECONDS,
			link: format!("https://youtu.be/{video_id}"),
			source: MediaSource::External {
				video_id: video_id.to_string(),
				aspect_ratio: "16/9".to_string(),
			},
		}
	}

	#[derive(Default)]
	struct FakeBackend {
		video_invocations: AtomicUsize,
		failures_left: AtomicUsize,
	}

	impl FakeBackend {
		fn failing_once() -> Self {
			Self {
				video_invocations: AtomicUsize::new(0),
				failures_left: AtomicUsize::new(1),
			}
		}
	}

	#[async_trait]
	impl MediaBackend for FakeBackend {
		async fn resolve_video(&self, video_id: &str) -> Result<MediaEntry, BackendError> {
			self.video_invocations.fetch_add(1, Ordering::SeqCst);
			if self
				.failures_left
				.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
				.is_ok()
			{
				return Err(BackendError::Failed("flaky".to_string()));
			}
			Ok(video_entry(video_id))
		}

		async fn resolve_collection(&self, _collection_id: &str) -> Result<Vec<String>, BackendError> {
			Ok(vec!["v1".to_string(), "v2".to_string(), "v3".to_string()])
		}

		async fn resolve_local(&self, path: &Path) -> Result<MediaEntry, BackendError> {
			Ok(MediaEntry {
				display: MediaDisplay::default(),
				length_in_seconds: UNKNOWN_LENGTH_IN_SECONDS,
				link: format!("file://{}", path.display()),
				source: MediaSource::Local { path: path.to_path_buf() },
			})
		}
	}

	#[tokio::test]
	async fn videos_should_only_be_resolved_once() {
		let backend = Arc::new(FakeBackend::default());
		let resolver = MediaResolver::new(Arc::clone(&backend) as Arc<dyn MediaBackend>);

		let first = resolver.resolve("https://youtu.be/abc").await.unwrap();
		let second = resolver.resolve("https://youtu.be/abc").await.unwrap();

		assert_eq!(first, second);
		assert_eq!(1, backend.video_invocations.load(Ordering::SeqCst));
	}

	#[tokio::test]
	async fn failed_resolutions_should_be_retried() {
		let backend = Arc::new(FakeBackend::failing_once());
		let resolver = MediaResolver::new(Arc::clone(&backend) as Arc<dyn MediaBackend>);

		let failed = resolver.resolve("https://youtu.be/abc").await;
		assert_eq!(Err(ResolverError::Backend("flaky".to_string())), failed);

		let retried = resolver.resolve("https://youtu.be/abc").await;
		assert_eq!(Ok(vec![video_entry("abc")]), retried);
		assert_eq!(2, backend.video_invocations.load(Ordering::SeqCst));
	}

	#[tokio::test]
	async fn collections_should_resolve_to_entries_in_collection_order() {
		let resolver = MediaResolver::new(Arc::new(FakeBackend::default()));

		let entries = resolver
			.resolve("https://www.youtube.com/playlist?list=PL123")
			.await
			.unwrap();

		assert_eq!(vec![video_entry("v1"), video_entry("v2"), video_entry("v3")], entries);
	}

	#[tokio::test]
	async fn unresolvable_references_should_not_reach_the_backend() {
		let backend = Arc::new(FakeBackend::default());
		let resolver = MediaResolver::new(Arc::clone(&backend) as Arc<dyn MediaBackend>);

		let result = resolver.resolve("https://example.com/").await;

		assert!(matches!(result, Err(ResolverError::UnresolvableReference(_))));
		assert_eq!(0, backend.video_invocations.load(Ordering::SeqCst));
	}

	#[tokio::test]
	async fn restored_entries_should_be_served_without_the_backend() {
		let backend = Arc::new(FakeBackend::default());
		let resolver = MediaResolver::restore(
			Arc::clone(&backend) as Arc<dyn MediaBackend>,
			[("abc".to_string(), video_entry("abc"))],
			[],
		);

		let entries = resolver.resolve("https://youtu.be/abc").await.unwrap();

		assert_eq!(vec![video_entry("abc")], entries);
		assert_eq!(0, backend.video_invocations.load(Ordering::SeqCst));
	}

	#[tokio::test]
	async fn local_files_should_resolve_without_caching() {
		let resolver = MediaResolver::new(Arc::new(FakeBackend::default()));

		let entries = resolver.resolve("file:///srv/media/recording.mkv").await.unwrap();

		assert_eq!(1, entries.len());
		assert_eq!(
			MediaSource::Local {
				path: PathBuf::from("/srv/media/recording.mkv"),
			},
			entries[0].source,
		);
		assert!(resolver.resolved_media().is_empty());
	}
}
