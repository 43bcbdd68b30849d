use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

type SharedResolution<Value, Error> = Shared<BoxFuture<'static, Result<Value, Error>>>;

/// A key is either being resolved right now or has been resolved before.
/// Failed resolutions leave no trace so they can be retried.
enum Slot<Value, Error> {
	InFlight(SharedResolution<Value, Error>),
	Resolved(Value),
}

/// Deduplicating async lookup table. Concurrent fetches for the same key all
/// wait on one shared resolution; at most one resolution per key is ever in
/// flight.
pub struct AsyncCache<Value, Error> {
	slots: Arc<Mutex<BTreeMap<String, Slot<Value, Error>>>>,
}

impl<Value, Error> Default for AsyncCache<Value, Error> {
	fn default() -> Self {
		Self {
			slots: Arc::new(Mutex::new(BTreeMap::new())),
		}
	}
}

impl<Value, Error> AsyncCache<Value, Error>
where
	Value: Clone + Send + Sync + 'static,
	Error: Clone + Send + Sync + 'static,
{
	pub fn from_resolved(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
		let slots = entries
			.into_iter()
			.map(|(key, value)| (key, Slot::Resolved(value)))
			.collect();
		Self {
			slots: Arc::new(Mutex::new(slots)),
		}
	}

	/// Return the resolved value for `key`, driving `resolve` at most once no
	/// matter how many callers arrive concurrently. On failure the slot is
	/// dropped entirely, so the next fetch starts over.
	pub async fn fetch<ResolveFuture>(&self, key: &str, resolve: ResolveFuture) -> Result<Value, Error>
	where
		ResolveFuture: Future<Output = Result<Value, Error>> + Send + 'static,
	{
		let resolution = {
			let mut slots = self.slots.lock();
			match slots.get(key) {
				Some(Slot::Resolved(value)) => return Ok(value.clone()),
				Some(Slot::InFlight(resolution)) => resolution.clone(),
				None => {
					let slots_for_completion = Arc::clone(&self.slots);
					let completion_key = key.to_string();
					let resolution = async move {
						let result = resolve.await;
						let mut slots = slots_for_completion.lock();
						match &result {
							Ok(value) => {
								slots.insert(completion_key, Slot::Resolved(value.clone()));
							}
							Err(_error) => {
								slots.remove(&completion_key);
							}
						}
						result
					}
					.boxed()
					.shared();
					slots.insert(key.to_string(), Slot::InFlight(resolution.clone()));
					resolution
				}
			}
		};

		resolution.await
	}

	/// Everything resolved so far, for snapshotting. In-flight resolutions
	/// are not included.
	pub fn resolved_entries(&self) -> Vec<(String, Value)> {
		self.slots
			.lock()
			.iter()
			.filter_map(|(key, slot)| match slot {
				Slot::Resolved(value) => Some((key.clone(), value.clone())),
				Slot::InFlight(_) => None,
			})
			.collect()
	}
}
