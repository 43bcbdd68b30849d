use crate::resolver::backend::BackendError;
use thiserror::Error;

/// Resolution failures are `Clone` because every waiter on a deduplicated
/// in-flight resolution receives the same error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
	#[error("'{0}' is not recognized as any known media source.")]
	UnresolvableReference(String),
	#[error("Resolving the reference took too long and was aborted.")]
	ResolutionTimeout,
	#[error("Media resolution failed: {0}")]
	Backend(String),
}

impl From<BackendError> for ResolverError {
	fn from(error: BackendError) -> Self {
		match error {
			BackendError::Timeout => ResolverError::ResolutionTimeout,
			BackendError::Failed(message) => ResolverError::Backend(message),
		}
	}
}
