//! Load State
//!
//! Tagged status of an asynchronous fetch. Repositories publish a stream of
//! these; the aggregator folds the latest one into the view.

use std::sync::Arc;

use crate::error::FeedError;
use crate::model::FeedContents;

/// Outcome of an asynchronous load
///
/// The error cause is shared so the same failure can be handed to both the
/// view derivation and the effect queue without cloning the error itself.
#[derive(Clone, Debug)]
pub enum LoadState<T> {
    /// Load in progress, no value yet
    Loading,
    /// Load finished with a value
    Success(T),
    /// Load failed
    Error(Arc<FeedError>),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T> LoadState<T> {
    /// Build an error state from an owned error
    pub fn error(err: impl Into<FeedError>) -> Self {
        Self::Error(Arc::new(err.into()))
    }

    /// Whether a load is in flight
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Whether the load succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Whether the load failed
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The loaded value, if any
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Loading | Self::Error(_) => None,
        }
    }

    /// The failure cause, if any
    pub fn cause(&self) -> Option<&Arc<FeedError>> {
        match self {
            Self::Error(cause) => Some(cause),
            Self::Loading | Self::Success(_) => None,
        }
    }

    /// Transform the success value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LoadState<U> {
        match self {
            Self::Loading => LoadState::Loading,
            Self::Success(value) => LoadState::Success(f(value)),
            Self::Error(cause) => LoadState::Error(cause),
        }
    }
}

impl<T, E> From<Result<T, E>> for LoadState<T>
where
    E: Into<FeedError>,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::error(err),
        }
    }
}

impl LoadState<FeedContents> {
    /// Loaded contents, or empty contents while loading or after a failure
    ///
    /// Stale data is never shown next to a loading or error badge.
    #[must_use]
    pub fn contents_or_empty(&self) -> FeedContents {
        self.value().cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;

    #[test]
    fn test_exactly_one_tag() {
        let loading: LoadState<u32> = LoadState::Loading;
        assert!(loading.is_loading() && !loading.is_success() && !loading.is_error());

        let success = LoadState::Success(3);
        assert!(success.is_success() && !success.is_loading() && !success.is_error());
        assert_eq!(success.value(), Some(&3));

        let failed: LoadState<u32> = LoadState::error(FeedError::Closed);
        assert!(failed.is_error() && !failed.is_loading() && !failed.is_success());
        assert!(failed.cause().is_some());
        assert_eq!(failed.value(), None);
    }

    #[test]
    fn test_from_result() {
        let ok: LoadState<u32> = Ok::<_, FeedError>(7).into();
        assert_eq!(ok.value(), Some(&7));

        let err: LoadState<u32> = Err::<u32, _>(PlaybackError::Device("x".into())).into();
        assert!(matches!(
            err.cause().map(|cause| &**cause),
            Some(FeedError::Playback(_))
        ));
    }

    #[test]
    fn test_map_keeps_error_cause() {
        let err: LoadState<u32> = LoadState::error(FeedError::Closed);
        let cause = err.cause().cloned().unwrap();
        let mapped = err.map(|v| v * 2);
        assert!(Arc::ptr_eq(mapped.cause().unwrap(), &cause));
    }

    #[test]
    fn test_contents_or_empty() {
        assert!(LoadState::<FeedContents>::Loading
            .contents_or_empty()
            .is_empty());
        assert!(LoadState::<FeedContents>::error(FeedError::Closed)
            .contents_or_empty()
            .is_empty());
    }
}
