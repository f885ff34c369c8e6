//! Presentation state containers.
//!
//! A [`ViewModel`] owns one [`LoadState`] in a `tokio::sync::watch` channel.
//! UIs subscribe to the channel and re-render on change; actions go through
//! [`ViewModel::run`], which publishes `Loading`, awaits the repository call
//! and publishes `Success` or `Error`.

use std::future::Future;

use tokio::sync::watch;

use crate::error::ClientError;

/// Where a screen's data stands.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    /// Nothing requested yet.
    Idle,
    /// A request is in flight.
    Loading,
    /// The last request succeeded.
    Success(T),
    /// The last request failed; the message is fit to show a user.
    Error(String),
}

impl<T> LoadState<T> {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The loaded value, if the last request succeeded.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// The error message, if the last request failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Message shown to a user for a failed call.
#[must_use]
pub fn error_message(err: &ClientError) -> String {
    match err {
        ClientError::Api { status: 401, .. } => "Please sign in to continue".to_string(),
        ClientError::Api { message, .. } | ClientError::Validation(message) => message.clone(),
        ClientError::Http(_) => "Network error, check your connection".to_string(),
        ClientError::Decode(_) | ClientError::Url(_) => {
            "Unexpected response from the server".to_string()
        }
    }
}

/// Observable [`LoadState`].
#[derive(Debug)]
pub struct ViewModel<T> {
    state: watch::Sender<LoadState<T>>,
}

impl<T> Default for ViewModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ViewModel<T> {
    /// A view model in the `Idle` state.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(LoadState::Idle);
        Self { state }
    }

    /// Watch state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LoadState<T>> {
        self.state.subscribe()
    }

    /// Publish a new state, even with no subscribers.
    pub fn set(&self, state: LoadState<T>) {
        self.state.send_replace(state);
    }

    /// Edit the loaded value in place. No-op unless the state is `Success`.
    pub fn update(&self, edit: impl FnOnce(&mut T)) {
        self.state.send_if_modified(|state| match state {
            LoadState::Success(value) => {
                edit(value);
                true
            }
            _ => false,
        });
    }

    /// Publish `Loading`, await `fut`, then publish its outcome.
    ///
    /// Returns whether the call succeeded.
    pub async fn run<F>(&self, fut: F) -> bool
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        self.set(LoadState::Loading);
        match fut.await {
            Ok(value) => {
                self.set(LoadState::Success(value));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "View model action failed");
                self.set(LoadState::Error(error_message(&e)));
                false
            }
        }
    }
}

impl<T: Clone> ViewModel<T> {
    /// A snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> LoadState<T> {
        self.state.borrow().clone()
    }

    /// A copy of the loaded value, if any.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.state.borrow().value().cloned()
    }
}
