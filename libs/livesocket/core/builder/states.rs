/// Type-state markers for the builder pattern
///
/// These types are used to track which fields have been set
/// in the builder at compile-time, preventing invalid configurations.

use std::marker::PhantomData;

/// Marker trait for URL state
pub trait UrlState {}

/// Base URL has not been set
pub struct NoUrl;
impl UrlState for NoUrl {}

/// Base URL has been set
pub struct HasUrl;
impl UrlState for HasUrl {}

/// Marker trait for token store state
pub trait TokenState {}

/// Token store has not been set
pub struct NoTokenStore;
impl TokenState for NoTokenStore {}

/// Token store has been set
pub struct HasTokenStore;
impl TokenState for HasTokenStore {}

/// Phantom marker to prevent direct construction
#[derive(Debug, Clone, Copy)]
pub struct TypeState<U, T> {
    _url: PhantomData<U>,
    _token: PhantomData<T>,
}

impl<U, T> TypeState<U, T> {
    pub(crate) fn new() -> Self {
        Self {
            _url: PhantomData,
            _token: PhantomData,
        }
    }
}

impl<U, T> Default for TypeState<U, T> {
    fn default() -> Self {
        Self::new()
    }
}
