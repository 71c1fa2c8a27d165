//! Type aliases for shared state.
//!
//! The editor mutates its layer stack from a single logical owner. The only
//! other reader is the autosave task, which needs a `Send + Sync` handle, so
//! the aliases here are the thread-safe flavour built on `parking_lot`.
//!
//! ```rust,ignore
//! use atelier_core::types::*;
//!
//! let session: ThreadSafeRw<EditorSession> = thread_safe_rw(EditorSession::open(product, config));
//! let snapshot = session.read().to_document(Visibility::Draft);
//! ```

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Shared, exclusively locked state (texture sinks).
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// Shared state with one writer and many readers (the editor session).
pub type ThreadSafeRw<T> = Arc<RwLock<T>>;

/// Wrap a value in `Arc<Mutex<_>>`.
#[inline]
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}

/// Wrap a value in `Arc<RwLock<_>>`.
#[inline]
pub fn thread_safe_rw<T>(value: T) -> ThreadSafeRw<T> {
    Arc::new(RwLock::new(value))
}

