//! Bounded pool of reusable sessions

use crate::error::FetchError;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

type Factory<S> = dyn Fn() -> Result<S, FetchError> + Send + Sync;

struct PoolInner<S> {
    idle: Mutex<Vec<S>>,
    permits: Arc<Semaphore>,
    factory: Box<Factory<S>>,
    size: usize,
}

impl<S> PoolInner<S> {
    fn idle(&self) -> MutexGuard<'_, Vec<S>> {
        self.idle.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Hands out at most `size` sessions at a time.
///
/// Sessions are created lazily through the factory and reused once
/// released. Every live session is either idle or held by exactly one
/// [`PooledSession`], and the total never exceeds `size`.
pub struct ConnectionPool<S> {
    inner: Arc<PoolInner<S>>,
}

impl<S> Clone for ConnectionPool<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Send + 'static> ConnectionPool<S> {
    pub fn new<F>(size: usize, factory: F) -> Self
    where
        F: Fn() -> Result<S, FetchError> + Send + Sync + 'static,
    {
        let size = size.max(1);
        Self {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(Vec::with_capacity(size)),
                permits: Arc::new(Semaphore::new(size)),
                factory: Box::new(factory),
                size,
            }),
        }
    }

    /// Take an idle session or create one, waiting while the pool is at capacity.
    ///
    /// A factory failure is returned to the caller and its slot is freed.
    pub async fn acquire(&self) -> Result<PooledSession<S>, FetchError> {
        let permit = Arc::clone(&self.inner.permits)
            .acquire_owned()
            .await
            .map_err(|_| FetchError::Session("connection pool closed".to_string()))?;

        let reused = self.inner.idle().pop();
        let session = match reused {
            Some(session) => session,
            None => {
                debug!("Creating new pooled session (pool size {})", self.inner.size);
                (self.inner.factory)()?
            }
        };

        Ok(PooledSession {
            session: Some(session),
            pool: Arc::clone(&self.inner),
            _permit: permit,
        })
    }

    /// Return a session explicitly; dropping the handle does the same.
    pub fn release(&self, session: PooledSession<S>) {
        drop(session);
    }

    pub fn size(&self) -> usize {
        self.inner.size
    }

    pub fn idle_count(&self) -> usize {
        self.inner.idle().len()
    }

    pub fn in_use(&self) -> usize {
        self.inner.size - self.inner.permits.available_permits()
    }
}

/// A session checked out of a [`ConnectionPool`].
pub struct PooledSession<S> {
    session: Option<S>,
    pool: Arc<PoolInner<S>>,
    _permit: OwnedSemaphorePermit,
}

impl<S> Deref for PooledSession<S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.session.as_ref().expect("session is only taken on drop")
    }
}

impl<S> DerefMut for PooledSession<S> {
    fn deref_mut(&mut self) -> &mut S {
        self.session.as_mut().expect("session is only taken on drop")
    }
}

impl<S> Drop for PooledSession<S> {
    fn drop(&mut self) {
        // The session goes back before the permit is released, so a woken
        // waiter always finds it idle.
        if let Some(session) = self.session.take() {
            self.pool.idle().push(session);
        }
    }
}
