//! Lazily initialized service handle.
//!
//! The initializer runs on first [`get`](LazyHandle::get). A failed
//! initialization is not cached, so setting the missing variable and
//! retrying works without a restart.

use super::ServiceError;
use std::sync::Arc;
use tokio::sync::OnceCell;

type Init<T> = Box<dyn Fn() -> Result<T, ServiceError> + Send + Sync>;

pub struct LazyHandle<T> {
    cell: OnceCell<Arc<T>>,
    init: Init<T>,
}

impl<T> LazyHandle<T> {
    pub fn new(init: impl Fn() -> Result<T, ServiceError> + Send + Sync + 'static) -> Self {
        Self {
            cell: OnceCell::new(),
            init: Box::new(init),
        }
    }

    /// A handle that is already initialized.
    pub fn ready(value: T) -> Self {
        Self {
            cell: OnceCell::new_with(Some(Arc::new(value))),
            init: Box::new(|| Err(ServiceError::InvalidConfiguration("already initialized".to_string()))),
        }
    }

    pub async fn get(&self) -> Result<Arc<T>, ServiceError> {
        self.cell
            .get_or_try_init(|| async { (self.init)().map(Arc::new) })
            .await
            .cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_initializes_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = LazyHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("token".to_string())
        });

        assert!(!handle.is_initialized());
        assert_eq!(*handle.get().await.unwrap(), "token");
        assert_eq!(*handle.get().await.unwrap(), "token");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = LazyHandle::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ServiceError::MissingCredential("API_TOKEN".to_string()))
            } else {
                Ok(42)
            }
        });

        assert_eq!(
            handle.get().await.unwrap_err(),
            ServiceError::MissingCredential("API_TOKEN".to_string())
        );
        assert_eq!(*handle.get().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_ready_handle() {
        let handle = LazyHandle::ready(7u8);
        assert!(handle.is_initialized());
        assert_eq!(*handle.get().await.unwrap(), 7);
    }
}
