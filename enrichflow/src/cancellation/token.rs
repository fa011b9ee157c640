//! Cancellation token for cooperative cancellation.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Returned by [`CancellationToken::check`] once cancellation was requested.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cancelled: {reason}")]
pub struct Cancelled {
    /// The first cancellation reason.
    pub reason: String,
}

/// A token for cooperative cancellation.
///
/// Cancellation is idempotent - only the first cancellation reason is kept.
/// The reason is stored before the flag is raised, so an observer that sees
/// the token cancelled always sees its reason.
#[derive(Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
    reason: RwLock<Option<String>>,
}

impl CancellationToken {
    /// Creates a new cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation with a reason.
    pub fn cancel(&self, reason: impl Into<String>) {
        let mut slot = self.reason.write();
        if slot.is_none() {
            *slot = Some(reason.into());
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.reason.read().clone()
    }

    /// Returns `Err(Cancelled)` once cancellation was requested.
    ///
    /// Tools call this between blocking steps and propagate with `?`.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled {
                reason: self.reason().unwrap_or_default(),
            })
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_token_default_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.reason().is_none());
        assert!(token.check().is_ok());
    }

    #[test]
    fn test_token_cancel_idempotent() {
        let token = CancellationToken::new();
        token.cancel("First reason");
        token.cancel("Second reason");

        assert!(token.is_cancelled());
        assert_eq!(token.reason(), Some("First reason".to_string()));
        assert_eq!(
            token.check(),
            Err(Cancelled {
                reason: "First reason".to_string()
            })
        );
    }

    #[test]
    fn test_cancelled_token_always_has_reason() {
        for _ in 0..50 {
            let token = Arc::new(CancellationToken::new());
            let writer = {
                let token = Arc::clone(&token);
                std::thread::spawn(move || token.cancel("shutdown"))
            };

            while !token.is_cancelled() {
                std::hint::spin_loop();
            }
            assert_eq!(token.reason(), Some("shutdown".to_string()));
            assert_eq!(
                token.check(),
                Err(Cancelled {
                    reason: "shutdown".to_string()
                })
            );
            writer.join().unwrap();
        }
    }
}
