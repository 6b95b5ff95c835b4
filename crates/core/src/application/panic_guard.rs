// Panic isolation: a crashing step, probe or callback must not take its siblings down
use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, UnwindSafe};
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug, PartialEq, Eq)]
pub enum PanicGuardResult<T> {
    /// Execution completed successfully
    Success(T),
    /// Execution panicked
    Panicked(String),
}

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Execute a closure with panic isolation
///
/// Used by the dispatcher so a faulty observer callback cannot stop the drain loop.
pub fn execute_guarded<F, T>(f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T + UnwindSafe,
{
    match catch_unwind(f) {
        Ok(result) => PanicGuardResult::Success(result),
        Err(payload) => {
            let panic_msg = panic_message(payload.as_ref());
            error!(panic_msg = %panic_msg, "Guarded closure panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

/// Execute a future on its own task with panic isolation
///
/// The future runs via `tokio::spawn`, so a panic is caught by the JoinHandle
/// instead of unwinding through the caller. Must be called inside a runtime.
pub async fn execute_guarded_async<F, T>(future: F) -> PanicGuardResult<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn(future).await {
        Ok(value) => PanicGuardResult::Success(value),
        Err(join_err) if join_err.is_panic() => {
            let panic_msg = panic_message(join_err.into_panic().as_ref());
            error!(panic_msg = %panic_msg, "Guarded task panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
        Err(join_err) => {
            error!(error = %join_err, "Guarded task was cancelled");
            PanicGuardResult::Panicked(join_err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_guarded_success() {
        assert_eq!(execute_guarded(|| 42), PanicGuardResult::Success(42));
    }

    #[test]
    fn test_execute_guarded_catches_str_and_string() {
        let r: PanicGuardResult<()> = execute_guarded(|| panic!("static message"));
        assert_eq!(r, PanicGuardResult::Panicked("static message".to_string()));

        let r: PanicGuardResult<()> = execute_guarded(|| panic!("formatted {}", 7));
        assert_eq!(r, PanicGuardResult::Panicked("formatted 7".to_string()));
    }

    #[tokio::test]
    async fn test_execute_guarded_async_catches_panic() {
        let explode = true;
        let r = execute_guarded_async(async move {
            if explode {
                panic!("exploded");
            }
            0u8
        })
        .await;
        assert_eq!(r, PanicGuardResult::Panicked("exploded".to_string()));

        let r = execute_guarded_async(async { 7u8 }).await;
        assert_eq!(r, PanicGuardResult::Success(7));
    }
}
