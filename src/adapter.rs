//! # Execution Adapter
//!
//! [`Callable`] puts immediate and suspending callables behind one signature. The engine
//! only ever awaits [`Callable::call`]; whether the callable finished on the spot or
//! needed the scheduler is decided by the tag stored at construction time.
//!
//! An immediate callable yields a ready future, so a suspending operation can use plain
//! closures for its handlers, and an immediate operation can still register suspending
//! handlers when it is driven through [`crate::engine::Wrapped::call`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub use futures::future::BoxFuture;
use futures::FutureExt;

type ImmediateFn<In, Out> = dyn Fn(In) -> Out + Send + Sync;
type SuspendingFn<In, Out> = dyn Fn(In) -> BoxFuture<'static, Out> + Send + Sync;

/// A registered callable: either immediate or suspending.
pub enum Callable<In, Out> {
    /// Returns its result directly
    Immediate(Arc<ImmediateFn<In, Out>>),
    /// Returns a future that may suspend before producing its result
    Suspending(Arc<SuspendingFn<In, Out>>),
}

impl<In, Out> Callable<In, Out>
where
    In: Send + 'static,
    Out: Send + 'static,
{
    /// Wrap a plain function
    #[must_use]
    pub fn immediate<F>(f: F) -> Self
    where
        F: Fn(In) -> Out + Send + Sync + 'static,
    {
        Callable::Immediate(Arc::new(f))
    }

    /// Wrap an async function
    #[must_use]
    pub fn suspending<F, Fut>(f: F) -> Self
    where
        F: Fn(In) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Out> + Send + 'static,
    {
        Callable::Suspending(Arc::new(move |input| f(input).boxed()))
    }

    /// Invoke the callable.
    ///
    /// Immediate callables run before this returns; the returned future is already
    /// complete.
    pub fn call(&self, input: In) -> BoxFuture<'static, Out> {
        match self {
            Callable::Immediate(f) => futures::future::ready(f(input)).boxed(),
            Callable::Suspending(f) => f(input),
        }
    }
}

impl<In, Out> Callable<In, Out> {
    #[must_use]
    pub fn is_suspending(&self) -> bool {
        matches!(self, Callable::Suspending(_))
    }
}

impl<In, Out> Clone for Callable<In, Out> {
    fn clone(&self) -> Self {
        match self {
            Callable::Immediate(f) => Callable::Immediate(Arc::clone(f)),
            Callable::Suspending(f) => Callable::Suspending(Arc::clone(f)),
        }
    }
}

impl<In, Out> fmt::Debug for Callable<In, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Immediate(_) => f.write_str("Callable::Immediate"),
            Callable::Suspending(_) => f.write_str("Callable::Suspending"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_is_ready_without_executor() {
        let double = Callable::immediate(|x: i32| x * 2);
        assert!(!double.is_suspending());
        assert_eq!(double.call(21).now_or_never(), Some(42));
    }

    #[test]
    fn test_suspending_completes_when_driven() {
        let double = Callable::suspending(|x: i32| async move { x * 2 });
        assert!(double.is_suspending());
        assert_eq!(futures::executor::block_on(double.call(4)), 8);
    }

    #[test]
    fn test_suspending_that_yields_is_not_ready_on_first_poll() {
        let yielding = Callable::suspending(|x: i32| async move {
            let mut yielded = false;
            futures::future::poll_fn(|cx| {
                if yielded {
                    std::task::Poll::Ready(())
                } else {
                    yielded = true;
                    cx.waker().wake_by_ref();
                    std::task::Poll::Pending
                }
            })
            .await;
            x
        });
        assert_eq!(yielding.call(1).now_or_never(), None);
        assert_eq!(futures::executor::block_on(yielding.call(1)), 1);
    }

    #[test]
    fn test_clone_shares_function() {
        let a = Callable::immediate(|s: &'static str| s.len());
        let b = a.clone();
        assert_eq!(b.call("abc").now_or_never(), Some(3));
        assert_eq!(format!("{a:?}"), "Callable::Immediate");
    }
}
