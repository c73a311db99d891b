//! Isolation of invocation contexts across concurrent calls
//!
//! Two calls of the same wrapped operation must never observe each other's bindings,
//! whether they interleave on one executor thread or run on separate OS threads.

mod common;

use common::engine::engine;
use common::fixtures::*;
use faultline::{context, Callable, Catch, FailureHandler, Invocation};
use std::sync::Arc;
use tokio::sync::Barrier;

#[tokio::test]
async fn test_interleaved_calls_keep_separate_bindings() {
    let (engine, _sink) = engine::<u32>(false);
    let barrier = Arc::new(Barrier::new(2));

    engine
        .on_failure(
            Catch::kind(VALUE).bind_as("e"),
            FailureHandler::suspending(|inv: Invocation<u32>| async move {
                tokio::task::yield_now().await;
                let bound = inv.context().get::<TestError>("e").unwrap();
                let own = context::get::<u32>("who").unwrap();
                assert_eq!(*own, *inv.args());
                Ok(Some(format!("{own}:{bound}")))
            }),
        )
        .unwrap();

    let b = Arc::clone(&barrier);
    let f = engine.wrap(
        "f",
        Callable::suspending(move |n: u32| {
            let b = Arc::clone(&b);
            async move {
                context::set("who", n).unwrap();
                // Both calls hold a binding under the same name at this point
                b.wait().await;
                assert_eq!(*context::get::<u32>("who").unwrap(), n);
                Err(TestError::Value(format!("v{n}")))
            }
        }),
    );

    let (a, b) = tokio::join!(f.call(1), f.call(2));
    assert_eq!(a, Ok(Some("1:bad value 'v1'".to_string())));
    assert_eq!(b, Ok(Some("2:bad value 'v2'".to_string())));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_spawned_calls_on_worker_threads() {
    let (engine, sink) = engine::<u32>(false);
    engine
        .on_failure(
            Catch::kind(KEY).bind_as("e"),
            FailureHandler::immediate(|inv: Invocation<u32>| {
                let e = inv.context().get::<TestError>("e").unwrap();
                assert_eq!(*e, TestError::Key(inv.args().to_string()));
                Ok(Some(inv.args().to_string()))
            }),
        )
        .unwrap();
    let f = engine.wrap(
        "lookup",
        Callable::suspending(|n: u32| async move {
            tokio::task::yield_now().await;
            Err(TestError::Key(n.to_string()))
        }),
    );

    let handles: Vec<_> = (0..32_u32)
        .map(|n| {
            let f = f.clone();
            tokio::spawn(async move { (n, f.call(n).await) })
        })
        .collect();
    for handle in handles {
        let (n, outcome) = handle.await.unwrap();
        assert_eq!(outcome, Ok(Some(n.to_string())));
    }
    assert_eq!(sink.len(), 32);
    assert_eq!(engine.metrics().handled, 32);
}

#[test]
fn test_blocking_calls_on_parallel_threads() {
    let (engine, _sink) = engine::<u32>(false);
    let barrier = Arc::new(std::sync::Barrier::new(4));

    engine
        .on_failure(
            Catch::kind(ARITHMETIC).bind_as("e"),
            FailureHandler::immediate(|inv: Invocation<u32>| {
                assert_eq!(*context::get::<u32>("who").unwrap(), *inv.args());
                Ok(Some(format!("thread {}", inv.args())))
            }),
        )
        .unwrap();

    let b = Arc::clone(&barrier);
    let f = engine.wrap(
        "f",
        Callable::immediate(move |n: u32| {
            context::set("who", n).unwrap();
            b.wait();
            Err(TestError::Overflow)
        }),
    );

    let threads: Vec<_> = (0..4_u32)
        .map(|n| {
            let f = f.clone();
            std::thread::spawn(move || f.call_blocking(n))
        })
        .collect();
    for (n, t) in threads.into_iter().enumerate() {
        assert_eq!(t.join().unwrap(), Ok(Some(format!("thread {n}"))));
    }
}

#[test]
fn test_registration_while_calls_run() {
    let (engine, _sink) = engine::<u32>(false);
    let f = engine.wrap("f", Callable::immediate(|_n: u32| Err(TestError::Overflow)));

    let caller = {
        let f = f.clone();
        std::thread::spawn(move || {
            (0..200_u32)
                .map(|n| f.call_blocking(n).is_ok())
                .collect::<Vec<bool>>()
        })
    };
    engine
        .on_failure(Catch::kind(OVERFLOW), FailureHandler::immediate(|_| Ok(None)))
        .unwrap();
    let handled = caller.join().unwrap();

    // Each call sees a whole table: once the handler is visible it stays visible
    if let Some(first) = handled.iter().position(|h| *h) {
        assert!(handled[first..].iter().all(|h| *h));
    }
    assert_eq!(f.call_blocking(0), Ok(None));
}
