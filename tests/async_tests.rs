//! Tests for suspending operations and callbacks
//!
//! Every combination of immediate and suspending operation/handler goes through the same
//! `Wrapped::call` path; these tests drive it on a tokio runtime.

mod common;

use common::engine::engine;
use common::fixtures::*;
use common::flags::Called;
use faultline::{context, Callable, Catch, ErrorKind, FailureHandler, Invocation};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_except_async() {
    let (engine, _sink) = engine::<()>(false);
    let called = Called::default();
    let c = called.clone();
    engine
        .on_failure(
            Catch::kind(ZERO_DIVISION),
            FailureHandler::suspending(move |_| {
                let c = c.clone();
                async move {
                    tokio::task::yield_now().await;
                    c.hit();
                    Ok(None)
                }
            }),
        )
        .unwrap();

    let f = engine.wrap(
        "f",
        Callable::suspending(|()| async { Err(TestError::ZeroDivision) }),
    );
    assert_eq!(f.call(()).await, Ok(None));
    assert!(called.get());
}

#[tokio::test]
async fn test_except_finally_async() {
    let (engine, _sink) = engine::<()>(false);
    let (except, finally) = (Called::default(), Called::default());
    let (e, c) = (except.clone(), finally.clone());
    engine
        .on_failure(
            Catch::kind(ZERO_DIVISION),
            FailureHandler::suspending(move |_| {
                let e = e.clone();
                async move {
                    tokio::task::yield_now().await;
                    e.hit();
                    Ok(None)
                }
            }),
        )
        .unwrap();
    engine.on_cleanup(Callable::suspending(move |_| {
        let c = c.clone();
        async move {
            tokio::task::yield_now().await;
            c.hit();
            Ok(Some("cleaned".to_string()))
        }
    }));

    let f = engine.wrap(
        "f",
        Callable::suspending(|()| async { Err(TestError::ZeroDivision) }),
    );
    assert_eq!(f.call(()).await, Ok(Some("cleaned".to_string())));
    assert!(except.get());
    assert!(finally.get());
}

#[tokio::test]
async fn test_else_async() {
    let (engine, _sink) = engine::<()>(false);
    let (except, else_) = (Called::default(), Called::default());
    let (e, s) = (except.clone(), else_.clone());
    engine
        .on_failure(
            Catch::kind(ZERO_DIVISION),
            FailureHandler::immediate(move |_| {
                e.hit();
                Ok(None)
            }),
        )
        .unwrap();
    engine.on_success(Callable::suspending(move |_| {
        let s = s.clone();
        async move {
            tokio::task::yield_now().await;
            s.hit();
            Ok(None)
        }
    }));

    let f = engine.wrap("f", Callable::suspending(|()| async { Ok(None) }));
    assert_eq!(f.call(()).await, Ok(None));
    assert!(!except.get());
    assert!(else_.get());
}

#[tokio::test]
async fn test_suspending_operation_with_immediate_handlers() {
    let (engine, _sink) = engine::<()>(false);
    let (except, finally) = (Called::default(), Called::default());
    let (e, c) = (except.clone(), finally.clone());
    engine
        .on_failure(
            Catch::kind(ZERO_DIVISION).bind_as("e"),
            FailureHandler::immediate(move |inv: Invocation<()>| {
                assert_eq!(
                    *inv.context().get::<TestError>("e").unwrap(),
                    TestError::ZeroDivision
                );
                e.hit();
                Ok(None)
            }),
        )
        .unwrap();
    engine.on_cleanup(Callable::immediate(move |_| {
        c.hit();
        Ok(None)
    }));

    let f = engine.wrap(
        "f",
        Callable::suspending(|()| async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Err(TestError::ZeroDivision)
        }),
    );
    f.call(()).await.unwrap();
    assert!(except.get());
    assert!(finally.get());
}

#[tokio::test]
async fn test_immediate_operation_with_suspending_handler_error() {
    let (engine, _sink) = engine::<()>(false);
    engine
        .on_failure(
            Catch::kind(LOOKUP),
            FailureHandler::suspending_with_error(|_, err: Arc<TestError>| async move {
                tokio::task::yield_now().await;
                Ok(Some(format!("async {err}")))
            }),
        )
        .unwrap();

    let f = engine.wrap(
        "f",
        Callable::immediate(|()| Err(TestError::Key("k".into()))),
    );
    assert_eq!(f.call(()).await, Ok(Some("async missing key 'k'".to_string())));
}

#[tokio::test]
async fn test_context_survives_suspension_points() {
    let (engine, _sink) = engine::<u32>(false);
    engine
        .on_failure(
            Catch::kind(ARITHMETIC),
            FailureHandler::suspending(|inv: Invocation<u32>| async move {
                tokio::task::yield_now().await;
                let v = context::get::<u32>("n").unwrap();
                assert_eq!(*v, *inv.args());
                Ok(Some(format!("n={v}")))
            }),
        )
        .unwrap();

    let f = engine.wrap(
        "f",
        Callable::suspending(|n: u32| async move {
            context::set("n", n).unwrap();
            tokio::task::yield_now().await;
            assert!(context::contains("n").unwrap());
            Err(TestError::Overflow)
        }),
    );
    assert_eq!(f.call(5).await, Ok(Some("n=5".to_string())));
    assert!(context::current().is_err());
}

#[tokio::test]
async fn test_wrapped_call_can_be_spawned() {
    let (engine, _sink) = engine::<u32>(false);
    engine
        .on_failure(
            Catch::kind(ErrorKind::ROOT),
            FailureHandler::immediate(|inv: Invocation<u32>| {
                Ok(Some(format!("task {}", inv.args())))
            }),
        )
        .unwrap();
    let f = engine.wrap("f", Callable::immediate(|_n: u32| Err(TestError::Overflow)));

    let handle = tokio::spawn({
        let f = f.clone();
        async move { f.call(3).await }
    });
    assert_eq!(handle.await.unwrap(), Ok(Some("task 3".to_string())));
}
