//! Concurrent burst tests for the admission-control layer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bot_guard::security::Category;
use bot_guard::{Dispatch, InboundEvent, UserId};

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_burst_from_one_user_admits_exactly_the_limit() {
    let (guard, _) = common::guard();
    let guard = Arc::new(guard);

    let concurrency = 20;
    let requests_per_task = 50;
    let start = Instant::now();

    let mut tasks = Vec::new();
    for task in 0..concurrency {
        let guard = Arc::clone(&guard);
        tasks.push(tokio::spawn(async move {
            let mut admitted = 0usize;
            for i in 0..requests_per_task {
                let event = InboundEvent::message(format!("{task}-{i}"), common::user(77), "hello");
                if guard.gate().dispatch(event, |_| async {}).await.is_handled() {
                    admitted += 1;
                }
            }
            admitted
        }));
    }

    let mut admitted = 0;
    for task in tasks {
        admitted += task.await.unwrap();
    }

    // message category: 30 per 60s
    assert_eq!(admitted, 30);
    let info = guard
        .limiter()
        .get_limit_info(UserId(77), Category::Message);
    assert_eq!(info.used, 30);
    assert_eq!(info.remaining, 0);

    println!(
        "{} events in {:?}",
        concurrency * requests_per_task,
        start.elapsed()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redeliveries_run_handler_once() {
    let (guard, _) = common::guard();
    let guard = Arc::new(guard);

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let guard = Arc::clone(&guard);
        tasks.push(tokio::spawn(async move {
            let event = InboundEvent::callback("cb-burst", common::user(9), "expense:delete:17");
            guard
                .gate()
                .dispatch(event, |_| async {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                })
                .await
        }));
    }

    let mut handled = 0;
    let mut duplicates = 0;
    for task in tasks {
        match task.await.unwrap() {
            Dispatch::Handled { .. } => handled += 1,
            Dispatch::Duplicate => duplicates += 1,
            Dispatch::Rejected { error } => panic!("unexpected rejection: {error}"),
        }
    }

    assert_eq!(handled, 1);
    assert_eq!(duplicates, 15);
    assert_eq!(guard.dedup().get_stats().total_tracked, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_users_do_not_interfere() {
    let (guard, _) = common::guard_with(common::uniform_config(3, 60));
    let guard = Arc::new(guard);

    let mut tasks = Vec::new();
    for user in 1..=50 {
        let guard = Arc::clone(&guard);
        tasks.push(tokio::spawn(async move {
            let mut admitted = 0;
            for i in 0..5 {
                let event =
                    InboundEvent::message(format!("{user}-{i}"), common::user(user), "/start");
                if guard.gate().dispatch(event, |_| async {}).await.is_handled() {
                    admitted += 1;
                }
            }
            admitted
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap(), 3);
    }

    let stats = guard.middleware().get_security_stats();
    assert_eq!(stats.rate_limiter.total_users, 50);
    assert_eq!(stats.rate_limiter.total_requests, 150);
}
