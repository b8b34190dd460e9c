//! End-to-end pool behavior: selection, breaker accounting, recovery.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use client_pool::{ClientPool, Context, PoolError, Strategy};

mod common;
use common::{call_recording, pool_of, TestClient};

const ALL_STRATEGIES: [Strategy; 3] = [Strategy::RoundRobin, Strategy::WeightedRandom, Strategy::Random];

#[tokio::test]
async fn test_round_robin_visits_in_insertion_order() {
    let pool = pool_of(&[("c1", 1), ("c2", 1), ("c3", 1)], 3, Duration::from_secs(5));

    let mut order = Vec::new();
    for _ in 0..6 {
        order.push(call_recording(&pool, Strategy::RoundRobin).await.unwrap());
    }
    assert_eq!(order, ["c1", "c2", "c3", "c1", "c2", "c3"]);
}

#[tokio::test]
async fn test_client_trips_after_max_fails() {
    let pool = ClientPool::new(3, Duration::from_secs(5), Strategy::RoundRobin);
    pool.add_client(TestClient::failing("c1"), "c1", 1);

    for _ in 0..3 {
        let err = call_recording(&pool, Strategy::RoundRobin).await.unwrap_err();
        assert!(matches!(err, PoolError::Operation(_)));
    }

    let status = pool.status();
    assert_eq!(status[0].consecutive_failures, 3);
    assert!(status[0].tripped);

    let err = call_recording(&pool, Strategy::RoundRobin).await.unwrap_err();
    assert!(err.is_no_available_client());
}

#[tokio::test]
async fn test_tripped_client_is_skipped_by_round_robin() {
    let pool = ClientPool::new(1, Duration::from_secs(60), Strategy::RoundRobin);
    pool.add_client(TestClient::failing("c1"), "c1", 1);
    pool.add_client(TestClient::new("c2"), "c2", 1);

    assert!(call_recording(&pool, Strategy::RoundRobin).await.is_err());
    for _ in 0..4 {
        assert_eq!(call_recording(&pool, Strategy::RoundRobin).await.unwrap(), "c2");
    }
}

#[tokio::test(start_paused = true)]
async fn test_recovery_after_cooldown() {
    let pool = ClientPool::new(1, Duration::from_secs(5), Strategy::RoundRobin);
    pool.add_client(TestClient::failing("c1"), "c1", 1);

    assert!(call_recording(&pool, Strategy::RoundRobin).await.is_err());
    assert!(call_recording(&pool, Strategy::RoundRobin)
        .await
        .unwrap_err()
        .is_no_available_client());

    // Expiry is strict: exactly one cooldown is not enough.
    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(call_recording(&pool, Strategy::RoundRobin)
        .await
        .unwrap_err()
        .is_no_available_client());

    tokio::time::advance(Duration::from_millis(1)).await;
    let handle = pool.select(Strategy::RoundRobin).unwrap();
    handle.client().set_failing(false);

    assert_eq!(call_recording(&pool, Strategy::RoundRobin).await.unwrap(), "c1");
    let status = pool.status();
    assert_eq!(status[0].consecutive_failures, 0);
    assert!(!status[0].tripped);
}

#[tokio::test(start_paused = true)]
async fn test_random_strategies_trip_and_recover() {
    for strategy in [Strategy::Random, Strategy::WeightedRandom] {
        let pool = ClientPool::new(2, Duration::from_secs(5), Strategy::RoundRobin);
        pool.add_client(TestClient::failing("c1"), "c1", 3);

        for _ in 0..2 {
            let err = call_recording(&pool, strategy).await.unwrap_err();
            assert!(matches!(err, PoolError::Operation(_)), "{strategy}");
        }
        assert!(call_recording(&pool, strategy).await.unwrap_err().is_no_available_client());

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(
            call_recording(&pool, strategy).await.unwrap_err().is_no_available_client(),
            "{strategy} recovered at exactly the cooldown"
        );

        tokio::time::advance(Duration::from_millis(1)).await;
        pool.select(strategy).unwrap().client().set_failing(false);
        assert_eq!(call_recording(&pool, strategy).await.unwrap(), "c1");
        assert!(!pool.status()[0].tripped);
        assert_eq!(pool.status()[0].consecutive_failures, 0);
    }
}

#[tokio::test]
async fn test_success_resets_failure_count() {
    let pool = ClientPool::new(3, Duration::from_secs(5), Strategy::RoundRobin);
    pool.add_client(TestClient::failing("c1"), "c1", 1);

    for _ in 0..2 {
        assert!(call_recording(&pool, Strategy::RoundRobin).await.is_err());
    }
    assert_eq!(pool.status()[0].consecutive_failures, 2);

    pool.select(Strategy::RoundRobin).unwrap().client().set_failing(false);
    call_recording(&pool, Strategy::RoundRobin).await.unwrap();
    assert_eq!(pool.status()[0].consecutive_failures, 0);

    // Two more failures are tolerated again.
    pool.select(Strategy::RoundRobin).unwrap().client().set_failing(true);
    for _ in 0..2 {
        assert!(call_recording(&pool, Strategy::RoundRobin).await.is_err());
    }
    assert!(!pool.status()[0].tripped);
}

#[tokio::test]
async fn test_weighted_random_follows_weights() {
    let pool = pool_of(&[("c1", 1), ("c2", 2), ("c3", 3)], 3, Duration::from_secs(5));

    let trials = 10_000;
    let mut counts: HashMap<String, u32> = HashMap::new();
    for _ in 0..trials {
        let id = call_recording(&pool, Strategy::WeightedRandom).await.unwrap();
        *counts.entry(id).or_default() += 1;
    }

    for (id, expected) in [("c1", 1.0 / 6.0), ("c2", 2.0 / 6.0), ("c3", 3.0 / 6.0)] {
        let observed = f64::from(counts[id]) / f64::from(trials);
        assert!(
            (observed - expected).abs() < 0.03,
            "{id}: observed {observed}, expected {expected}"
        );
    }
}

#[tokio::test]
async fn test_non_positive_weights_count_as_one() {
    let pool = pool_of(&[("zero", 0), ("negative", -5)], 3, Duration::from_secs(5));
    assert!(pool.status().iter().all(|s| s.weight == 1));

    let trials = 10_000;
    let mut zero = 0u32;
    for _ in 0..trials {
        if call_recording(&pool, Strategy::WeightedRandom).await.unwrap() == "zero" {
            zero += 1;
        }
    }
    let share = f64::from(zero) / f64::from(trials);
    assert!((share - 0.5).abs() < 0.03, "share {share}");
}

#[tokio::test]
async fn test_empty_pool_has_no_available_client() {
    let pool: ClientPool<TestClient> = ClientPool::new(3, Duration::from_secs(5), Strategy::RoundRobin);
    let invoked = AtomicU32::new(0);

    for strategy in ALL_STRATEGIES {
        let invoked = &invoked;
        let err = pool
            .execute_with(Context::new(), strategy, move |_ctx, client: Arc<TestClient>| async move {
                invoked.fetch_add(1, Ordering::SeqCst);
                client.call().await
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PoolError::NoAvailableClient));
    }
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_every_strategy_reaches_every_client() {
    let pool = pool_of(&[("c1", 1), ("c2", 1), ("c3", 1)], 3, Duration::from_secs(5));

    for strategy in ALL_STRATEGIES {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..300 {
            seen.insert(call_recording(&pool, strategy).await.unwrap());
        }
        assert_eq!(seen.len(), 3, "{strategy} missed a client");
    }
}

#[tokio::test]
async fn test_panic_counts_as_single_failure() {
    let pool = ClientPool::new(3, Duration::from_secs(5), Strategy::RoundRobin);
    pool.add_client(TestClient::new("c1"), "c1", 1);

    let err = pool
        .execute(Context::new(), |_ctx, client: Arc<TestClient>| async move {
            if client.id == "c1" {
                panic!("operation exploded");
            }
            client.call().await
        })
        .await
        .unwrap_err();

    match err {
        PoolError::PanicRecovered(message) => assert!(message.contains("operation exploded")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(pool.status()[0].consecutive_failures, 1);

    // The pool keeps serving after a panic.
    pool.execute(Context::new(), |_ctx, client: Arc<TestClient>| async move { client.call().await })
        .await
        .unwrap();
    assert_eq!(pool.status()[0].consecutive_failures, 0);
}

#[tokio::test]
async fn test_cancelled_call_is_recorded_as_failure() {
    let pool = ClientPool::new(3, Duration::from_secs(5), Strategy::RoundRobin);
    pool.add_client(TestClient::new("c1"), "c1", 1);

    let token = CancellationToken::new();
    token.cancel();
    let ctx = Context::new().with_cancellation(token);

    let err = pool
        .execute(ctx, |ctx, client: Arc<TestClient>| async move {
            if ctx.is_cancelled() {
                return Err(format!("{}: cancelled", client.id).into());
            }
            client.call().await
        })
        .await
        .unwrap_err();

    assert!(matches!(err, PoolError::Operation(_)));
    assert_eq!(pool.status()[0].consecutive_failures, 1);
}

#[tokio::test]
async fn test_select_does_not_touch_breakers() {
    let pool = pool_of(&[("c1", 1)], 1, Duration::from_secs(5));
    let handle = pool.select(Strategy::Random).unwrap();
    assert_eq!(handle.id(), "c1");
    assert_eq!(handle.client().calls(), 0);
    assert_eq!(pool.status()[0].consecutive_failures, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_are_all_accounted() {
    let pool = Arc::new(pool_of(&[("c1", 1), ("c2", 2), ("c3", 3)], 3, Duration::from_secs(5)));

    let mut tasks = Vec::new();
    for worker in 0..8 {
        let pool = pool.clone();
        tasks.push(tokio::spawn(async move {
            let strategy = ALL_STRATEGIES[worker % ALL_STRATEGIES.len()];
            for _ in 0..250 {
                pool.execute_with(Context::new(), strategy, |_ctx, client: Arc<TestClient>| async move {
                    tokio::task::yield_now().await;
                    client.call().await
                })
                .await
                .unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let mut total = 0;
    for _ in 0..pool.len() {
        total += pool.select(Strategy::RoundRobin).unwrap().client().calls();
    }
    assert_eq!(total, 8 * 250);
    assert!(pool.status().iter().all(|s| s.consecutive_failures == 0 && !s.tripped));
}
