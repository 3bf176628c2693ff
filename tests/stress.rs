mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use common::counting;
use eagerpool::policies::{AbortPolicy, CallerRunsPolicy, DiscardOldestPolicy};
use eagerpool::{Config, EagerPool, PoolBuilder, RejectionStrategy, TaskFn};

const PRODUCERS: usize = 8;
const TASKS_PER_PRODUCER: usize = 500;

fn pool(name: &str, strategy: Arc<dyn RejectionStrategy>) -> EagerPool {
    let cfg = Config {
        name: name.into(),
        core_size: 4,
        max_size: 8,
        queue_capacity: 32,
        keep_alive: Duration::from_millis(20),
        ..Config::default()
    };
    PoolBuilder::new(cfg)
        .with_rejection_strategy(strategy)
        .build()
        .unwrap()
}

/// Runs the producers and returns how many submissions returned `Ok` and `Err`.
fn hammer(pool: &EagerPool, executed: &Arc<AtomicUsize>) -> (usize, usize) {
    let start = Arc::new(Barrier::new(PRODUCERS));
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let pool = pool.clone();
            let start = Arc::clone(&start);
            let executed = Arc::clone(executed);
            thread::spawn(move || {
                start.wait();
                let (mut accepted, mut rejected) = (0, 0);
                for i in 0..TASKS_PER_PRODUCER {
                    let executed = Arc::clone(&executed);
                    let task = TaskFn::arc("work", move || {
                        if i % 7 == 0 {
                            thread::sleep(Duration::from_micros(200));
                        }
                        executed.fetch_add(1, Ordering::SeqCst);
                    });
                    match pool.submit(task) {
                        Ok(()) => accepted += 1,
                        Err(_) => rejected += 1,
                    }
                }
                (accepted, rejected)
            })
        })
        .collect();
    producers
        .into_iter()
        .map(|p| p.join().unwrap())
        .fold((0, 0), |(a, r), (pa, pr)| (a + pa, r + pr))
}

fn finish(pool: &EagerPool) {
    pool.shutdown();
    assert!(pool.await_termination(Duration::from_secs(30)));
    assert_eq!(pool.in_flight_count(), 0);
}

#[test]
fn abort_accounting_balances_under_load() {
    let pool = pool("stress-abort", Arc::new(AbortPolicy));
    let executed = Arc::new(AtomicUsize::new(0));

    let (accepted, rejected) = hammer(&pool, &executed);
    let total = PRODUCERS * TASKS_PER_PRODUCER;
    finish(&pool);

    assert_eq!(accepted + rejected, total);
    assert_eq!(executed.load(Ordering::SeqCst), accepted);
    assert_eq!(pool.completed_count(), accepted as u64);
    assert!(pool.rejected_count() >= rejected as u64);
    assert!(pool.largest_pool_size() <= 8);
}

#[test]
fn caller_runs_executes_everything() {
    let pool = pool("stress-caller", Arc::new(CallerRunsPolicy));
    let executed = Arc::new(AtomicUsize::new(0));

    let (accepted, rejected) = hammer(&pool, &executed);
    finish(&pool);

    let total = PRODUCERS * TASKS_PER_PRODUCER;
    assert_eq!(accepted, total);
    assert_eq!(rejected, 0);
    assert_eq!(executed.load(Ordering::SeqCst), total);
}

#[test]
fn discard_oldest_never_leaks_in_flight() {
    let pool = pool("stress-oldest", Arc::new(DiscardOldestPolicy));
    let executed = Arc::new(AtomicUsize::new(0));

    let (accepted, rejected) = hammer(&pool, &executed);
    finish(&pool);

    assert_eq!((accepted, rejected), (PRODUCERS * TASKS_PER_PRODUCER, 0));
    assert!(executed.load(Ordering::SeqCst) <= accepted);
    assert_eq!(pool.completed_count(), executed.load(Ordering::SeqCst) as u64);
}

#[test]
fn removal_races_with_workers_without_double_counting() {
    let pool = pool("stress-remove", Arc::new(AbortPolicy));
    let hits = Arc::new(AtomicUsize::new(0));
    let mut removed = 0;
    let mut accepted = 0;

    for _ in 0..2_000 {
        let task = counting("maybe", &hits);
        if pool.submit(Arc::clone(&task)).is_ok() {
            accepted += 1;
            if pool.remove(&task) {
                removed += 1;
            }
        }
    }
    finish(&pool);

    assert_eq!(hits.load(Ordering::SeqCst) + removed, accepted);
}
