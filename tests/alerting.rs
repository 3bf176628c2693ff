mod common;

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use common::{Latch, blocking, counting};
use eagerpool::policies::DiscardPolicy;
use eagerpool::{Alert, AlertConfig, AlertSink, Config, EagerPool, PoolBuilder};

#[derive(Default)]
struct Recorder {
    alerts: Mutex<Vec<Alert>>,
}

impl AlertSink for Recorder {
    fn deliver(&self, alert: Alert) {
        self.alerts.lock().unwrap().push(alert);
    }
}

fn alert_config(threshold: u64, cooldown: Duration) -> AlertConfig {
    AlertConfig {
        enabled: true,
        threshold_per_window: threshold,
        cooldown,
        ..AlertConfig::default()
    }
}

/// core 1, max 1, queue 1: the third concurrent submission is rejected.
fn tight_config(name: &str, alert: AlertConfig) -> Config {
    Config {
        name: name.into(),
        core_size: 1,
        max_size: 1,
        queue_capacity: 1,
        alert,
        ..Config::default()
    }
}

fn saturate(pool: &EagerPool, latch: &Latch, hits: &Arc<AtomicUsize>) {
    pool.submit(blocking(latch)).unwrap();
    pool.submit(counting("queued", hits)).unwrap();
}

#[test]
fn rejection_storm_raises_one_alert_per_cooldown() {
    let recorder = Arc::new(Recorder::default());
    let pool = PoolBuilder::new(tight_config(
        "alert-test",
        alert_config(1, Duration::from_secs(60)),
    ))
    .with_rejection_strategy(Arc::new(DiscardPolicy))
    .with_alert_sink(recorder.clone())
    .build()
    .unwrap();

    let latch = Latch::new();
    let hits = Arc::new(AtomicUsize::new(0));
    saturate(&pool, &latch, &hits);
    for _ in 0..5 {
        pool.submit(counting("dropped", &hits)).unwrap();
    }

    assert_eq!(pool.rejected_count(), 5);
    assert!(pool.rejected_in_window() >= 5);
    {
        let alerts = recorder.alerts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].pool, "alert-test");
        assert!(alerts[0].body.contains("pool=alert-test"));
        assert!(alerts[0].body.contains("rejected(total)=1"));
        assert!(alerts[0].body.contains("core=1, max=1, poolSize=1, active="));
    }

    latch.open();
    pool.shutdown();
    assert!(pool.await_termination(Duration::from_secs(5)));
    assert_eq!(pool.in_flight_count(), 0);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn threshold_must_be_reached_within_the_window() {
    let recorder = Arc::new(Recorder::default());
    let pool = PoolBuilder::new(tight_config("threshold", alert_config(3, Duration::ZERO)))
        .with_rejection_strategy(Arc::new(DiscardPolicy))
        .with_alert_sink(recorder.clone())
        .build()
        .unwrap();

    let latch = Latch::new();
    let hits = Arc::new(AtomicUsize::new(0));
    saturate(&pool, &latch, &hits);

    pool.submit(counting("r1", &hits)).unwrap();
    pool.submit(counting("r2", &hits)).unwrap();
    assert!(recorder.alerts.lock().unwrap().is_empty());
    pool.submit(counting("r3", &hits)).unwrap();
    assert_eq!(recorder.alerts.lock().unwrap().len(), 1);

    latch.open();
    pool.shutdown();
    assert!(pool.await_termination(Duration::from_secs(5)));
}

#[test]
fn disabled_alerts_still_count_rejections() {
    let recorder = Arc::new(Recorder::default());
    let mut alert = alert_config(1, Duration::ZERO);
    alert.enabled = false;
    let pool = PoolBuilder::new(tight_config("quiet", alert))
        .with_rejection_strategy(Arc::new(DiscardPolicy))
        .with_alert_sink(recorder.clone())
        .build()
        .unwrap();
    assert!(!pool.is_alert_enabled());

    let latch = Latch::new();
    let hits = Arc::new(AtomicUsize::new(0));
    saturate(&pool, &latch, &hits);
    pool.submit(counting("r1", &hits)).unwrap();
    assert_eq!(pool.rejected_count(), 1);
    assert!(recorder.alerts.lock().unwrap().is_empty());

    pool.set_alert_enabled(true);
    pool.submit(counting("r2", &hits)).unwrap();
    assert_eq!(recorder.alerts.lock().unwrap().len(), 1);

    latch.open();
    pool.shutdown();
    assert!(pool.await_termination(Duration::from_secs(5)));
}

#[test]
fn rejected_counter_can_be_shared_between_pools() {
    let shared = Arc::new(std::sync::atomic::AtomicU64::new(0));
    let build = |name: &str| {
        PoolBuilder::new(tight_config(name, AlertConfig::default()))
            .with_rejection_strategy(Arc::new(DiscardPolicy))
            .with_rejected_counter(Arc::clone(&shared))
            .build()
            .unwrap()
    };
    let a = build("a");
    let b = build("b");

    let latch = Latch::new();
    let hits = Arc::new(AtomicUsize::new(0));
    for pool in [&a, &b] {
        saturate(pool, &latch, &hits);
        pool.submit(counting("dropped", &hits)).unwrap();
    }
    assert_eq!(a.rejected_count(), 2);
    assert_eq!(shared.load(Ordering::SeqCst), 2);

    latch.open();
    for pool in [&a, &b] {
        pool.shutdown();
        assert!(pool.await_termination(Duration::from_secs(5)));
    }
}

/// Accepts one HTTP request, answers 200 and returns the raw request.
fn serve_once(listener: TcpListener) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let length = text[..head_end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if raw.len() >= head_end + 4 + length {
                    break;
                }
            }
        }
        stream
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
            .unwrap();
        String::from_utf8(raw).unwrap()
    })
}

#[test]
fn webhook_receives_the_alert() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/hook", listener.local_addr().unwrap());
    let server = serve_once(listener);

    let mut alert = alert_config(1, Duration::from_secs(60));
    alert.webhook_url = url;
    let pool = PoolBuilder::new(tight_config("hooked", alert))
        .with_rejection_strategy(Arc::new(DiscardPolicy))
        .build()
        .unwrap();

    let latch = Latch::new();
    let hits = Arc::new(AtomicUsize::new(0));
    saturate(&pool, &latch, &hits);
    pool.submit(counting("dropped", &hits)).unwrap();

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /hook"));
    assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
    assert!(request.contains(r#""msgtype":"text""#));
    assert!(request.contains("thread pool rejection alert\\npool=hooked"));

    latch.open();
    pool.shutdown();
    assert!(pool.await_termination(Duration::from_secs(5)));
}
