use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use eventstack::{
    AsyncEventHandler, Dispatcher, DispatcherConfig, EventHandler, FailureKind, FailurePolicy,
    HandlerError, HandlerRegistry, HandlerShape, RegistryError,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug)]
struct OrderPlaced {
    id: u64,
}

#[derive(Clone, Debug)]
struct OrderShipped {
    #[allow(dead_code)]
    id: u64,
}

type Log = Arc<Mutex<Vec<String>>>;

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().map(|l| l.clone()).unwrap_or_default()
}

/// Appends its name to a shared log, optionally after a delay or with a failure.
struct Recorder {
    name: &'static str,
    log: Log,
    delay: Duration,
    fail: Option<&'static str>,
}

impl Recorder {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: Arc::clone(log),
            delay: Duration::ZERO,
            fail: None,
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing(mut self, msg: &'static str) -> Self {
        self.fail = Some(msg);
        self
    }

    fn record(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.push(self.name.to_string());
        }
    }

    fn result(&self) -> Result<(), HandlerError> {
        match self.fail {
            Some(msg) => Err(HandlerError::fail(msg)),
            None => Ok(()),
        }
    }
}

impl EventHandler<OrderPlaced> for Recorder {
    fn handle(&self, _event: &OrderPlaced) -> Result<(), HandlerError> {
        self.record();
        self.result()
    }

    fn name(&self) -> &str {
        self.name
    }
}

#[async_trait]
impl AsyncEventHandler<OrderPlaced> for Recorder {
    async fn handle_async(
        &self,
        _event: &OrderPlaced,
        ctx: CancellationToken,
    ) -> Result<(), HandlerError> {
        if !self.delay.is_zero() {
            tokio::select! {
                _ = ctx.cancelled() => return Err(HandlerError::Canceled),
                _ = tokio::time::sleep(self.delay) => {}
            }
        }
        self.record();
        self.result()
    }

    fn name(&self) -> &str {
        self.name
    }
}

fn dispatcher(cfg: DispatcherConfig, registry: HandlerRegistry) -> Arc<Dispatcher> {
    Dispatcher::builder(cfg).with_registry(registry).build()
}

#[tokio::test]
async fn publish_without_handlers_succeeds() {
    let d = dispatcher(DispatcherConfig::default(), HandlerRegistry::new());
    let res = d.publish(&OrderPlaced { id: 1 }, &CancellationToken::new()).await;
    assert!(res.is_ok());
}

#[tokio::test]
async fn every_handler_runs_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = HandlerRegistry::new();
    for _ in 0..3 {
        let c = Arc::clone(&calls);
        let registered = registry.register_fn::<OrderPlaced, _>("count", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(registered.is_ok());
    }
    for _ in 0..2 {
        let c = Arc::clone(&calls);
        let registered =
            registry.register_async_fn::<OrderPlaced, _, _>("count-async", move |_, _| {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            });
        assert!(registered.is_ok());
    }

    let registry = Arc::new(registry);
    for cfg in [DispatcherConfig::sequential(), DispatcherConfig::concurrent()] {
        calls.store(0, Ordering::SeqCst);
        let d = Dispatcher::new(cfg, Arc::clone(&registry));
        assert!(d.publish_uncancellable(&OrderPlaced { id: 1 }).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }
}

#[tokio::test]
async fn failing_handler_is_isolated() {
    let log = new_log();
    let mut registry = HandlerRegistry::new();
    let ids = [
        registry.register::<OrderPlaced, _>(Arc::new(Recorder::new("a", &log))),
        registry.register_async::<OrderPlaced, _>(Arc::new(Recorder::new("b", &log).failing("bad"))),
        registry.register::<OrderPlaced, _>(Arc::new(Recorder::new("c", &log))),
    ];
    let [Ok(_), Ok(b), Ok(_)] = ids else {
        panic!("registration failed");
    };

    let d = dispatcher(DispatcherConfig::sequential(), registry);
    let Err(agg) = d.publish_uncancellable(&OrderPlaced { id: 1 }).await else {
        panic!("expected aggregate failure");
    };

    assert_eq!(agg.len(), 1);
    assert_eq!(agg.failures[0].handler, b);
    assert_eq!(agg.failures[0].shape, HandlerShape::Suspending);
    assert_eq!(agg.failures[0].message(), Some("bad"));
    assert!(agg.skipped.is_empty());
    assert!(agg.trigger.is_none());
    assert_eq!(entries(&log), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn sequential_runs_in_registration_order() {
    let log = new_log();
    let mut registry = HandlerRegistry::new();
    // Earlier handlers sleep longer, so any overlap would reorder the log.
    assert!(registry
        .register_async::<OrderPlaced, _>(Arc::new(
            Recorder::new("first", &log).delayed(Duration::from_millis(30))
        ))
        .is_ok());
    assert!(registry
        .register::<OrderPlaced, _>(Arc::new(Recorder::new("second", &log)))
        .is_ok());
    assert!(registry
        .register_async::<OrderPlaced, _>(Arc::new(
            Recorder::new("third", &log).delayed(Duration::from_millis(10))
        ))
        .is_ok());
    assert!(registry
        .register_async::<OrderPlaced, _>(Arc::new(Recorder::new("fourth", &log)))
        .is_ok());

    let d = dispatcher(DispatcherConfig::sequential(), registry);
    assert!(d.publish_uncancellable(&OrderPlaced { id: 1 }).await.is_ok());
    assert_eq!(entries(&log), vec!["first", "second", "third", "fourth"]);
}

#[tokio::test(start_paused = true)]
async fn concurrent_latency_is_bounded_by_slowest() {
    let log = new_log();
    let mut registry = HandlerRegistry::new();
    for name in ["h1", "h2", "h3", "h4", "h5"] {
        let h = Recorder::new(name, &log).delayed(Duration::from_millis(100));
        assert!(registry.register_async::<OrderPlaced, _>(Arc::new(h)).is_ok());
    }
    let registry = Arc::new(registry);

    let concurrent = Dispatcher::new(DispatcherConfig::concurrent(), Arc::clone(&registry));
    let started = Instant::now();
    assert!(concurrent.publish_uncancellable(&OrderPlaced { id: 1 }).await.is_ok());
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_millis(200), "took {elapsed:?}");

    let sequential = Dispatcher::new(DispatcherConfig::sequential(), registry);
    let started = Instant::now();
    assert!(sequential.publish_uncancellable(&OrderPlaced { id: 1 }).await.is_ok());
    assert!(started.elapsed() >= Duration::from_millis(500));

    assert_eq!(entries(&log).len(), 10);
}

#[tokio::test(start_paused = true)]
async fn concurrent_failures_follow_registration_order() {
    let log = new_log();
    let mut registry = HandlerRegistry::new();
    let slow = registry.register_async::<OrderPlaced, _>(Arc::new(
        Recorder::new("slow", &log)
            .delayed(Duration::from_millis(50))
            .failing("slow failed"),
    ));
    let fast = registry.register_async::<OrderPlaced, _>(Arc::new(
        Recorder::new("fast", &log).failing("fast failed"),
    ));
    let (Ok(slow), Ok(fast)) = (slow, fast) else {
        panic!("registration failed");
    };

    let d = dispatcher(DispatcherConfig::concurrent(), registry);
    let Err(agg) = d.publish_uncancellable(&OrderPlaced { id: 1 }).await else {
        panic!("expected aggregate failure");
    };

    // Completion order was fast, slow; the report is still registration order.
    assert_eq!(entries(&log), vec!["fast", "slow"]);
    let handlers: Vec<_> = agg.failures.iter().map(|f| f.handler.clone()).collect();
    assert_eq!(handlers, vec![slow, fast]);
}

#[tokio::test(start_paused = true)]
async fn cancellation_marks_in_flight_handlers_cancelled() {
    let log = new_log();
    let mut registry = HandlerRegistry::new();
    let quick = registry.register_async::<OrderPlaced, _>(Arc::new(Recorder::new("quick", &log)));
    let slow = registry.register_async::<OrderPlaced, _>(Arc::new(
        Recorder::new("slow", &log).delayed(Duration::from_secs(10)),
    ));
    let (Ok(quick), Ok(slow)) = (quick, slow) else {
        panic!("registration failed");
    };

    let d = dispatcher(DispatcherConfig::concurrent(), registry);
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let Err(agg) = d.publish(&OrderPlaced { id: 1 }, &token).await else {
        panic!("expected aggregate failure");
    };

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(agg.len(), 1);
    assert_eq!(agg.failures[0].handler, slow);
    assert_eq!(agg.failures[0].kind, FailureKind::Cancelled);
    assert!(agg.failure_of(&quick).is_none());
    assert!(agg.trigger.is_none());
    assert_eq!(entries(&log), vec!["quick"]);
}

#[tokio::test]
async fn pre_cancelled_token_reaches_suspending_handlers_only() {
    let log = new_log();
    let mut registry = HandlerRegistry::new();
    let blocking = registry.register::<OrderPlaced, _>(Arc::new(Recorder::new("blocking", &log)));
    let checker = registry.register_async_fn::<OrderPlaced, _, _>("checker", |_, ctx| async move {
        if ctx.is_cancelled() {
            return Err(HandlerError::Canceled);
        }
        Ok(())
    });
    let (Ok(_), Ok(checker)) = (blocking, checker) else {
        panic!("registration failed");
    };

    let token = CancellationToken::new();
    token.cancel();

    let d = dispatcher(DispatcherConfig::sequential(), registry);
    let Err(agg) = d.publish(&OrderPlaced { id: 1 }, &token).await else {
        panic!("expected aggregate failure");
    };
    assert_eq!(agg.cancelled().count(), 1);
    assert_eq!(agg.failures[0].handler, checker);
    assert_eq!(entries(&log), vec!["blocking"]);
}

#[test]
fn duplicate_registration_is_rejected() {
    let log = new_log();
    let mut registry = HandlerRegistry::new();
    let h = Arc::new(Recorder::new("dup", &log));

    assert!(registry.register::<OrderPlaced, _>(h.clone()).is_ok());
    let err = registry.register::<OrderPlaced, _>(h.clone());
    let Err(RegistryError::DuplicateRegistration { handler, shape, .. }) = err else {
        panic!("expected duplicate registration error");
    };
    assert_eq!(handler, "dup");
    assert_eq!(shape, HandlerShape::Blocking);

    // Other shape and other instance are fine.
    assert!(registry.register_async::<OrderPlaced, _>(h).is_ok());
    assert!(registry
        .register::<OrderPlaced, _>(Arc::new(Recorder::new("dup", &log)))
        .is_ok());
    assert_eq!(registry.handler_count::<OrderPlaced>(), 3);
}

#[tokio::test]
async fn second_distinct_handler_is_invoked() {
    let log = new_log();
    let mut registry = HandlerRegistry::new();
    assert!(registry
        .register::<OrderPlaced, _>(Arc::new(Recorder::new("one", &log)))
        .is_ok());
    assert!(registry
        .register::<OrderPlaced, _>(Arc::new(Recorder::new("two", &log)))
        .is_ok());

    let d = dispatcher(DispatcherConfig::default(), registry);
    assert!(d.publish_uncancellable(&OrderPlaced { id: 1 }).await.is_ok());
    assert_eq!(entries(&log), vec!["one", "two"]);
}

#[tokio::test]
async fn order_placed_scenario() {
    let counter = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&counter);

    let mut registry = HandlerRegistry::new();
    let h1 = registry.register_fn::<OrderPlaced, _>("H1", move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let h2 = registry.register_async_fn::<OrderPlaced, _, _>("H2", |_, _| async {
        Err(HandlerError::fail("boom"))
    });
    let (Ok(h1), Ok(h2)) = (h1, h2) else {
        panic!("registration failed");
    };

    let registry = Arc::new(registry);
    for cfg in [DispatcherConfig::sequential(), DispatcherConfig::concurrent()] {
        counter.store(0, Ordering::SeqCst);
        let d = Dispatcher::new(cfg, Arc::clone(&registry));
        let Err(agg) = d.publish(&OrderPlaced { id: 42 }, &CancellationToken::new()).await else {
            panic!("expected aggregate failure");
        };

        assert_eq!(agg.len(), 1);
        assert_eq!(agg.failures[0].handler, h2);
        assert_eq!(agg.failures[0].message(), Some("boom"));
        assert!(agg.failure_of(&h1).is_none());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn sequential_short_circuit_skips_the_rest() {
    let log = new_log();
    let mut registry = HandlerRegistry::new();
    let a = registry.register::<OrderPlaced, _>(Arc::new(Recorder::new("a", &log)));
    let b = registry.register::<OrderPlaced, _>(Arc::new(Recorder::new("b", &log).failing("stop")));
    let c = registry.register_async::<OrderPlaced, _>(Arc::new(Recorder::new("c", &log)));
    let (Ok(_), Ok(b), Ok(c)) = (a, b, c) else {
        panic!("registration failed");
    };

    let cfg = DispatcherConfig::sequential().with_failure_policy(FailurePolicy::ShortCircuit);
    let d = dispatcher(cfg, registry);
    let Err(agg) = d.publish_uncancellable(&OrderPlaced { id: 1 }).await else {
        panic!("expected aggregate failure");
    };

    assert_eq!(agg.trigger.as_ref(), Some(&b));
    assert_eq!(agg.trigger_failure().and_then(|f| f.message()), Some("stop"));
    assert_eq!(agg.skipped, vec![c]);
    assert_eq!(entries(&log), vec!["a", "b"]);
}

#[tokio::test(start_paused = true)]
async fn concurrent_short_circuit_cancels_siblings_not_caller() {
    let log = new_log();
    let mut registry = HandlerRegistry::new();
    let slow = registry.register_async::<OrderPlaced, _>(Arc::new(
        Recorder::new("slow", &log).delayed(Duration::from_secs(10)),
    ));
    let boom = registry.register_async::<OrderPlaced, _>(Arc::new(
        Recorder::new("boom", &log)
            .delayed(Duration::from_millis(10))
            .failing("boom"),
    ));
    let (Ok(slow), Ok(boom)) = (slow, boom) else {
        panic!("registration failed");
    };

    let cfg = DispatcherConfig::concurrent().with_failure_policy(FailurePolicy::ShortCircuit);
    let d = dispatcher(cfg, registry);
    let token = CancellationToken::new();
    let started = Instant::now();
    let Err(agg) = d.publish(&OrderPlaced { id: 1 }, &token).await else {
        panic!("expected aggregate failure");
    };

    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!token.is_cancelled());
    assert_eq!(agg.trigger.as_ref(), Some(&boom));
    assert_eq!(agg.len(), 2);
    // Registration order: slow (cancelled) first, then the trigger.
    assert_eq!(agg.failures[0].handler, slow);
    assert!(agg.failures[0].is_cancelled());
    assert_eq!(agg.failures[1].handler, boom);
    assert!(!agg.failures[1].is_cancelled());
}

#[tokio::test]
async fn concurrent_short_circuit_on_blocking_skips_suspending() {
    let log = new_log();
    let mut registry = HandlerRegistry::new();
    let a = registry.register_async::<OrderPlaced, _>(Arc::new(Recorder::new("a", &log)));
    let b = registry.register::<OrderPlaced, _>(Arc::new(Recorder::new("b", &log).failing("no")));
    let c = registry.register::<OrderPlaced, _>(Arc::new(Recorder::new("c", &log)));
    let (Ok(a), Ok(b), Ok(c)) = (a, b, c) else {
        panic!("registration failed");
    };

    let cfg = DispatcherConfig::concurrent().with_failure_policy(FailurePolicy::ShortCircuit);
    let d = dispatcher(cfg, registry);
    let Err(agg) = d.publish_uncancellable(&OrderPlaced { id: 1 }).await else {
        panic!("expected aggregate failure");
    };

    assert_eq!(agg.trigger.as_ref(), Some(&b));
    assert_eq!(agg.skipped, vec![a, c]);
    assert_eq!(entries(&log), vec!["b"]);
}

#[tokio::test]
async fn panicking_handler_is_reported_not_propagated() {
    let log = new_log();
    let mut registry = HandlerRegistry::new();
    let p = registry.register_fn::<OrderPlaced, _>("panics", |e| {
        if e.id == 1 {
            panic!("handler exploded");
        }
        Ok(())
    });
    let ok = registry.register::<OrderPlaced, _>(Arc::new(Recorder::new("after", &log)));
    let (Ok(p), Ok(_)) = (p, ok) else {
        panic!("registration failed");
    };

    let d = dispatcher(DispatcherConfig::default(), registry);
    let Err(agg) = d.publish_uncancellable(&OrderPlaced { id: 1 }).await else {
        panic!("expected aggregate failure");
    };
    assert_eq!(agg.failures[0].handler, p);
    assert_eq!(
        agg.failures[0].kind,
        FailureKind::Panicked {
            info: "handler exploded".into()
        }
    );
    assert_eq!(entries(&log), vec!["after"]);
}

#[tokio::test]
async fn dispatch_matches_exact_type_only() {
    let placed = Arc::new(AtomicUsize::new(0));
    let shipped = Arc::new(AtomicUsize::new(0));
    let (p, s) = (Arc::clone(&placed), Arc::clone(&shipped));

    let mut registry = HandlerRegistry::new();
    assert!(registry
        .register_fn::<OrderPlaced, _>("placed", move |_| {
            p.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .is_ok());
    assert!(registry
        .register_fn::<OrderShipped, _>("shipped", move |_| {
            s.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .is_ok());

    let d = dispatcher(DispatcherConfig::default(), registry);
    assert!(d.publish_uncancellable(&OrderShipped { id: 1 }).await.is_ok());
    assert!(d.publish_uncancellable(&OrderShipped { id: 2 }).await.is_ok());
    assert_eq!(placed.load(Ordering::SeqCst), 0);
    assert_eq!(shipped.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn publish_dyn_resolves_runtime_type() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let mut registry = HandlerRegistry::new();
    assert!(registry
        .register_fn::<OrderPlaced, _>("placed", move |e| {
            c.fetch_add(e.id as usize, Ordering::SeqCst);
            Ok(())
        })
        .is_ok());
    let d = dispatcher(DispatcherConfig::default(), registry);
    let token = CancellationToken::new();

    let boxed: Box<dyn std::any::Any + Send + Sync> = Box::new(OrderPlaced { id: 3 });
    assert!(d.publish_dyn(boxed.as_ref(), &token).await.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    // Unknown runtime type: no handlers, no error.
    let other: Box<dyn std::any::Any + Send + Sync> = Box::new(7u32);
    assert!(d.publish_dyn(other.as_ref(), &token).await.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn spawn_publish_returns_inspectable_outcome() {
    let mut registry = HandlerRegistry::new();
    assert!(registry
        .register_async_fn::<OrderPlaced, _, _>("fails", |e, _| async move {
            Err(HandlerError::fail(format!("order {}", e.id)))
        })
        .is_ok());
    let d = dispatcher(DispatcherConfig::concurrent(), registry);

    let handle = d.spawn_publish(OrderPlaced { id: 9 }, CancellationToken::new());
    let Ok(Err(agg)) = handle.await else {
        panic!("expected aggregate failure from spawned publish");
    };
    assert_eq!(agg.failures[0].message(), Some("order 9"));
}
