//! Concurrent calls through one interceptor and one dispatcher.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use rand::Rng;

use twinrun::BeanRegistry;
use twinrun::ClassBuilder;
use twinrun::Config;
use twinrun::Dispatcher;
use twinrun::Fault;
use twinrun::Interceptor;
use twinrun::LoopbackTransport;

struct Ledger {
    hits: AtomicUsize,
}

impl Ledger {
    /// Sleeps for `delay_ms` on the calling thread, then echoes `n * 2`.
    fn double(&self, n: i64, delay_ms: i32) -> Result<i64, Fault> {
        std::thread::sleep(Duration::from_millis(delay_ms as u64));
        self.hits.fetch_add(1, Ordering::SeqCst);
        Ok(n * 2)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_do_not_block_each_other() -> anyhow::Result<()> {
    let remote = Arc::new(Ledger { hits: AtomicUsize::new(0) });
    let class = ClassBuilder::<Ledger>::new("Ledger")
        .method2("double", |l, n: i64, delay: i32| l.double(n, delay))
        .build();
    let registry = Arc::new(BeanRegistry::new());
    registry.register("ledger", remote.clone(), class);

    let server = Config::builder().secret("s").build();
    let dispatcher = Arc::new(Dispatcher::new(&server, registry));

    let client = Config::builder().enabled(true).secret("s").bean("ledger").build();
    let interceptor = Arc::new(Interceptor::new(
        Arc::new(client),
        Arc::new(LoopbackTransport::new(dispatcher)),
    ));
    let local = Arc::new(Ledger { hits: AtomicUsize::new(0) });
    let proxy = Arc::new(interceptor.decorate("ledger", local.clone()));

    let mut rng = rand::thread_rng();
    let jobs: Vec<(i64, i32)> = (0..64).map(|_| (rng.gen_range(-1000..1000), rng.gen_range(0..20))).collect();

    let mut handles = Vec::new();
    for (n, delay) in jobs.clone() {
        let proxy = proxy.clone();
        handles.push(tokio::spawn(async move {
            proxy
                .call("double", vec![n.into(), delay.into()], move |l| l.double(n, delay))
                .await
        }));
    }

    for ((n, _), handle) in jobs.into_iter().zip(handles) {
        assert_eq!(handle.await??, n * 2);
    }
    assert_eq!(remote.hits.load(Ordering::SeqCst), 64);
    assert_eq!(local.hits.load(Ordering::SeqCst), 0);
    Ok(())
}
