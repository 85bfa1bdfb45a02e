use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use netcache::backend::{BackendServer, KvOracle};
use netcache::cache::{LearnedCache, StaticRuleCache};
use netcache::cli::assignment::Assignment;
use netcache::client::{query, render};
use netcache::pipeline::Dispatcher;
use netcache::server::{Device, DeviceConfig};
use netcache_common::DEFAULT_SLOTS;

const TIMEOUT: Duration = Duration::from_secs(2);

struct Testbed {
    device: SocketAddr,
    served: Arc<AtomicU64>,
    dispatcher: Arc<Dispatcher>,
}

impl Testbed {
    async fn start(records: &[(u32, u32)], rules: &[(u32, u32)], slots: usize) -> Testbed {
        Testbed::start_on("127.0.0.1:0", "127.0.0.1:0", records, rules, slots).await
    }

    async fn start_on(
        listen: &str,
        upstream_bind: &str,
        records: &[(u32, u32)],
        rules: &[(u32, u32)],
        slots: usize,
    ) -> Testbed {
        let oracle: KvOracle = records
            .iter()
            .map(|&(key, value)| Assignment { key, value })
            .collect();
        let backend = BackendServer::bind("127.0.0.1:0".parse().unwrap(), oracle)
            .await
            .unwrap();
        let backend_addr = backend.local_addr().unwrap();
        let served = backend.served_counter();
        tokio::spawn(backend.run());

        let static_rules: StaticRuleCache = rules.iter().copied().collect();
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(static_rules),
            Arc::new(LearnedCache::new(slots).unwrap()),
        ));
        let config = DeviceConfig {
            listen: listen.parse().unwrap(),
            server: backend_addr,
            upstream_bind: upstream_bind.parse().unwrap(),
        };
        let device = Device::bind(&config, dispatcher.clone()).await.unwrap();
        let device_addr = device.client_addr().unwrap();
        tokio::spawn(device.run());

        Testbed {
            device: device_addr,
            served,
            dispatcher,
        }
    }

    async fn ask(&self, key: u32) -> String {
        self.ask_at(self.device, key).await
    }

    async fn ask_at(&self, target: SocketAddr, key: u32) -> String {
        render(query(target, key, TIMEOUT).await.unwrap())
    }

    fn served(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_query_sequence() {
    let bed = Testbed::start(&[(1, 11), (2, 22)], &[(3, 33)], DEFAULT_SLOTS).await;

    // First time: the server answers.
    assert_eq!(bed.ask(1).await, "11");
    assert_eq!(bed.served(), 1);

    // Second time: learned slot, server untouched.
    assert_eq!(bed.ask(1).await, "11");
    assert_eq!(bed.served(), 1);

    assert_eq!(bed.ask(2).await, "22");
    assert_eq!(bed.served(), 2);

    // Static rule, never reaches the server.
    assert_eq!(bed.ask(3).await, "33");
    assert_eq!(bed.served(), 2);

    assert_eq!(bed.ask(123).await, "NOTFOUND");
    assert_eq!(bed.served(), 3);
    assert_eq!(bed.dispatcher.learned().lookup(123), None);
    assert_eq!(bed.dispatcher.static_rules().lookup(123), None);

    let stats = bed.dispatcher.stats().snapshot();
    assert_eq!(stats.static_hits, 1);
    assert_eq!(stats.learned_hits, 1);
    assert_eq!(stats.forwarded, 3);
    assert_eq!(stats.relayed, 3);
    assert_eq!(stats.learned, 2);
    assert_eq!(stats.not_found, 1);
    assert_eq!(stats.dropped, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_not_found_is_never_cached() {
    let bed = Testbed::start(&[], &[], DEFAULT_SLOTS).await;

    assert_eq!(bed.ask(7).await, "NOTFOUND");
    assert_eq!(bed.ask(7).await, "NOTFOUND");
    assert_eq!(bed.served(), 2);
    assert_eq!(bed.dispatcher.learned().occupied(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_collision_sends_evicted_key_back_to_server() {
    // A single slot makes every pair of keys collide.
    let bed = Testbed::start(&[(1, 11), (2, 22)], &[(3, 33)], 1).await;

    assert_eq!(bed.ask(1).await, "11");
    assert_eq!(bed.ask(2).await, "22");
    assert_eq!(bed.served(), 2);

    // Key 2 took the slot, so key 1 goes back to the server.
    assert_eq!(bed.ask(1).await, "11");
    assert_eq!(bed.served(), 3);

    // The static rule is unaffected by whatever occupies the slot.
    assert_eq!(bed.ask(3).await, "33");
    assert_eq!(bed.served(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_clients() {
    let records: Vec<(u32, u32)> = (0..32).map(|key| (key, key * 10)).collect();
    let bed = Arc::new(Testbed::start(&records, &[], DEFAULT_SLOTS).await);

    let mut tasks = Vec::new();
    for worker in 0..8u32 {
        let bed = bed.clone();
        tasks.push(tokio::spawn(async move {
            for round in 0..8u32 {
                let key = (worker * 8 + round) % 32;
                assert_eq!(bed.ask(key).await, (key * 10).to_string());
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let stats = bed.dispatcher.stats().snapshot();
    assert_eq!(stats.hits() + stats.forwarded, 64);
    assert_eq!(stats.forwarded, bed.served());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ipv4_clients_on_dual_stack_device() {
    let bed = Testbed::start_on("[::]:0", "[::]:0", &[(1, 11)], &[(3, 33)], DEFAULT_SLOTS).await;
    let target = SocketAddr::from(([127, 0, 0, 1], bed.device.port()));

    assert_eq!(bed.ask_at(target, 1).await, "11");
    assert_eq!(bed.served(), 1);
    assert_eq!(bed.ask_at(target, 1).await, "11");
    assert_eq!(bed.ask_at(target, 3).await, "33");
    assert_eq!(bed.ask_at(target, 9).await, "NOTFOUND");
    assert_eq!(bed.served(), 2);

    let stats = bed.dispatcher.stats().snapshot();
    assert_eq!(stats.forwarded, 2);
    assert_eq!(stats.relayed, 2);
    assert_eq!(stats.dropped, 0);
}
