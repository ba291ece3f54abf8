//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use di_bootstrap::config::ServiceConfig;
use di_bootstrap::container::{release_fn, BoxError, Release, Slot};

/// Config bound to an ephemeral loopback port.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config
}

/// Ordered record of events shared between providers and assertions.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// A release that records `name` when run.
    pub fn release(&self, name: &'static str) -> impl Release {
        let log = self.clone();
        release_fn(move || -> Result<(), BoxError> {
            log.push(name);
            Ok(())
        })
    }
}

/// Poll until `slot` is filled by a build running elsewhere.
pub async fn wait_for_slot<T: ?Sized>(slot: &Slot<T>) -> Arc<T> {
    for _ in 0..200 {
        if let Some(value) = slot.get() {
            return value;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("slot was never filled");
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{}{}", addr, path)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
