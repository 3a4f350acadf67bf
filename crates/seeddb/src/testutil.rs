//! Doubles shared by the unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::transport::{Response, Transport};

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Scripted transport counting every request
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, Result<Response>>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .insert(url.to_string(), Ok(Response::new(status, body)));
    }

    pub fn fail(&self, url: &str, err: Error) {
        self.routes.lock().insert(url.to_string(), Err(err));
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.routes
            .lock()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(Error::Transport(format!("no route for {url}"))))
    }
}

/// Clock that only moves when told to
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += chrono::Duration::from_std(by).unwrap();
    }

    pub fn source(&self) -> impl Fn() -> DateTime<Utc> + Send + Sync + 'static {
        let now = Arc::clone(&self.now);
        move || *now.lock()
    }
}
