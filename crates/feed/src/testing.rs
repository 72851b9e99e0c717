// In-memory transport for unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::FeedError;
use crate::transport::{HttpResponse, Transport};

/// Answers requests from per-URL scripts and records every URL it was asked for.
///
/// Each URL has a queue of outcomes; the last one repeats once the others are
/// used up. URLs without a script fail with a network error.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Result<HttpResponse, FeedError>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, url: &str, outcome: Result<HttpResponse, FeedError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(outcome);
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.push(
            url,
            Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    pub fn fail_network(&self, url: &str) {
        self.push(
            url,
            Err(FeedError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        );
    }

    pub fn fail_timeout(&self, url: &str) {
        self.push(
            url,
            Err(FeedError::Timeout {
                url: url.to_string(),
                after: Duration::from_millis(5000),
            }),
        );
    }

    /// Drops the script for `url`, so it fails like an unknown host again.
    pub fn forget(&self, url: &str) {
        self.scripts.lock().unwrap().remove(url);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.as_str() == url).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<HttpResponse, FeedError> {
        self.calls.lock().unwrap().push(url.to_string());

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(FeedError::Network {
                url: url.to_string(),
                message: "no route to host".to_string(),
            }),
        }
    }
}
