use crate::dto::{Response, ResponseError};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub(crate) type SharedResponse = Arc<Mutex<Response>>;

fn shared(response: Response) -> SharedResponse {
    Arc::new(Mutex::new(response))
}

fn lock(response: &SharedResponse) -> MutexGuard<'_, Response> {
    response.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Pending responses.
///
/// Holds either the single default response or the responses added since the
/// last reset, never both. The last remaining response is handed out forever.
#[derive(Debug)]
pub struct ResponseQueue {
    pending: VecDeque<SharedResponse>,
    holds_default: bool,
}

impl Default for ResponseQueue {
    fn default() -> Self {
        ResponseQueue {
            pending: VecDeque::from([shared(Response::default())]),
            holds_default: true,
        }
    }
}

impl ResponseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn holds_default(&self) -> bool {
        self.holds_default
    }

    pub fn push(&mut self, response: Response) -> ResponseHandle {
        if self.holds_default {
            self.pending.clear();
            self.holds_default = false;
        }
        let response = shared(response);
        self.pending.push_back(response.clone());
        ResponseHandle { inner: response }
    }

    pub fn next(&mut self) -> Response {
        let next = if self.pending.len() > 1 {
            self.pending.pop_front()
        } else {
            self.pending.front().cloned()
        };
        match next {
            Some(response) => lock(&response).clone(),
            // pending is only ever emptied right before a push
            None => Response::default(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A response that already sits in the queue.
///
/// Changes made through the handle show up in what the server sends, as long
/// as the response has not been served yet.
#[derive(Clone, Debug)]
pub struct ResponseHandle {
    inner: SharedResponse,
}

impl ResponseHandle {
    pub fn add_header(&self, key: impl Into<String>, value: impl Into<String>) -> &Self {
        lock(&self.inner).add_header(key, value);
        self
    }

    pub fn set_last_modified(&self, last_modified: impl Into<DateTime<Utc>>) -> &Self {
        lock(&self.inner).set_last_modified(last_modified);
        self
    }

    pub fn set_location(&self, location: impl Into<String>) -> Result<&Self, ResponseError> {
        lock(&self.inner).set_location(location)?;
        Ok(self)
    }

    pub fn snapshot(&self) -> Response {
        lock(&self.inner).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bodies(queue: &mut ResponseQueue, count: usize) -> Vec<String> {
        (0..count).map(|_| queue.next().body().clone()).collect()
    }

    #[test]
    fn test_default_only() {
        let mut queue = ResponseQueue::new();
        assert!(queue.holds_default());
        assert_eq!(queue.len(), 1);
        for _ in 0..3 {
            assert_eq!(queue.next(), Response::default());
        }
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_push_evicts_default() {
        let mut queue = ResponseQueue::new();
        queue.push(Response::new("text/plain", "x3"));
        assert!(!queue.holds_default());
        assert_eq!(queue.len(), 1);
        assert_eq!(bodies(&mut queue, 2), vec!["x3", "x3"]);
    }

    #[test]
    fn test_fifo_then_last_repeats() {
        for n in 1..5 {
            let mut queue = ResponseQueue::new();
            for i in 0..n {
                queue.push(Response::new("text/plain", format!("r{i}")));
            }
            let mut expected: Vec<String> = (0..n).map(|i| format!("r{i}")).collect();
            expected.push(format!("r{}", n - 1));
            expected.push(format!("r{}", n - 1));
            assert_eq!(bodies(&mut queue, n + 2), expected);
        }
    }

    #[test]
    fn test_reset_restores_default() {
        let mut queue = ResponseQueue::new();
        queue.push(Response::new("text/plain", "x1"));
        queue.push(Response::new("text/plain", "x2"));
        queue.reset();
        assert!(queue.holds_default());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next(), Response::default());

        // a fresh push after a reset evicts the default again
        queue.push(Response::new("text/plain", "x3"));
        assert_eq!(bodies(&mut queue, 2), vec!["x3", "x3"]);
    }

    #[test]
    fn test_handle_mutates_queued_response() {
        let mut queue = ResponseQueue::new();
        let handle = queue.push(Response::with_status(302, "text/plain", "..."));
        handle
            .add_header("X-Trace", "1")
            .set_location("https://somewhere")
            .unwrap();

        let served = queue.next();
        assert_eq!(served.headers().get("X-Trace").unwrap(), "1");
        assert_eq!(served.headers().get("Location").unwrap(), "https://somewhere");
        assert_eq!(handle.snapshot(), served);
    }

    #[test]
    fn test_handle_rejects_location_for_non_redirect() {
        let mut queue = ResponseQueue::new();
        let handle = queue.push(Response::new("text/plain", "..."));
        assert!(handle.set_location("https://somewhere").is_err());
        assert!(queue.next().headers().is_empty());
    }
}
