//! Scripted [`Fetcher`]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use style_core::{FetchError, FetchOptions, Fetcher};

type Reply = Result<String, FetchError>;

/// One recorded fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub url: String,
    pub body: Option<String>,
}

/// Fetcher replaying queued replies per URL.
///
/// Replies are consumed in order; the last one repeats. Unscripted URLs
/// fail with status 404.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<FetchCall>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn respond(&self, url: &str, text: impl Into<String>) -> &Self {
        self.push(url, Ok(text.into()))
    }

    /// Queue a transport failure (`0` = unreachable).
    pub fn fail(&self, url: &str, status: u16) -> &Self {
        self.push(url, Err(FetchError::from_status(status)))
    }

    fn push(&self, url: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.url == url).count()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, options: FetchOptions) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(FetchCall {
            url: url.to_string(),
            body: options.body,
        });

        let mut replies = self.replies.lock().unwrap();
        let Some(queue) = replies.get_mut(url) else {
            return Err(FetchError::Status(404));
        };
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        reply.unwrap_or(Err(FetchError::Status(404)))
    }
}
