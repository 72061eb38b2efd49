//! Throttled call gateway
//!
//! The sole serialization point for outbound inference and embedding calls.
//! Each endpoint class gets one lane: a mutex held across the whole call
//! gives a total ordering (a queue, not a pool), minimum inter-call spacing
//! is measured from the previous call's start, and provider-signaled
//! overload is retried with exponential backoff plus random jitter. The
//! throttle state is updated before every attempt, so it is current whether
//! the call succeeds or exhausts its retry budget.

use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::providers::{EmbeddingProvider, InferenceProvider, InferenceRequest};

const MAX_RETRY_JITTER_MS: u64 = 500;

/// Pacing and retry policy for one endpoint class.
#[derive(Debug, Clone)]
pub struct ThrottlePolicy {
    pub min_spacing: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl ThrottlePolicy {
    /// Defaults used for the inference endpoint class.
    pub fn inference() -> Self {
        Self {
            min_spacing: Duration::from_millis(1500),
            max_retries: 4,
            initial_backoff: Duration::from_millis(1000),
        }
    }

    /// Defaults used for the embedding endpoint class.
    pub fn embedding() -> Self {
        Self {
            min_spacing: Duration::from_millis(2000),
            max_retries: 3,
            initial_backoff: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Default)]
struct ThrottleState {
    last_call_started: Option<Instant>,
}

/// One serialized, paced lane of outbound calls.
struct Lane {
    policy: ThrottlePolicy,
    state: Mutex<ThrottleState>,
}

impl Lane {
    fn new(policy: ThrottlePolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(ThrottleState::default()),
        }
    }

    /// Runs `op` under the lane's queue, spacing and retry policy.
    ///
    /// The state lock is held until the call settles, so a caller's retries
    /// are not interleaved with other callers' attempts.
    async fn run<T, F, Fut>(&self, op: F) -> ProviderResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let mut state = self.state.lock().await;
        let mut backoff = self.policy.initial_backoff;
        let mut attempt: u32 = 0;
        loop {
            if let Some(started) = state.last_call_started {
                let since_last = started.elapsed();
                if since_last < self.policy.min_spacing {
                    let wait = self.policy.min_spacing - since_last;
                    debug!("throttling protection: waiting {:?} before next call", wait);
                    sleep(wait).await;
                }
            }
            state.last_call_started = Some(Instant::now());

            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_throttled() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    let jitter =
                        Duration::from_millis(rand::thread_rng().gen_range(0..MAX_RETRY_JITTER_MS));
                    warn!(
                        "provider throttled, retry {}/{} in {:?}",
                        attempt,
                        self.policy.max_retries,
                        backoff + jitter
                    );
                    sleep(backoff + jitter).await;
                    backoff *= 2;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Gateway wrapping the inference and embedding providers.
pub struct CallGateway {
    inference: Arc<dyn InferenceProvider>,
    embedding: Arc<dyn EmbeddingProvider>,
    inference_lane: Lane,
    embedding_lane: Lane,
}

impl CallGateway {
    pub fn new(
        inference: Arc<dyn InferenceProvider>,
        embedding: Arc<dyn EmbeddingProvider>,
        inference_policy: ThrottlePolicy,
        embedding_policy: ThrottlePolicy,
    ) -> Self {
        Self {
            inference,
            embedding,
            inference_lane: Lane::new(inference_policy),
            embedding_lane: Lane::new(embedding_policy),
        }
    }

    /// Invokes the inference model through the inference lane.
    pub async fn invoke_model(&self, request: &InferenceRequest) -> ProviderResult<String> {
        self.inference_lane
            .run(|| self.inference.invoke(request))
            .await
    }

    /// Computes an embedding through the embedding lane.
    pub async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        self.embedding_lane.run(|| self.embedding.embed(text)).await
    }
}
