// File: ./src/client/retry.rs
//! Retries requests answered with `429 Too Many Requests`, within this process only.
use http::{Request, Response, StatusCode};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tower_layer::Layer;
use tower_service::Service;

const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct RetryLayer {
    max_retries: usize,
}

impl RetryLayer {
    pub fn new(max_retries: usize) -> Self {
        Self { max_retries }
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService {
            inner,
            max_retries: self.max_retries,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RetryService<S> {
    inner: S,
    max_retries: usize,
}

/// Delay requested by the server, `DEFAULT_BACKOFF` when absent or unreadable.
pub fn retry_after<B>(response: &Response<B>) -> Duration {
    response
        .headers()
        .get(http::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| Duration::from_secs_f64(secs).min(MAX_BACKOFF))
        .unwrap_or(DEFAULT_BACKOFF)
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RetryService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::error::Error + Send + Sync + 'static,
    ReqBody: Clone + Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let mut inner = self.inner.clone();
        let max_retries = self.max_retries;

        Box::pin(async move {
            let mut attempts = 0;

            loop {
                // Keep a copy so the request can be replayed. Relies on ReqBody (String) being Clone.
                let req_clone = req.clone();
                let response = inner.call(req_clone).await?;

                if response.status() != StatusCode::TOO_MANY_REQUESTS || attempts >= max_retries {
                    return Ok(response);
                }

                let delay = retry_after(&response);
                drop(response);
                attempts += 1;
                log::debug!(
                    "Rate limited on {}, retry {}/{} in {:?}",
                    req.uri().path(),
                    attempts,
                    max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        })
    }
}
