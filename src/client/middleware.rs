// File: ./src/client/middleware.rs
//! Tower middleware that stamps every request with the record-store API headers.
use http::header::{AUTHORIZATION, CONTENT_TYPE, InvalidHeaderValue, USER_AGENT};
use http::{HeaderName, HeaderValue, Request};
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

pub const NOTION_VERSION: HeaderName = HeaderName::from_static("notion-version");

#[derive(Clone, Debug)]
pub struct ApiHeadersLayer {
    authorization: HeaderValue,
    api_version: HeaderValue,
    user_agent: HeaderValue,
}

impl ApiHeadersLayer {
    pub fn new(token: &str, api_version: &str) -> Result<Self, InvalidHeaderValue> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", token))?;
        authorization.set_sensitive(true);
        Ok(Self {
            authorization,
            api_version: HeaderValue::from_str(api_version)?,
            user_agent: HeaderValue::from_str(&format!(
                "skysync/{}",
                env!("CARGO_PKG_VERSION")
            ))?,
        })
    }
}

impl<S> Layer<S> for ApiHeadersLayer {
    type Service = ApiHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiHeadersService {
            inner,
            headers: self.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiHeadersService<S> {
    inner: S,
    headers: ApiHeadersLayer,
}

impl<S, ReqBody> Service<Request<ReqBody>> for ApiHeadersService<S>
where
    S: Service<Request<ReqBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let headers = req.headers_mut();
        headers.insert(AUTHORIZATION, self.headers.authorization.clone());
        headers.insert(NOTION_VERSION, self.headers.api_version.clone());
        headers.insert(USER_AGENT, self.headers.user_agent.clone());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.inner.call(req)
    }
}
