//! HTTP middleware for tracking request metrics
//!
//! Records request count, duration and in-flight requests per route.

use super::*;
use axum::{
    extract::{MatchedPath, Request},
    response::Response,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};

/// Entry point for building the metrics layer
#[derive(Clone)]
pub struct MetricsMiddleware;

impl MetricsMiddleware {
    /// Create the middleware as a tower layer with custom configuration
    pub fn layer_with_config(config: MetricsConfig) -> MetricsLayer {
        MetricsLayer {
            config: Arc::new(config),
        }
    }
}

/// Tower layer for metrics middleware
#[derive(Clone)]
pub struct MetricsLayer {
    config: Arc<MetricsConfig>,
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService {
            inner,
            config: self.config.clone(),
        }
    }
}

/// Tower service for metrics collection
#[derive(Clone)]
pub struct MetricsService<S> {
    inner: S,
    config: Arc<MetricsConfig>,
}

impl<S> Service<Request> for MetricsService<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let method = req.method().to_string();
        let path = req
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());

        if self.config.is_path_excluded(&path) {
            return Box::pin(self.inner.call(req));
        }

        let enable_histograms = self.config.enable_histograms;
        HTTP_REQUESTS_IN_FLIGHT.inc();

        let start = Instant::now();
        let future = self.inner.call(req);

        Box::pin(async move {
            let result = future.await;

            // Always decrement, even on error
            HTTP_REQUESTS_IN_FLIGHT.dec();

            if let Ok(ref response) = result {
                let status = response.status().as_u16().to_string();

                HTTP_REQUESTS_TOTAL
                    .with_label_values(&[&method, &path, &status])
                    .inc();

                if enable_histograms {
                    HTTP_REQUEST_DURATION_SECONDS
                        .with_label_values(&[&method, &path])
                        .observe(start.elapsed().as_secs_f64());
                }
            }

            result
        })
    }
}
