use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error;
use chrono::{DateTime, Utc};
use futures_util::future::{ok, Ready};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// In-process request counters. Wrapped around the app as middleware and
/// reported at /api/metrics. Counters reset on restart.
#[derive(Clone)]
pub struct MetricsCollector {
    // "METHOD /path" -> count
    counts: Arc<Mutex<HashMap<String, u64>>>,
    status_counts: Arc<Mutex<HashMap<u16, u64>>>,
    start_time: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct EndpointStats {
    pub method: String,
    pub path: String,
    pub count: u64,
}

#[derive(Serialize)]
pub struct StatusCodeBreakdown {
    pub status_code: u16,
    pub count: u64,
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub endpoints: Vec<EndpointStats>,
    pub status_codes: Vec<StatusCodeBreakdown>,
    pub total_calls: u64,
    pub uptime_secs: i64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            counts: Arc::new(Mutex::new(HashMap::new())),
            status_counts: Arc::new(Mutex::new(HashMap::new())),
            start_time: Utc::now(),
        }
    }

    pub fn record(&self, method: &str, path: &str, status_code: u16) {
        let key = format!("{} {}", method, path);
        *self.counts.lock().unwrap().entry(key).or_insert(0) += 1;
        *self
            .status_counts
            .lock()
            .unwrap()
            .entry(status_code)
            .or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> MetricsResponse {
        let counts = self.counts.lock().unwrap();
        let status_counts = self.status_counts.lock().unwrap();

        let total_calls = counts.values().sum();

        let mut endpoints: Vec<EndpointStats> = counts
            .iter()
            .map(|(key, count)| {
                let (method, path) = key.split_once(' ').unwrap_or(("", key.as_str()));
                EndpointStats {
                    method: method.to_string(),
                    path: path.to_string(),
                    count: *count,
                }
            })
            .collect();
        endpoints.sort_by(|a, b| b.count.cmp(&a.count));

        let mut status_codes: Vec<StatusCodeBreakdown> = status_counts
            .iter()
            .map(|(code, count)| StatusCodeBreakdown {
                status_code: *code,
                count: *count,
            })
            .collect();
        status_codes.sort_by_key(|s| s.status_code);

        MetricsResponse {
            endpoints,
            status_codes,
            total_calls,
            uptime_secs: (Utc::now() - self.start_time).num_seconds(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for MetricsCollector
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = MetricsMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(MetricsMiddleware {
            service,
            collector: self.clone(),
        })
    }
}

pub struct MetricsMiddleware<S> {
    service: S,
    collector: MetricsCollector,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let collector = self.collector.clone();
        let method = req.method().to_string();
        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            // Record the route pattern when one matched so path ids don't
            // explode the key space.
            let path = res
                .request()
                .match_pattern()
                .unwrap_or_else(|| res.request().path().to_string());
            collector.record(&method, &path, res.status().as_u16());
            Ok(res)
        })
    }
}
