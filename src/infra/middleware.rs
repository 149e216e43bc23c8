use std::{
    collections::VecDeque,
    net::IpAddr,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use dashmap::DashMap;
use salvo::{
    http::{
        header::{
            HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
        },
        Method, StatusCode,
    },
    addr::SocketAddr,
    Depot, FlowCtrl, Handler, Request, Response,
};

use crate::error::{
    app::ApplicationError,
    http::{RateLimitError, RequestTimeout},
};

/// Sliding window request limit per client.
///
/// Clients are told apart by the first `X-Forwarded-For` address, or
/// the peer address of the connection.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window_minutes: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_minutes * 60),
            hits: DashMap::new(),
        }
    }

    /// Record a request at `now`, unless the client is over the limit.
    pub fn check(&self, client: &str, now: Instant) -> Result<(), RateLimitError> {
        let mut hits = self.hits.entry(client.to_string()).or_default();
        self.prune(&mut hits, now);

        if hits.len() >= self.max_requests {
            return Err(RateLimitError {
                max_requests: self.max_requests,
                window_minutes: self.window.as_secs() / 60,
            });
        }
        hits.push_back(now);
        drop(hits);

        if self.hits.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }
        Ok(())
    }

    fn prune(&self, hits: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = hits.front() {
            if now.duration_since(*oldest) < self.window {
                break;
            }
            hits.pop_front();
        }
    }

    /// Forget clients with no request left in the window.
    pub fn sweep(&self, now: Instant) {
        self.hits.retain(|_, hits| {
            self.prune(hits, now);
            !hits.is_empty()
        });
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.hits.len()
    }
}

/// Tracked clients above which idle entries are dropped.
const SWEEP_THRESHOLD: usize = 1024;

/// Client key: the first `X-Forwarded-For` address, else the peer IP.
/// The peer port is left out, every connection gets a new one.
fn client_key(forwarded: Option<&str>, peer: Option<IpAddr>) -> String {
    if let Some(first) = forwarded
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        return first.to_string();
    }
    peer.map_or_else(|| "unknown".into(), |ip| ip.to_string())
}

fn peer_ip(addr: &SocketAddr) -> Option<IpAddr> {
    match (addr.as_ipv4(), addr.as_ipv6()) {
        (Some(v4), _) => Some(IpAddr::V4(*v4.ip())),
        (_, Some(v6)) => Some(IpAddr::V6(*v6.ip())),
        _ => None,
    }
}

fn client_id(req: &Request) -> String {
    let forwarded: Option<&str> = req.header("x-forwarded-for");
    client_key(forwarded, req.remote_addr().and_then(peer_ip))
}

#[async_trait]
impl Handler for RateLimiter {
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        let client = client_id(req);
        if let Err(err) = self.check(&client, Instant::now()) {
            tracing::warn!(client = %client, path = %req.uri().path(), "rate limit exceeded");
            res.render(ApplicationError::from(err));
            ctrl.skip_rest();
            return;
        }
        ctrl.call_next(req, depot, res).await;
    }
}

/// Abort the rest of the chain after the request timeout.
pub struct Timeout(pub Duration);

#[async_trait]
impl Handler for Timeout {
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        let completed = tokio::time::timeout(self.0, ctrl.call_next(req, depot, res)).await;
        if completed.is_err() {
            tracing::warn!(path = %req.uri().path(), "request timed out after {:?}", self.0);
            ctrl.skip_rest();
            res.render(RequestTimeout(self.0));
        }
    }
}

/// Any origin may call the API.
pub struct Cors;

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "Authorization, Content-Type, Accept";

#[async_trait]
impl Handler for Cors {
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        let headers = res.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOWED_HEADERS));

        if req.method() == Method::OPTIONS {
            res.headers_mut()
                .insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
            res.set_status_code(StatusCode::NO_CONTENT);
            ctrl.skip_rest();
            return;
        }
        ctrl.call_next(req, depot, res).await;
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr as PeerAddr;

    use pretty_assertions::assert_eq;
    use salvo::{test::TestClient, Router, Service};

    use super::*;

    struct Reply(Duration);

    #[async_trait]
    impl Handler for Reply {
        async fn handle(&self, _req: &mut Request, _depot: &mut Depot, res: &mut Response, _ctrl: &mut FlowCtrl) {
            tokio::time::sleep(self.0).await;
            res.render("done");
        }
    }

    #[test]
    fn limit_within_window() {
        let limiter = RateLimiter::new(2, 15);
        let start = Instant::now();

        assert_eq!(limiter.check("10.0.0.1", start), Ok(()));
        assert_eq!(limiter.check("10.0.0.1", start + Duration::from_secs(1)), Ok(()));
        let err = limiter
            .check("10.0.0.1", start + Duration::from_secs(2))
            .unwrap_err();
        assert_eq!(err.to_string(), "Maximum 2 requests per 15 minutes");

        assert_eq!(limiter.check("10.0.0.2", start + Duration::from_secs(2)), Ok(()));
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::new(1, 1);
        let start = Instant::now();

        assert_eq!(limiter.check("client", start), Ok(()));
        assert!(limiter.check("client", start + Duration::from_secs(59)).is_err());
        assert_eq!(limiter.check("client", start + Duration::from_secs(60)), Ok(()));
    }

    #[test]
    fn peer_port_is_ignored() {
        let first: PeerAddr = "127.0.0.1:54321".parse().unwrap();
        let second: PeerAddr = "127.0.0.1:54322".parse().unwrap();

        assert_eq!(client_key(None, Some(first.ip())), "127.0.0.1");
        assert_eq!(client_key(None, Some(first.ip())), client_key(None, Some(second.ip())));
        assert_eq!(client_key(Some(" 203.0.113.7, 10.0.0.1"), Some(first.ip())), "203.0.113.7");
        assert_eq!(client_key(Some(""), None), "unknown");
    }

    #[test]
    fn peer_ip_of_socket_address() {
        let addr = SocketAddr::IPv4("192.168.1.20:4000".parse().unwrap());
        assert_eq!(peer_ip(&addr), Some("192.168.1.20".parse().unwrap()));
    }

    #[test]
    fn idle_clients_are_forgotten() {
        let limiter = RateLimiter::new(3, 1);
        let start = Instant::now();

        for client in 0..10 {
            limiter.check(&format!("10.0.0.{client}"), start).unwrap();
        }
        assert_eq!(limiter.tracked_clients(), 10);

        limiter.check("10.0.1.1", start + Duration::from_secs(30)).unwrap();
        limiter.sweep(start + Duration::from_secs(61));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[tokio::test]
    async fn limited_route_answers_429() {
        let service = Service::new(
            Router::with_path("login")
                .hoop(RateLimiter::new(1, 15))
                .post(Reply(Duration::ZERO)),
        );

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let res = TestClient::post("http://127.0.0.1:8000/login").send(&service).await;
            statuses.push(res.status_code());
        }
        assert_eq!(
            statuses,
            vec![
                Some(StatusCode::OK),
                Some(StatusCode::TOO_MANY_REQUESTS),
                Some(StatusCode::TOO_MANY_REQUESTS)
            ]
        );

        let res = TestClient::post("http://127.0.0.1:8000/login")
            .add_header("x-forwarded-for", "198.51.100.4", true)
            .send(&service)
            .await;
        assert_eq!(res.status_code(), Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn slow_request_times_out() {
        let service = Service::new(
            Router::new()
                .hoop(Timeout(Duration::from_millis(20)))
                .push(Router::with_path("slow").get(Reply(Duration::from_millis(500))))
                .push(Router::with_path("fast").get(Reply(Duration::ZERO))),
        );

        let res = TestClient::get("http://127.0.0.1:8000/slow").send(&service).await;
        assert_eq!(res.status_code(), Some(StatusCode::GATEWAY_TIMEOUT));

        let res = TestClient::get("http://127.0.0.1:8000/fast").send(&service).await;
        assert_eq!(res.status_code(), Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn preflight_short_circuits() {
        let service = Service::new(
            Router::new()
                .hoop(Cors)
                .push(Router::with_path("<**rest>").options(Cors).get(Reply(Duration::ZERO))),
        );

        let res = TestClient::options("http://127.0.0.1:8000/api/orders/1/status")
            .send(&service)
            .await;
        assert_eq!(res.status_code(), Some(StatusCode::NO_CONTENT));
        assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
