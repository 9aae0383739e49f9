//! Test harness for driving the storefront router in-process.
//!
//! [`TestApp`] wires a real [`vitrina_storefront::build_app`] router to a
//! [`wiremock::MockServer`] standing in for the backend, and carries the
//! session cookie across requests the way a browser would.

use std::net::IpAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;
use vitrina_storefront::build_app;
use vitrina_storefront::config::{ApiConfig, StorefrontConfig};
use vitrina_storefront::state::AppState;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SESSION_SECRET: &str =
    "k9T$2mQz!vB7xR4p@Lw8nY3c#Hf6jD1s^Ga5eK0u&Zr2Xo9Vb4Nq7Mt1Wy6Pi3Ul8Ec5";

pub const CHECKOUT_URL: &str = "https://gateway.test/checkout/v1/redirect";

/// Storefront config pointing at `backend_uri`, with rate limiting off.
#[must_use]
pub fn test_config(backend_uri: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::from([127, 0, 0, 1]),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from(SESSION_SECRET),
        api: ApiConfig {
            base_url: Url::parse(&format!("{backend_uri}/api")).expect("mock server uri"),
            timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(60),
        },
        checkout_url: Url::parse(CHECKOUT_URL).expect("checkout url"),
        rate_limit: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A rendered response, body collected.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Target of a redirect, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Router plus mocked backend plus a one-cookie jar.
pub struct TestApp {
    pub router: Router,
    pub backend: MockServer,
    cookie: Option<String>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let backend = MockServer::start().await;
        let state = AppState::new(test_config(&backend.uri())).expect("app state");
        let router = build_app(state).expect("router");
        Self {
            router,
            backend,
            cookie: None,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = Request::builder().uri(uri).body(Body::empty());
        self.send(request.expect("request")).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body));
        self.send(request.expect("request")).await
    }

    async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().expect("cookie header"));
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let pair = set_cookie.split(';').next().unwrap_or_default();
            self.cookie = pair
                .split_once('=')
                .filter(|(_, value)| !value.is_empty())
                .map(|_| pair.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Serve `products` from `GET /api/products` and each one by id.
    pub async fn mock_catalog(&self, products: &[Value]) {
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": products })))
            .mount(&self.backend)
            .await;

        for product in products {
            let id = product["_id"].as_str().expect("product fixture has _id");
            Mock::given(method("GET"))
                .and(path(format!("/api/products/{id}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": product })))
                .mount(&self.backend)
                .await;
        }
    }

    /// Log in through the form with a backend that accepts `user`.
    pub async fn login_as(&mut self, user: Value, token: &str) -> TestResponse {
        let email = user["email"].as_str().expect("user fixture has email").to_string();
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "user": user, "token": token }
            })))
            .mount(&self.backend)
            .await;

        self.post_form("/auth/login", &[("email", &email), ("password", "secret-pass")])
            .await
    }
}

#[must_use]
pub fn product(id: &str, name: &str, price: u32) -> Value {
    json!({
        "_id": id,
        "nombre": name,
        "descripcion": format!("{name} description"),
        "precio": price,
        "imagen": format!("https://images.test/{id}.jpg"),
        "stock": 10
    })
}

#[must_use]
pub fn customer() -> Value {
    json!({
        "_id": "u-100",
        "nombre": "Ana",
        "apellido": "Diaz",
        "email": "ana@example.com",
        "isAdmin": false
    })
}

#[must_use]
pub fn admin() -> Value {
    json!({
        "_id": "u-1",
        "nombre": "Root",
        "apellido": "Admin",
        "email": "admin@example.com",
        "isAdmin": true
    })
}
