//! JSON API served over `tiny_http`.
//!
//! Route shape: `/{subreddit|user}/{submission|media|image|text}[/random][/{name}[/{load_count}[/{sort}]]]`
//! with an optional `t` query parameter for the time window.

use crate::client::{RedditClient, RedditClientError};
use crate::config::AppConfig;
use crate::models::{SortTime, SortType, SourceKind};
use crate::operations::submissions::{SubmissionFilter, SubmissionsOperation, SubmissionsOptions};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tiny_http::{Header, Server};

#[derive(Debug)]
pub enum ServerError {
    Bind(String),
    Join(tokio::task::JoinError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServerError::Bind(msg) => write!(f, "Failed to start server: {}", msg),
            ServerError::Join(err) => write!(f, "Server loop stopped: {}", err),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Join(err)
    }
}

/// Transport-independent view of an inbound request
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl InboundRequest {
    pub fn get(url: &str) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Header lookup, names compare case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl From<&tiny_http::Request> for InboundRequest {
    fn from(request: &tiny_http::Request) -> Self {
        Self {
            method: request.method().to_string(),
            url: request.url().to_string(),
            headers: request
                .headers()
                .iter()
                .map(|header| (header.field.to_string(), header.value.to_string()))
                .collect(),
        }
    }
}

/// Status code and JSON body of a handled request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status, body },
            Err(e) => Self::error(500, &format!("Failed to serialize response: {}", e)),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    fn into_http(self) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
        let response =
            tiny_http::Response::from_string(self.body.to_string()).with_status_code(self.status);
        match Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
            Ok(header) => response.with_header(header),
            Err(_) => response,
        }
    }
}

/// Parsed API route
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub source: SourceKind,
    pub filter: SubmissionFilter,
    pub random: bool,
    pub name: Option<String>,
    pub load_count: Option<u32>,
    pub sort: Option<SortType>,
    pub time: Option<SortTime>,
}

impl Route {
    /// Parse a request target, `None` for anything that is not a known route
    pub fn parse(target: &str) -> Option<Route> {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (source, rest) = match segments.split_first()? {
            (&"subreddit", rest) => (SourceKind::Subreddit, rest),
            (&"user", rest) => (SourceKind::User, rest),
            _ => return None,
        };
        let (filter, rest) = rest.split_first()?;
        let filter = filter.parse::<SubmissionFilter>().ok()?;

        let (random, rest) = match rest.split_first() {
            Some((&"random", rest)) => (true, rest),
            _ => (false, rest),
        };
        if rest.len() > 3 {
            return None;
        }

        let name = match rest.first() {
            Some(raw) => Some(decode_segment(raw)?),
            None => None,
        };
        if source == SourceKind::User && name.is_none() {
            return None;
        }
        let load_count = match rest.get(1) {
            Some(count) => Some(count.parse::<u32>().ok().filter(|count| *count > 0)?),
            None => None,
        };
        let sort = match rest.get(2) {
            Some(sort) => Some(sort.parse::<SortType>().ok()?),
            None => None,
        };

        let mut time = None;
        if let Some(query) = query {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                if key == "t" {
                    time = Some(value.parse::<SortTime>().ok()?);
                }
            }
        }

        Some(Route {
            source,
            filter,
            random,
            name,
            load_count,
            sort,
            time,
        })
    }

    /// Fill in configured defaults; only subreddit routes default the sort
    pub fn into_options(self, config: &AppConfig) -> SubmissionsOptions {
        let sort = match self.source {
            SourceKind::Subreddit => Some(self.sort.unwrap_or_default()),
            SourceKind::User => self.sort,
        };
        SubmissionsOptions {
            source: self.source,
            name: self
                .name
                .unwrap_or_else(|| config.default_subreddit.clone()),
            load_count: self.load_count.unwrap_or(config.default_load_count),
            sort,
            time: self.time,
            filter: self.filter,
        }
    }
}

/// Percent-decode a path segment, blank or non-UTF-8 names are not routable
fn decode_segment(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).ok()?;
    if decoded.trim().is_empty() {
        return None;
    }
    Some(decoded.into_owned())
}

/// Request handler shared by every connection
#[derive(Clone)]
pub struct Router {
    client: Arc<RedditClient>,
    config: Arc<AppConfig>,
}

impl Router {
    pub fn new(client: Arc<RedditClient>, config: Arc<AppConfig>) -> Self {
        Self { client, config }
    }

    pub async fn handle(&self, request: &InboundRequest) -> ApiResponse {
        info!("{} {}", request.method, request.url);

        if let Some((header_name, expected)) = self.config.authorization_header() {
            let received = request.header(header_name);
            if received != Some(expected) {
                info!("Authorization failed, received value: [{:?}]", received);
                return ApiResponse::error(
                    401,
                    "Authorization header value doesn't match expected one",
                );
            }
        }

        if request.method != "GET" {
            return ApiResponse::error(405, "Method not allowed");
        }

        let route = match Route::parse(&request.url) {
            Some(route) => route,
            None => return ApiResponse::error(404, "Not found"),
        };

        let random = route.random;
        let options = route.into_options(&self.config);
        let operation =
            SubmissionsOperation::new(options, &self.client, &self.config.media_url_suffixes);
        let name = operation.options().name.clone();

        if random {
            match operation.random().await {
                Ok(Some(submission)) => ApiResponse::json(200, &submission),
                Ok(None) => Self::not_found(&name),
                Err(err) => Self::upstream_error(err),
            }
        } else {
            match operation.list().await {
                Ok(Some(list)) => ApiResponse::json(200, &list),
                Ok(None) => Self::not_found(&name),
                Err(err) => Self::upstream_error(err),
            }
        }
    }

    fn not_found(name: &str) -> ApiResponse {
        ApiResponse::error(404, &format!("No entries found for {}", name))
    }

    fn upstream_error(err: RedditClientError) -> ApiResponse {
        error!("Error loading submissions: {}", err);
        ApiResponse::error(500, &err.to_string())
    }
}

/// Serve the API until the listener stops
pub async fn serve(config: AppConfig, client: RedditClient) -> Result<(), ServerError> {
    let address = format!("{}:{}", config.api_host, config.api_port);
    let server = Server::http(&address).map_err(|e| ServerError::Bind(format!("{}: {}", address, e)))?;
    info!("Serving on http://{}", address);
    if config.authorization_header().is_none() {
        info!("Authorization disabled");
    }

    let router = Router::new(Arc::new(client), Arc::new(config));
    let runtime = tokio::runtime::Handle::current();

    // tiny_http blocks while waiting for connections, each request is handled on the runtime
    tokio::task::spawn_blocking(move || {
        for request in server.incoming_requests() {
            let router = router.clone();
            runtime.spawn(async move {
                let inbound = InboundRequest::from(&request);
                let response = router.handle(&inbound).await;
                let status = response.status;
                let responded =
                    tokio::task::spawn_blocking(move || request.respond(response.into_http())).await;
                match responded {
                    Ok(Ok(())) => info!("{} {} -> {}", inbound.method, inbound.url, status),
                    Ok(Err(e)) => warn!("Failed to send response for {}: {}", inbound.url, e),
                    Err(e) => warn!("Response task for {} failed: {}", inbound.url, e),
                }
            });
        }
    })
    .await?;

    Ok(())
}
