pub mod session;

use crate::config::AppConfig;
use crate::models::{Article, ListingRequest, ListingResponse, SortTime, SortType, SourceKind};
use log::{debug, info, warn};
use reqwest::redirect::Policy;
use reqwest::{Client, Error as ReqwestError, Response, StatusCode};
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

pub use session::{Credentials, Session, AUTH_EXPIRY_MARGIN};
use session::AccessTokenResponse;

pub const ACCESS_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const OAUTH_API_URL: &str = "https://oauth.reddit.com";

// Define a custom error type for handling Reddit API errors
#[derive(Debug)]
pub enum RedditClientError {
    RequestError(ReqwestError),
    ParseError(serde_json::Error),
    UrlError(url::ParseError),
    /// The access token endpoint refused the client credentials
    AuthorizationFailure { status: StatusCode, message: String },
    /// A listing request failed, including after the single re-authorization retry
    UpstreamFailure { status: StatusCode, url: String },
    InvalidRequest(String),
}

impl fmt::Display for RedditClientError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RedditClientError::RequestError(err) => write!(f, "Request error: {}", err),
            RedditClientError::ParseError(err) => write!(f, "Parse error: {}", err),
            RedditClientError::UrlError(err) => write!(f, "URL error: {}", err),
            RedditClientError::AuthorizationFailure { status, message } => {
                write!(f, "Authorization failed: HTTP {}: {}", status, message)
            }
            RedditClientError::UpstreamFailure { status, url } => {
                write!(f, "Reddit API returned HTTP {} for {}", status, url)
            }
            RedditClientError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
        }
    }
}

impl std::error::Error for RedditClientError {}

impl From<ReqwestError> for RedditClientError {
    fn from(err: ReqwestError) -> Self {
        RedditClientError::RequestError(err)
    }
}

impl From<serde_json::Error> for RedditClientError {
    fn from(err: serde_json::Error) -> Self {
        RedditClientError::ParseError(err)
    }
}

impl From<url::ParseError> for RedditClientError {
    fn from(err: url::ParseError) -> Self {
        RedditClientError::UrlError(err)
    }
}

/// Base URLs of the two Reddit hosts the client talks to
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub access_token_url: String,
    pub api_base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            access_token_url: ACCESS_TOKEN_URL.to_string(),
            api_base_url: OAUTH_API_URL.to_string(),
        }
    }
}

/// Result of a single listing fetch before it is handed to callers
#[derive(Debug)]
enum ListingOutcome {
    Found(Vec<Article>),
    /// Reddit redirected, the subreddit or user does not resolve to a listing
    Unresolvable,
}

/// Reddit API client using application-only OAuth.
///
/// The bearer token is requested lazily, cached until shortly before it expires and
/// refreshed once when Reddit rejects it. One instance is meant to be shared (behind an
/// `Arc`) by every request handler.
pub struct RedditClient {
    client: Client,
    credentials: Credentials,
    endpoints: Endpoints,
    session: Mutex<Option<Session>>,
}

impl RedditClient {
    pub fn new(credentials: Credentials) -> Result<Self, RedditClientError> {
        Self::with_endpoints(credentials, Endpoints::default())
    }

    /// Create a client talking to alternative hosts, used to point tests at a mock server
    pub fn with_endpoints(
        credentials: Credentials,
        endpoints: Endpoints,
    ) -> Result<Self, RedditClientError> {
        debug!(
            "Creating RedditClient with user_agent: {}",
            credentials.user_agent
        );
        Ok(Self {
            client: Self::get_client(&credentials.user_agent)?,
            credentials,
            endpoints,
            session: Mutex::new(None),
        })
    }

    /// Create a client from a configuration object
    pub fn from_config(config: &AppConfig) -> Result<Self, RedditClientError> {
        Self::new(config.credentials())
    }

    // Redirects are how Reddit reports unknown subreddits, so they must not be followed
    fn get_client(user_agent: &str) -> Result<Client, RedditClientError> {
        Ok(Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::none())
            .build()?)
    }

    /// Get a list of articles from a subreddit, sorted by `hot` unless told otherwise
    pub async fn fetch_subreddit_listings(
        &self,
        subreddit: &str,
        sort: Option<SortType>,
        time: Option<SortTime>,
        limit: Option<u32>,
    ) -> Result<Vec<Article>, RedditClientError> {
        info!(
            "Loading subreddit articles [{}] [{:?}] [{:?}] [{:?}]",
            subreddit, sort, time, limit
        );
        Self::require_name(subreddit)?;
        Self::require_limit(limit)?;
        let sort = sort.unwrap_or_default();
        let url = self.api_url(&["r", subreddit, sort.as_str()])?;
        let params = Self::prepare_params(None, time, limit);
        let articles = self.get_articles(url, &params).await?;
        Ok(Self::truncate(articles, limit))
    }

    /// Get a list of articles submitted by a user, Reddit picks the sort unless one is given
    pub async fn fetch_user_listings(
        &self,
        user: &str,
        sort: Option<SortType>,
        time: Option<SortTime>,
        limit: Option<u32>,
    ) -> Result<Vec<Article>, RedditClientError> {
        info!(
            "Loading user articles [{}] [{:?}] [{:?}] [{:?}]",
            user, sort, time, limit
        );
        Self::require_name(user)?;
        Self::require_limit(limit)?;
        let url = self.api_url(&["user", user, "submitted"])?;
        let params = Self::prepare_params(sort, time, limit);
        let articles = self.get_articles(url, &params).await?;
        Ok(Self::truncate(articles, limit))
    }

    pub async fn fetch(&self, request: &ListingRequest) -> Result<Vec<Article>, RedditClientError> {
        match request.source {
            SourceKind::Subreddit => {
                self.fetch_subreddit_listings(&request.name, request.sort, request.time, request.limit)
                    .await
            }
            SourceKind::User => {
                self.fetch_user_listings(&request.name, request.sort, request.time, request.limit)
                    .await
            }
        }
    }

    /// Current session, if one has been issued
    pub async fn session(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }

    fn require_name(name: &str) -> Result<(), RedditClientError> {
        if name.trim().is_empty() {
            return Err(RedditClientError::InvalidRequest(
                "source name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn require_limit(limit: Option<u32>) -> Result<(), RedditClientError> {
        if limit == Some(0) {
            return Err(RedditClientError::InvalidRequest(
                "limit must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }

    fn truncate(mut articles: Vec<Article>, limit: Option<u32>) -> Vec<Article> {
        if let Some(limit) = limit {
            articles.truncate(limit as usize);
        }
        articles
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url, RedditClientError> {
        let mut url = Url::parse(&self.endpoints.api_base_url)?;
        url.path_segments_mut()
            .map_err(|_| {
                RedditClientError::InvalidRequest(format!(
                    "{} cannot be used as a base URL",
                    self.endpoints.api_base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn prepare_params(
        sort: Option<SortType>,
        time: Option<SortTime>,
        limit: Option<u32>,
    ) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(sort) = sort {
            params.push(("sort", sort.as_str().to_string()));
        }
        if let Some(time) = time {
            params.push(("t", time.as_str().to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }

    async fn get_articles(
        &self,
        url: Url,
        params: &[(&'static str, String)],
    ) -> Result<Vec<Article>, RedditClientError> {
        match self.request(url, params).await? {
            ListingOutcome::Found(articles) => Ok(articles),
            ListingOutcome::Unresolvable => Ok(Vec::new()),
        }
    }

    async fn request(
        &self,
        url: Url,
        params: &[(&'static str, String)],
    ) -> Result<ListingOutcome, RedditClientError> {
        let token = self.ensure_authorized().await?;
        let mut response = self.request_articles(&url, params, &token).await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            info!("Response returned code [{}], re-authorizing", status);
            let token = self.reauthorize(&token).await?;
            response = self.request_articles(&url, params, &token).await?;
        }

        let status = response.status();
        debug!("Response status: {}", status);

        if status.is_redirection() {
            debug!(
                "Reddit redirected {} to {:?}, treating source as unresolvable",
                url,
                response.headers().get(reqwest::header::LOCATION)
            );
            return Ok(ListingOutcome::Unresolvable);
        }

        if !status.is_success() {
            warn!("Listing request to {} failed with HTTP {}", url, status);
            return Err(RedditClientError::UpstreamFailure {
                status,
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        debug!("Response body length: {} bytes", body.len());

        let parsed = match serde_json::from_str::<ListingResponse>(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Error parsing listing: {}", e);
                debug!("First 100 chars: {}", body.chars().take(100).collect::<String>());
                return Err(RedditClientError::ParseError(e));
            }
        };

        let articles = parsed.into_articles();
        debug!("Successfully parsed {} articles", articles.len());
        Ok(ListingOutcome::Found(articles))
    }

    async fn request_articles(
        &self,
        url: &Url,
        params: &[(&'static str, String)],
        token: &str,
    ) -> Result<Response, RedditClientError> {
        debug!("Fetching {}", url);
        Ok(self
            .client
            .get(url.clone())
            .query(params)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?)
    }

    /// Return a usable bearer token, requesting a new one if none is cached or it expired.
    ///
    /// The session lock is held across the exchange, so concurrent callers wait for the
    /// first one's token instead of racing their own.
    async fn ensure_authorized(&self) -> Result<String, RedditClientError> {
        let mut session = self.session.lock().await;
        match session.as_ref() {
            Some(current) if current.is_valid_at(Instant::now()) => {
                return Ok(current.bearer_token().to_string());
            }
            Some(_) => info!("Access token expired, requesting new one"),
            None => info!("No access token yet, authorizing"),
        }

        let fresh = self.authorize().await?;
        let token = fresh.bearer_token().to_string();
        *session = Some(fresh);
        Ok(token)
    }

    /// Replace a token Reddit rejected, ignoring the local expiry bookkeeping.
    ///
    /// If another caller already swapped the rejected token out, its replacement is reused.
    async fn reauthorize(&self, rejected: &str) -> Result<String, RedditClientError> {
        let mut session = self.session.lock().await;
        if let Some(current) = session.as_ref() {
            if current.bearer_token() != rejected && current.is_valid_at(Instant::now()) {
                debug!("Rejected token was already replaced, reusing the new one");
                return Ok(current.bearer_token().to_string());
            }
        }

        let fresh = self.authorize().await?;
        let token = fresh.bearer_token().to_string();
        *session = Some(fresh);
        Ok(token)
    }

    async fn authorize(&self) -> Result<Session, RedditClientError> {
        info!("Authorizing");
        let params = [("grant_type", "client_credentials")];

        let res = self
            .client
            .post(&self.endpoints.access_token_url)
            .header("Authorization", self.credentials.basic_auth_header())
            .form(&params)
            .send()
            .await?;

        // Check for HTTP errors
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await?;
            return Err(RedditClientError::AuthorizationFailure {
                status,
                message: body,
            });
        }

        let status = res.status();
        let json: serde_json::Value = res.json().await?;

        // Reddit reports bad credentials with a 200 and an `error` field as well
        if let Some(error) = json.get("error") {
            return Err(RedditClientError::AuthorizationFailure {
                status,
                message: error.to_string(),
            });
        }

        let token: AccessTokenResponse = serde_json::from_value(json)?;
        debug!("Access token obtained, expires in {}s", token.expires_in);

        Ok(Session::issue(
            token.access_token,
            Duration::from_secs(token.expires_in),
            Instant::now(),
        ))
    }
}

impl fmt::Debug for RedditClient {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RedditClient")
            .field("user_agent", &self.credentials.user_agent)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}
