#![allow(dead_code)]

use reddit_relay::client::{Credentials, Endpoints, RedditClient};
use serde_json::{json, Value};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "id";
pub const CLIENT_SECRET: &str = "secret";
pub const USER_AGENT: &str = "relay-test/1.0";
/// base64 of `id:secret`
pub const BASIC_AUTH: &str = "Basic aWQ6c2VjcmV0";
pub const TOKEN_PATH: &str = "/api/v1/access_token";

pub fn client_for(server: &MockServer) -> RedditClient {
    RedditClient::with_endpoints(
        Credentials::new(CLIENT_ID, CLIENT_SECRET, USER_AGENT),
        Endpoints {
            access_token_url: format!("{}{}", server.uri(), TOKEN_PATH),
            api_base_url: server.uri(),
        },
    )
    .expect("client builds")
}

pub fn token_body(token: &str, expires_in: u64) -> Value {
    json!({
        "access_token": token,
        "token_type": "bearer",
        "expires_in": expires_in,
        "scope": "*"
    })
}

/// Token endpoint expecting exactly `times` client-credentials exchanges
pub async fn mount_token(server: &MockServer, token: &str, expires_in: u64, times: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("authorization", BASIC_AUTH))
        .and(header("user-agent", USER_AGENT))
        .and(body_string("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(token, expires_in)))
        .expect(times)
        .mount(server)
        .await;
}

pub fn listing(articles: Vec<Value>) -> Value {
    let children: Vec<Value> = articles
        .into_iter()
        .map(|data| json!({"kind": "t3", "data": data}))
        .collect();
    json!({
        "kind": "Listing",
        "data": {"after": null, "before": null, "children": children}
    })
}

pub fn text_article(id: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Post {}", id),
        "author": "writer",
        "url": format!("https://www.reddit.com/r/test/comments/{}/", id),
        "selftext": "Some words",
        "is_video": false,
        "over_18": false,
        "spoiler": false,
        "score": 10,
        "created_utc": 1_700_000_000.0,
        "subreddit": "test",
        "stickied": false
    })
}

pub fn image_article(id: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Image {}", id),
        "author": "artist",
        "url": format!("https://i.redd.it/{}.gif", id),
        "selftext": "",
        "is_video": false,
        "score": 99,
        "created_utc": 1_700_000_100.0,
        "subreddit": "test",
        "stickied": false
    })
}

pub fn video_article(id: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Video {}", id),
        "url": format!("https://v.redd.it/{}", id),
        "selftext": "",
        "is_video": true,
        "media": {
            "reddit_video": {
                "fallback_url": format!("https://v.redd.it/{}/DASH_720.mp4?source=fallback", id)
            }
        },
        "subreddit": "test"
    })
}
