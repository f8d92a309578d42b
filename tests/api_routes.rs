mod common;

use common::*;
use reddit_relay::config::AppConfig;
use reddit_relay::server::{InboundRequest, Router};
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(extra: &[(&str, &str)]) -> AppConfig {
    let mut vars: HashMap<String, String> = [
        ("REDDIT_CLIENT_ID", CLIENT_ID),
        ("REDDIT_CLIENT_SECRET", CLIENT_SECRET),
        ("REDDIT_USER_AGENT", USER_AGENT),
        ("DEFAULT_SUBREDDIT", "all"),
        ("DEFAULT_LOAD_COUNT", "25"),
    ]
    .iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect();
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }
    AppConfig::from_lookup(|key| vars.get(key).cloned()).expect("valid test config")
}

fn router(server: &MockServer, config: AppConfig) -> Router {
    Router::new(Arc::new(client_for(server)), Arc::new(config))
}

async fn mount_listing(server: &MockServer, listing_path: &str, articles: Vec<serde_json::Value>) {
    Mock::given(method("GET"))
        .and(path(listing_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(articles)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn list_route_returns_count_and_submissions() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 3600, 1).await;
    Mock::given(method("GET"))
        .and(path("/r/pics/new"))
        .and(query_param("limit", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(listing(vec![text_article("a"), image_article("b")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = router(&server, config(&[]))
        .handle(&InboundRequest::get("/subreddit/submission/pics/2/new"))
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body["count"], 2);
    assert_eq!(response.body["submissions"][0]["id"], "a");
    assert_eq!(response.body["submissions"][0]["shortlink"], "https://redd.it/a");
    assert_eq!(response.body["submissions"][1]["media_url"], "https://i.redd.it/b.gif");
}

#[tokio::test]
async fn defaults_come_from_configuration() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 3600, 1).await;
    Mock::given(method("GET"))
        .and(path("/r/all/hot"))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(vec![text_article("a")])))
        .expect(1)
        .mount(&server)
        .await;

    let response = router(&server, config(&[]))
        .handle(&InboundRequest::get("/subreddit/text/"))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body["count"], 1);
}

#[tokio::test]
async fn media_route_keeps_images_and_videos_only() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 3600, 1).await;
    mount_listing(
        &server,
        "/r/test/hot",
        vec![text_article("t"), image_article("i"), video_article("v")],
    )
    .await;

    let response = router(&server, config(&[]))
        .handle(&InboundRequest::get("/subreddit/image/test"))
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body["count"], 2);
    assert_eq!(response.body["submissions"][0]["id"], "i");
    assert_eq!(
        response.body["submissions"][1]["media_url"],
        "https://v.redd.it/v/DASH_720.mp4"
    );
}

#[tokio::test]
async fn text_route_with_no_text_posts_is_not_found() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 3600, 1).await;
    mount_listing(&server, "/r/test/hot", vec![image_article("i")]).await;

    let response = router(&server, config(&[]))
        .handle(&InboundRequest::get("/subreddit/text/test"))
        .await;

    assert_eq!(response.status, 404);
    assert_eq!(response.body["error"], "No entries found for test");
}

#[tokio::test]
async fn unresolvable_subreddit_is_not_found() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 3600, 1).await;
    Mock::given(method("GET"))
        .and(path("/r/nope/hot"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/subreddits/search"))
        .mount(&server)
        .await;

    let response = router(&server, config(&[]))
        .handle(&InboundRequest::get("/subreddit/submission/random/nope"))
        .await;

    assert_eq!(response.status, 404);
    assert_eq!(response.body["error"], "No entries found for nope");
}

#[tokio::test]
async fn random_route_returns_one_flattened_submission() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 3600, 1).await;
    mount_listing(
        &server,
        "/user/artist/submitted",
        vec![image_article("x"), image_article("y")],
    )
    .await;

    let response = router(&server, config(&[]))
        .handle(&InboundRequest::get("/user/media/random/artist"))
        .await;

    assert_eq!(response.status, 200);
    let id = response.body["id"].as_str().unwrap();
    assert!(id == "x" || id == "y");
    assert!(response.body.get("count").is_none());
}

#[tokio::test]
async fn user_route_without_sort_uses_reddit_default() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 3600, 1).await;
    Mock::given(method("GET"))
        .and(path("/user/writer/submitted"))
        .and(query_param_is_missing("sort"))
        .and(query_param("limit", "5"))
        .and(query_param("t", "year"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(vec![text_article("w")])))
        .expect(1)
        .mount(&server)
        .await;

    let response = router(&server, config(&[]))
        .handle(&InboundRequest::get("/user/text/writer/5?t=year"))
        .await;
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn upstream_failure_is_a_server_error() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 3600, 1).await;
    Mock::given(method("GET"))
        .and(path("/r/pics/hot"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let response = router(&server, config(&[]))
        .handle(&InboundRequest::get("/subreddit/submission/pics"))
        .await;
    assert_eq!(response.status, 500);
    assert!(response.body["error"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn unknown_routes_never_reach_reddit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let router = router(&server, config(&[]));
    for target in ["/", "/subreddit/video", "/user/media", "/subreddit/media/pics/abc"] {
        let response = router.handle(&InboundRequest::get(target)).await;
        assert_eq!(response.status, 404, "{}", target);
    }

    let mut post = InboundRequest::get("/subreddit/media/pics");
    post.method = "POST".to_string();
    assert_eq!(router.handle(&post).await.status, 405);
}

#[tokio::test]
async fn configured_authorization_header_is_enforced() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 3600, 1).await;
    mount_listing(&server, "/r/pics/hot", vec![text_article("a")]).await;

    let router = router(
        &server,
        config(&[
            ("API_AUTHORIZATION_HEADER_NAME", "X-Api-Key"),
            ("API_AUTHORIZATION_HEADER_VALUE", "letmein"),
        ]),
    );

    let missing = router
        .handle(&InboundRequest::get("/subreddit/submission/pics"))
        .await;
    assert_eq!(missing.status, 401);

    let wrong = router
        .handle(&InboundRequest::get("/subreddit/submission/pics").with_header("X-Api-Key", "nope"))
        .await;
    assert_eq!(wrong.status, 401);

    let allowed = router
        .handle(
            &InboundRequest::get("/subreddit/submission/pics").with_header("x-api-key", "letmein"),
        )
        .await;
    assert_eq!(allowed.status, 200);
}

#[tokio::test]
async fn encoded_names_are_not_encoded_twice() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 3600, 1).await;
    Mock::given(method("GET"))
        .and(path("/r/r%C3%BCst/hot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(vec![text_article("a")])))
        .expect(1)
        .mount(&server)
        .await;

    let response = router(&server, config(&[]))
        .handle(&InboundRequest::get("/subreddit/text/r%C3%BCst"))
        .await;
    assert_eq!(response.status, 200);
}
