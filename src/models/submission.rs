//! Reduced submission record served by the API, plus the media/text classification used by the
//! filtered routes.

use crate::models::Article;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// URL suffixes treated as media when no suffixes are configured
pub const DEFAULT_MEDIA_URL_SUFFIXES: [&str; 4] = [".png", ".jpg", ".jpeg", ".gif"];

/// Submission reduced to the fields exposed by the API
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: String,
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub nsfw: bool,
    pub spoiler: bool,
    pub selftext: Option<String>,
    pub score: i64,
    pub created_utc: Option<DateTime<Utc>>,
    pub shortlink: String,
    pub subreddit: String,
    pub stickied: bool,
    pub media_url: Option<String>,
}

impl Submission {
    /// Map a raw article onto the reduced field set.
    ///
    /// Missing or mistyped fields become empty/`None`/`false`, this never fails.
    pub fn from_article(article: &Article, media_suffixes: &[String]) -> Self {
        let id = string_field(article, "id").unwrap_or_default();
        let created_utc = article
            .get("created_utc")
            .and_then(Value::as_f64)
            .and_then(|timestamp| DateTime::<Utc>::from_timestamp(timestamp as i64, 0));

        Self {
            shortlink: format!("https://redd.it/{}", id),
            url: string_field(article, "url").unwrap_or_default(),
            title: string_field(article, "title").unwrap_or_default(),
            author: string_field(article, "author"),
            nsfw: bool_field(article, "over_18"),
            spoiler: bool_field(article, "spoiler"),
            selftext: string_field(article, "selftext"),
            score: article.get("score").and_then(Value::as_i64).unwrap_or(0),
            created_utc,
            subreddit: string_field(article, "subreddit").unwrap_or_default(),
            stickied: bool_field(article, "stickied"),
            media_url: media_url(article, media_suffixes),
            id,
        }
    }
}

/// True when the submission points at an image/GIF or carries a Reddit-hosted video
pub fn is_media(submission: &Submission) -> bool {
    submission.media_url.is_some()
}

/// True when the submission has non-empty self text
pub fn is_text(submission: &Submission) -> bool {
    submission
        .selftext
        .as_deref()
        .map_or(false, |text| !text.is_empty())
}

fn string_field(article: &Article, key: &str) -> Option<String> {
    article.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_field(article: &Article, key: &str) -> bool {
    article.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn media_url(article: &Article, media_suffixes: &[String]) -> Option<String> {
    if let Some(url) = article.get("url").and_then(Value::as_str) {
        if has_media_suffix(url, media_suffixes) {
            return Some(url.to_string());
        }
    }

    if bool_field(article, "is_video") {
        return video_fallback_url(article).map(strip_query);
    }

    None
}

fn has_media_suffix(url: &str, media_suffixes: &[String]) -> bool {
    let url = url.to_ascii_lowercase();
    media_suffixes
        .iter()
        .any(|suffix| !suffix.is_empty() && url.ends_with(&suffix.to_ascii_lowercase()))
}

fn video_fallback_url(article: &Article) -> Option<&str> {
    ["media", "secure_media"].iter().find_map(|key| {
        article
            .get(*key)?
            .get("reddit_video")?
            .get("fallback_url")?
            .as_str()
    })
}

// Reddit appends tracking queries such as `?source=fallback` to video URLs
fn strip_query(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw.split('?').next().unwrap_or(raw).to_string(),
    }
}
