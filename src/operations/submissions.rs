use crate::client::{RedditClient, RedditClientError};
use crate::models::submission::{is_media, is_text, Submission};
use crate::models::{ListingRequest, SortTime, SortType, SourceKind};
use log::info;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Which submissions survive after loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionFilter {
    #[default]
    All,
    Media,
    Text,
}

impl SubmissionFilter {
    pub fn accepts(&self, submission: &Submission) -> bool {
        match self {
            SubmissionFilter::All => true,
            SubmissionFilter::Media => is_media(submission),
            SubmissionFilter::Text => is_text(submission),
        }
    }
}

impl fmt::Display for SubmissionFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SubmissionFilter::All => f.write_str("all"),
            SubmissionFilter::Media => f.write_str("media"),
            SubmissionFilter::Text => f.write_str("text"),
        }
    }
}

impl FromStr for SubmissionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" | "submission" => Ok(SubmissionFilter::All),
            "media" | "image" => Ok(SubmissionFilter::Media),
            "text" => Ok(SubmissionFilter::Text),
            other => Err(format!("unknown submission filter: {}", other)),
        }
    }
}

/// Configuration options for loading submissions
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionsOptions {
    pub source: SourceKind,
    /// Subreddit or username to load from
    pub name: String,
    /// How many submissions are loaded before filtering
    pub load_count: u32,
    /// `None` lets subreddits use `hot` and users use Reddit's default
    pub sort: Option<SortType>,
    pub time: Option<SortTime>,
    pub filter: SubmissionFilter,
}

/// Body of list responses
#[derive(Serialize, Debug, PartialEq)]
pub struct SubmissionList {
    pub count: usize,
    pub submissions: Vec<Submission>,
}

/// Operation loading, mapping and filtering submissions from one source
pub struct SubmissionsOperation<'a> {
    /// Configuration options for the operation
    options: SubmissionsOptions,
    /// Reddit client for API interactions
    client: &'a RedditClient,
    media_suffixes: &'a [String],
}

impl<'a> SubmissionsOperation<'a> {
    pub fn new(
        options: SubmissionsOptions,
        client: &'a RedditClient,
        media_suffixes: &'a [String],
    ) -> Self {
        Self {
            options,
            client,
            media_suffixes,
        }
    }

    pub fn options(&self) -> &SubmissionsOptions {
        &self.options
    }

    /// Load submissions; the result may be shorter than `load_count` due to filtering
    pub async fn execute(&self) -> Result<Vec<Submission>, RedditClientError> {
        info!(
            "Loading {} {} submissions from {} {}",
            self.options.load_count, self.options.filter, self.options.source, self.options.name
        );

        let request = ListingRequest {
            source: self.options.source,
            name: self.options.name.clone(),
            sort: self.options.sort,
            time: self.options.time,
            limit: Some(self.options.load_count),
        };

        let articles = self.client.fetch(&request).await?;
        let submissions: Vec<Submission> = articles
            .iter()
            .map(|article| Submission::from_article(article, self.media_suffixes))
            .filter(|submission| self.options.filter.accepts(submission))
            .collect();

        info!(
            "Kept {} of {} loaded submissions",
            submissions.len(),
            articles.len()
        );
        Ok(submissions)
    }

    /// Load submissions shaped as a list response, `None` when nothing was found
    pub async fn list(&self) -> Result<Option<SubmissionList>, RedditClientError> {
        Ok(into_list(self.execute().await?))
    }

    /// Load submissions and pick one at random, `None` when nothing was found
    pub async fn random(&self) -> Result<Option<Submission>, RedditClientError> {
        Ok(pick_random(self.execute().await?))
    }
}

pub fn into_list(submissions: Vec<Submission>) -> Option<SubmissionList> {
    if submissions.is_empty() {
        return None;
    }
    Some(SubmissionList {
        count: submissions.len(),
        submissions,
    })
}

pub fn pick_random(submissions: Vec<Submission>) -> Option<Submission> {
    submissions.choose(&mut rand::thread_rng()).cloned()
}
