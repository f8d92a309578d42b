use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub mod submission;

/// Raw Reddit article as returned inside a listing, kept as an opaque JSON object
pub type Article = serde_json::Map<String, serde_json::Value>;

/// Top-level response for Reddit listings
#[derive(Deserialize, Debug)]
pub struct ListingResponse {
    #[serde(default)]
    pub kind: Option<String>,
    pub data: ListingCollection,
}

/// Collection of entries in a listing
#[derive(Deserialize, Debug)]
pub struct ListingCollection {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    pub children: Vec<ListingEntity>,
}

/// Listing entity with kind and data fields
#[derive(Deserialize, Debug)]
pub struct ListingEntity {
    #[serde(default)]
    pub kind: Option<String>,
    pub data: Article,
}

impl ListingResponse {
    /// Unwrap the `data.children[].data` envelope, keeping upstream order
    pub fn into_articles(self) -> Vec<Article> {
        self.data
            .children
            .into_iter()
            .map(|child| child.data)
            .collect()
    }
}

/// Sort types accepted by Reddit listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortType {
    #[default]
    Hot,
    New,
    Top,
    Controversial,
    Rising,
}

impl SortType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortType::Hot => "hot",
            SortType::New => "new",
            SortType::Top => "top",
            SortType::Controversial => "controversial",
            SortType::Rising => "rising",
        }
    }
}

impl fmt::Display for SortType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hot" => Ok(SortType::Hot),
            "new" => Ok(SortType::New),
            "top" => Ok(SortType::Top),
            "controversial" => Ok(SortType::Controversial),
            "rising" => Ok(SortType::Rising),
            other => Err(format!("unknown sort type: {}", other)),
        }
    }
}

/// Time windows for `top` and `controversial` listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortTime {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl SortTime {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortTime::Hour => "hour",
            SortTime::Day => "day",
            SortTime::Week => "week",
            SortTime::Month => "month",
            SortTime::Year => "year",
            SortTime::All => "all",
        }
    }
}

impl fmt::Display for SortTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hour" => Ok(SortTime::Hour),
            "day" => Ok(SortTime::Day),
            "week" => Ok(SortTime::Week),
            "month" => Ok(SortTime::Month),
            "year" => Ok(SortTime::Year),
            "all" => Ok(SortTime::All),
            other => Err(format!("unknown sort time: {}", other)),
        }
    }
}

/// Where a listing is loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Subreddit,
    User,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SourceKind::Subreddit => f.write_str("subreddit"),
            SourceKind::User => f.write_str("user"),
        }
    }
}

/// A single-page listing request against either a subreddit or a user
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRequest {
    pub source: SourceKind,
    pub name: String,
    /// Subreddit listings fall back to `hot`, user listings use Reddit's default
    pub sort: Option<SortType>,
    pub time: Option<SortTime>,
    pub limit: Option<u32>,
}

impl ListingRequest {
    pub fn subreddit(name: &str) -> Self {
        Self {
            source: SourceKind::Subreddit,
            name: name.to_string(),
            sort: None,
            time: None,
            limit: None,
        }
    }

    pub fn user(name: &str) -> Self {
        Self {
            source: SourceKind::User,
            name: name.to_string(),
            sort: None,
            time: None,
            limit: None,
        }
    }

    pub fn sort(mut self, sort: SortType) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn time(mut self, time: SortTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
