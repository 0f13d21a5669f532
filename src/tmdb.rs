use anyhow::Context;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::models::{MovieDetail, MovieSummary, SearchResults, NO_DESCRIPTION};

const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const POSTER_BASE: &str = "https://image.tmdb.org/t/p/original";
pub const LIST_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} -> {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("detail lookup for movie {movie_id} exceeded {deadline:?}")]
    DeadlineElapsed { movie_id: u64, deadline: Duration },
}

impl CatalogError {
    pub fn is_timeout(&self) -> bool {
        match self {
            CatalogError::Transport { source, .. } => source.is_timeout() || source.is_connect(),
            CatalogError::DeadlineElapsed { .. } => true,
            CatalogError::Status { .. } | CatalogError::Decode { .. } => false,
        }
    }
}

#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn discover_recent(&self) -> Result<Vec<MovieSummary>, CatalogError>;
    async fn trending(&self) -> Result<Vec<MovieSummary>, CatalogError>;
    async fn search_movie(&self, query: &str) -> Result<SearchResults, CatalogError>;
    async fn fetch_detail(&self, id: u64) -> Result<MovieDetail, CatalogError>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    region: String,
    detail_deadline: Duration,
}

impl TmdbClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let user_agent = format!("cinescout/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.request_timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            base_url: TMDB_BASE.to_string(),
            api_key: config.tmdb_api_key.clone(),
            region: config.watch_region.clone(),
            detail_deadline: config.detail_deadline,
        })
    }

    /// Points the client at another TMDB-compatible host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, CatalogError> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| CatalogError::Transport {
                url: redact(url),
                source,
            })?;
        let status = res.status();
        let text = res.text().await.map_err(|source| CatalogError::Transport {
            url: redact(url),
            source,
        })?;
        if !status.is_success() {
            return Err(CatalogError::Status {
                url: redact(url),
                status,
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|source| CatalogError::Decode {
            url: redact(url),
            source,
        })
    }

    async fn fetch_detail_parts(&self, id: u64) -> Result<MovieDetail, CatalogError> {
        let base = &self.base_url;
        let url_detail = format!("{base}/movie/{id}?language=en-US&api_key={}", self.api_key);
        let url_providers = format!("{base}/movie/{id}/watch/providers?api_key={}", self.api_key);
        let url_videos = format!("{base}/movie/{id}/videos?api_key={}", self.api_key);

        let (detail, providers, videos) = tokio::try_join!(
            self.get_json::<RawDetail>(&url_detail),
            self.get_json::<WatchProviders>(&url_providers),
            self.get_json::<Videos>(&url_videos),
        )?;
        Ok(assemble_detail(detail, &providers, &videos, &self.region))
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn discover_recent(&self) -> Result<Vec<MovieSummary>, CatalogError> {
        let url = discover_url(&self.base_url, &self.api_key, Utc::now().date_naive());
        let page: ResultsPage = self.get_json(&url).await?;
        Ok(top_summaries(page))
    }

    async fn trending(&self) -> Result<Vec<MovieSummary>, CatalogError> {
        let url = format!(
            "{}/trending/movie/day?language=en-US&api_key={}",
            self.base_url, self.api_key
        );
        let page: ResultsPage = self.get_json(&url).await?;
        Ok(top_summaries(page))
    }

    async fn search_movie(&self, query: &str) -> Result<SearchResults, CatalogError> {
        let url = format!(
            "{}/search/movie?api_key={}&query={}&language=en-US",
            self.base_url,
            self.api_key,
            urlencoding::encode(query)
        );
        let page: ResultsPage = self.get_json(&url).await?;
        Ok(search_results(page))
    }

    /// All three lookups must succeed; a failure in any of them fails the whole
    /// detail fetch and the partial results are dropped.
    async fn fetch_detail(&self, id: u64) -> Result<MovieDetail, CatalogError> {
        tokio::time::timeout(self.detail_deadline, self.fetch_detail_parts(id))
            .await
            .map_err(|_| CatalogError::DeadlineElapsed {
                movie_id: id,
                deadline: self.detail_deadline,
            })?
    }
}

/// Sorts and filters on the same field so titles with an early festival date but
/// a future primary release stay out of the list.
fn discover_url(base: &str, api_key: &str, today: NaiveDate) -> String {
    format!(
        "{base}/discover/movie?sort_by=primary_release_date.desc&primary_release_date.lte={today}&language=en-US&api_key={api_key}"
    )
}

fn redact(url: &str) -> String {
    match url.find("api_key=") {
        Some(pos) => {
            let tail = &url[pos + "api_key=".len()..];
            let rest = tail.find('&').map(|i| &tail[i..]).unwrap_or("");
            format!("{}api_key=***{}", &url[..pos], rest)
        }
        None => url.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct ResultsPage {
    #[serde(default)]
    results: Vec<RawMovie>,
    #[serde(default)]
    total_results: u64,
}

#[derive(Debug, Deserialize)]
struct RawMovie {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    release_date: Option<NaiveDate>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDetail {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    release_date: Option<NaiveDate>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    vote_average: Option<f64>,
    #[serde(default)]
    spoken_languages: Vec<SpokenLanguage>,
    #[serde(default)]
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpokenLanguage {
    #[serde(default)]
    english_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WatchProviders {
    #[serde(default)]
    results: HashMap<String, RegionProviders>,
}

#[derive(Debug, Deserialize)]
struct RegionProviders {
    #[serde(default)]
    flatrate: Vec<Provider>,
}

#[derive(Debug, Deserialize)]
struct Provider {
    #[serde(default)]
    provider_name: String,
}

#[derive(Debug, Deserialize)]
struct Videos {
    #[serde(default)]
    results: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    #[serde(default)]
    site: String,
    #[serde(rename = "type", default)]
    video_type: String,
    #[serde(default)]
    key: String,
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
}

fn overview_or_default(overview: Option<String>) -> String {
    overview
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .unwrap_or_else(|| NO_DESCRIPTION.to_string())
}

fn title_or_default(title: Option<String>) -> String {
    title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string())
}

impl From<RawMovie> for MovieSummary {
    fn from(raw: RawMovie) -> Self {
        MovieSummary {
            id: raw.id,
            title: title_or_default(raw.title),
            release_date: raw.release_date,
            overview: overview_or_default(raw.overview),
            poster_path: raw.poster_path.filter(|p| !p.is_empty()),
        }
    }
}

fn top_summaries(page: ResultsPage) -> Vec<MovieSummary> {
    page.results
        .into_iter()
        .take(LIST_LIMIT)
        .map(MovieSummary::from)
        .collect()
}

fn search_results(page: ResultsPage) -> SearchResults {
    let movies: Vec<MovieSummary> = page.results.into_iter().map(MovieSummary::from).collect();
    SearchResults {
        total: page.total_results.max(movies.len() as u64),
        movies,
    }
}

fn assemble_detail(
    detail: RawDetail,
    providers: &WatchProviders,
    videos: &Videos,
    region: &str,
) -> MovieDetail {
    let spoken_languages = detail
        .spoken_languages
        .into_iter()
        .filter_map(|l| l.english_name.or(l.name))
        .filter(|name| !name.is_empty())
        .collect();

    MovieDetail {
        id: detail.id,
        title: title_or_default(detail.title),
        release_date: detail.release_date,
        overview: overview_or_default(detail.overview),
        rating: detail.vote_average.unwrap_or(0.0),
        spoken_languages,
        streaming_providers: region_providers(providers, region),
        trailer_url: select_trailer(videos),
        poster_url: detail
            .poster_path
            .filter(|p| !p.is_empty())
            .map(|p| format!("{POSTER_BASE}{p}")),
    }
}

fn region_providers(providers: &WatchProviders, region: &str) -> Vec<String> {
    providers
        .results
        .get(region)
        .map(|r| {
            r.flatrate
                .iter()
                .map(|p| p.provider_name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn select_trailer(videos: &Videos) -> Option<String> {
    videos
        .results
        .iter()
        .find(|v| v.site == "YouTube" && v.video_type == "Trailer" && !v.key.is_empty())
        .map(|v| {
            format!(
                "https://www.youtube.com/watch?v={}",
                urlencoding::encode(&v.key)
            )
        })
}
