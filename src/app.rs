use crate::config::Config;
use crate::failure::classify;
use crate::health;
use crate::models::{InboundEvent, OutboundReply};
use crate::render::{self, WELCOME_TEXT};
use crate::selection;
use crate::telegram;
use crate::tmdb::{CatalogError, TmdbApi, TmdbClient, LIST_LIMIT};
use anyhow::Result;
use std::sync::Arc;
use teloxide::Bot;
use tracing::{debug, info, warn};

pub const LATEST_HEADING: &str = "Latest releases";
pub const LATEST_EMPTY: &str = "No latest releases found.";
pub const TRENDING_HEADING: &str = "Trending movies today";
pub const TRENDING_EMPTY: &str = "No trending movies found.";
pub const EMPTY_QUERY: &str = "Please provide a movie name to search, like /search &lt;movie name&gt;.";

/// Routes normalized chat events to the catalog and renderer.
///
/// Holds no per-chat state: a search menu is correlated with the later button
/// press through the selection token alone.
#[derive(Clone)]
pub struct Dispatcher {
    tmdb: Arc<dyn TmdbApi>,
}

impl Dispatcher {
    pub fn new(tmdb: Arc<dyn TmdbApi>) -> Self {
        Self { tmdb }
    }

    pub async fn handle(&self, event: InboundEvent) -> OutboundReply {
        debug!(event = event.name(), "Dispatching event");
        match event {
            InboundEvent::Start => OutboundReply::PlainText(WELCOME_TEXT.to_string()),
            InboundEvent::Latest => match self.tmdb.discover_recent().await {
                Ok(movies) => render::render_summary_list(LATEST_HEADING, LATEST_EMPTY, &movies),
                Err(e) => failure_reply("latest", &e),
            },
            InboundEvent::Trending => match self.tmdb.trending().await {
                Ok(movies) => {
                    render::render_summary_list(TRENDING_HEADING, TRENDING_EMPTY, &movies)
                }
                Err(e) => failure_reply("trending", &e),
            },
            InboundEvent::Search(text) => self.search(&text).await,
            InboundEvent::Selection(token) => self.select(&token).await,
        }
    }

    async fn search(&self, text: &str) -> OutboundReply {
        let query = text.trim();
        if query.is_empty() {
            return OutboundReply::PlainText(EMPTY_QUERY.to_string());
        }

        let results = match self.tmdb.search_movie(query).await {
            Ok(results) => results,
            Err(e) => return failure_reply("search", &e),
        };
        if results.movies.is_empty() {
            info!("No TMDB match for '{}'", query);
            return OutboundReply::PlainText(no_results_message(query));
        }

        let candidates = &results.movies[..results.movies.len().min(LIST_LIMIT)];
        let tokens = selection::register(candidates);
        info!(
            "Search '{}' matched {} movies, offering {}",
            query,
            results.total,
            tokens.len()
        );
        render::render_menu(query, results.total, candidates, &tokens)
    }

    async fn select(&self, token: &str) -> OutboundReply {
        let movie_id = match selection::resolve(token) {
            Ok(id) => id,
            Err(e) => {
                warn!("Ignoring button press: {}", e);
                return OutboundReply::Acknowledge;
            }
        };

        info!("Fetching TMDB detail for movie {}", movie_id);
        match self.tmdb.fetch_detail(movie_id).await {
            Ok(detail) => render::render_detail_card(&detail),
            Err(e) => failure_reply("selection", &e),
        }
    }
}

pub fn no_results_message(query: &str) -> String {
    format!(
        "No results found for '{}'.",
        teloxide::utils::html::escape(query)
    )
}

fn failure_reply(operation: &str, err: &CatalogError) -> OutboundReply {
    let kind = classify(err);
    warn!(operation, kind = ?kind, "TMDB call failed: {}", err);
    OutboundReply::PlainText(kind.user_message().to_string())
}

pub async fn run_bot(config: &Config) -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::new(config)?);
    let dispatcher = Arc::new(Dispatcher::new(tmdb));
    info!(
        "Using watch region {} with {:?} request timeout",
        config.watch_region, config.request_timeout
    );

    if let Some(addr) = config.health_addr {
        tokio::spawn(async move {
            if let Err(e) = health::serve(addr).await {
                warn!("Health endpoint stopped: {:?}", e);
            }
        });
    }

    let bot = Bot::new(&config.bot_token);
    telegram::run(bot, dispatcher).await;
    info!("Bot stopped");
    Ok(())
}
