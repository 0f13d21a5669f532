//! Run the catalog client against TMDB and print what the bot would reply.
//! Usage:
//!   cargo run --bin tmdb_props -- search <query>
//!   cargo run --bin tmdb_props -- detail <tmdb_id>
//!   cargo run --bin tmdb_props -- latest
//!   cargo run --bin tmdb_props -- trending
//! Requires TMDB_API_KEY in the environment (.env supported). BOT_TOKEN may be a
//! placeholder since nothing is sent to Telegram.

use anyhow::{bail, Context, Result};
use cinescout::app::Dispatcher;
use cinescout::config::Config;
use cinescout::models::{InboundEvent, OutboundReply};
use cinescout::render;
use cinescout::tmdb::{TmdbApi, TmdbClient};
use dotenvy::dotenv;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some((mode, rest)) = args.split_first() else {
        bail!("usage: tmdb_props <search|detail|latest|trending> [args]");
    };

    let config = Config::from_lookup(|key| match key {
        "BOT_TOKEN" => Some(env::var(key).unwrap_or_else(|_| "unused".to_string())),
        _ => env::var(key).ok(),
    })?;
    let client = Arc::new(TmdbClient::new(&config)?);

    let event = match mode.as_str() {
        "search" => InboundEvent::Search(rest.join(" ")),
        "latest" => InboundEvent::Latest,
        "trending" => InboundEvent::Trending,
        "detail" => {
            let id: u64 = rest
                .first()
                .context("detail needs a TMDB id")?
                .parse()
                .context("TMDB id must be numeric")?;
            let detail = client.fetch_detail(id).await?;
            println!("{:#?}", detail);
            print_reply(render::render_detail_card(&detail));
            return Ok(());
        }
        other => bail!("unknown mode '{}'", other),
    };

    let dispatcher = Dispatcher::new(client);
    print_reply(dispatcher.handle(event).await);
    Ok(())
}

fn print_reply(reply: OutboundReply) {
    match reply {
        OutboundReply::MenuText { text, options } => {
            println!("{}", text);
            for option in options {
                println!("  [{}] -> {}", option.label, option.token);
            }
        }
        OutboundReply::MediaCard {
            image_url, caption, ..
        } => {
            println!("image: {}", image_url.as_deref().unwrap_or("(none, text card)"));
            println!("{}", caption);
        }
        OutboundReply::PlainText(text) => println!("{}", text),
        OutboundReply::Acknowledge => println!("(acknowledged)"),
    }
}
