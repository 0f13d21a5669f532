//! Turns catalog records into Telegram HTML replies.

use chrono::{Datelike, NaiveDate};
use teloxide::utils::html;

use crate::models::{MenuOption, MovieDetail, MovieSummary, OutboundReply, SelectionToken};
use crate::tmdb::LIST_LIMIT;

/// Telegram counts caption length after entity parsing; raw HTML is always longer.
pub const CAPTION_LIMIT: usize = 1024;
pub const MESSAGE_LIMIT: usize = 4096;
const SUMMARY_OVERVIEW_LIMIT: usize = 300;

pub const NO_TRAILER: &str = "Not found";
pub const NO_PROVIDERS: &str = "No OTT platforms available";
pub const NO_RATING: &str = "No rating available.";

pub const WELCOME_TEXT: &str = "Welcome to CineScout! 🎬\n\n\
/latest - today's newest releases\n\
/trending - what everyone is watching today\n\
/search &lt;movie name&gt; - find a movie and see where to stream it\n\n\
You can also just send me a movie name.";

pub fn render_summary_list(
    heading: &str,
    empty_message: &str,
    items: &[MovieSummary],
) -> OutboundReply {
    if items.is_empty() {
        return OutboundReply::PlainText(empty_message.to_string());
    }

    let mut message = format!("{}\n\n", html::bold(&html::escape(heading)));
    for movie in items.iter().take(LIST_LIMIT) {
        message.push_str(&format!(
            "🎬 {}\n📅 Release Date: {}\n📝 {}\n\n",
            html::bold(&html::escape(&movie.title)),
            release_date_text(movie.release_date),
            html::escape(&clip(&movie.overview, SUMMARY_OVERVIEW_LIMIT)),
        ));
    }
    OutboundReply::PlainText(message.trim_end().to_string())
}

pub fn render_menu(
    query: &str,
    total: u64,
    items: &[MovieSummary],
    tokens: &[SelectionToken],
) -> OutboundReply {
    let options: Vec<MenuOption> = items
        .iter()
        .zip(tokens)
        .take(LIST_LIMIT)
        .map(|(movie, token)| MenuOption {
            label: menu_label(movie),
            token: token.token.clone(),
        })
        .collect();

    let noun = if total == 1 { "result" } else { "results" };
    let text = format!(
        "Found {} {} for '{}'. Pick one:",
        total,
        noun,
        html::escape(query)
    );
    OutboundReply::MenuText { text, options }
}

pub fn menu_label(movie: &MovieSummary) -> String {
    let year = movie
        .release_date
        .map(|d| format!("{:04}", d.year()))
        .unwrap_or_else(|| "N/A".to_string());
    format!("{} ({})", movie.title, year)
}

/// A poster makes this a photo card with a short caption; without one it is a
/// text card sent with link previews disabled.
pub fn render_detail_card(detail: &MovieDetail) -> OutboundReply {
    let limit = if detail.poster_url.is_some() {
        CAPTION_LIMIT
    } else {
        MESSAGE_LIMIT
    };
    OutboundReply::MediaCard {
        image_url: detail.poster_url.clone(),
        caption: card_caption(detail, limit),
        trailer_url: detail.trailer_url.clone(),
    }
}

fn card_caption(detail: &MovieDetail, limit: usize) -> String {
    let rating = if detail.rating > 0.0 {
        format!("{:.1}/10", detail.rating)
    } else {
        NO_RATING.to_string()
    };
    let providers = if detail.streaming_providers.is_empty() {
        NO_PROVIDERS.to_string()
    } else {
        detail.streaming_providers.join(", ")
    };
    let trailer = match &detail.trailer_url {
        Some(url) => format!("<a href=\"{}\">Watch Trailer</a>", html::escape(url)),
        None => format!("Trailer: {NO_TRAILER}"),
    };

    let prefix = format!(
        "🎬 {}\n\n📅 Release Date: {}\n\n⭐ Rating: {}\n\n🌐 Languages: {}\n\n📺 OTT: {}\n\n▶️ {}\n\n📝 <i>",
        html::bold(&html::escape(&detail.title)),
        release_date_text(detail.release_date),
        html::escape(&rating),
        html::escape(&detail.spoken_languages.join(", ")),
        html::escape(&providers),
        trailer,
    );
    let suffix = "</i>";

    let budget = limit.saturating_sub(prefix.chars().count() + suffix.chars().count());
    let overview = html::escape(&clip(&detail.overview, budget));
    format!("{prefix}{overview}{suffix}")
}

fn release_date_text(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::register;

    fn summary(id: u64, title: &str, date: Option<(i32, u32, u32)>) -> MovieSummary {
        MovieSummary {
            id,
            title: title.to_string(),
            release_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            overview: "Overview".to_string(),
            poster_path: None,
        }
    }

    fn detail(poster: Option<&str>, trailer: Option<&str>) -> MovieDetail {
        MovieDetail {
            id: 27205,
            title: "Inception".to_string(),
            release_date: NaiveDate::from_ymd_opt(2010, 7, 15),
            overview: "Cobb & co. enter dreams.".to_string(),
            rating: 8.369,
            spoken_languages: vec!["English".to_string(), "Japanese".to_string()],
            streaming_providers: vec![],
            trailer_url: trailer.map(str::to_string),
            poster_url: poster.map(str::to_string),
        }
    }

    #[test]
    fn empty_list_is_exactly_the_empty_message() {
        let reply = render_summary_list("Latest releases", "No latest releases found.", &[]);
        assert_eq!(
            reply,
            OutboundReply::PlainText("No latest releases found.".to_string())
        );
    }

    #[test]
    fn list_escapes_titles_and_shows_dates() {
        let items = vec![
            summary(1, "Fast & Furious", Some((2009, 4, 3))),
            summary(2, "Untold", None),
        ];
        let reply = render_summary_list("Trending movies", "none", &items);
        let text = reply.text().unwrap();
        assert!(text.starts_with("<b>Trending movies</b>"));
        assert!(text.contains("<b>Fast &amp; Furious</b>"));
        assert!(text.contains("Release Date: 2009-04-03"));
        assert!(text.contains("Release Date: N/A"));
    }

    #[test]
    fn menu_caps_options_and_reports_total() {
        let items: Vec<_> = (1..=8)
            .map(|i| summary(i, &format!("Movie {i}"), if i % 2 == 0 { Some((1999, 1, 1)) } else { None }))
            .collect();
        let tokens = register(&items);
        let OutboundReply::MenuText { text, options } = render_menu("movie", 120, &items, &tokens) else {
            panic!("expected a menu");
        };
        assert_eq!(options.len(), 5);
        assert!(text.contains("Found 120 results"));
        for option in &options {
            assert!(option.label.ends_with("(1999)") || option.label.ends_with("(N/A)"));
        }
        assert_eq!(options[0].token, tokens[0].token);
    }

    #[test]
    fn card_sections_follow_fixed_order() {
        let OutboundReply::MediaCard { caption, .. } = render_detail_card(&detail(None, None)) else {
            panic!("expected a card");
        };
        let order = ["Inception", "Release Date", "Rating", "Languages", "OTT", "Trailer", "Cobb"];
        let positions: Vec<usize> = order.iter().map(|s| caption.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{caption}");
        assert!(caption.contains("⭐ Rating: 8.4/10"));
        assert!(caption.contains("🌐 Languages: English, Japanese"));
        assert!(caption.contains(NO_PROVIDERS));
        assert!(caption.contains("Trailer: Not found"));
        assert!(caption.contains("<i>Cobb &amp; co. enter dreams.</i>"));
    }

    #[test]
    fn poster_decides_card_variant() {
        let with_poster = render_detail_card(&detail(Some("https://image.tmdb.org/p.jpg"), None));
        assert!(matches!(with_poster, OutboundReply::MediaCard { image_url: Some(_), .. }));
        let without = render_detail_card(&detail(None, Some("https://www.youtube.com/watch?v=abc")));
        let OutboundReply::MediaCard { image_url, caption, trailer_url } = without else {
            panic!("expected a card");
        };
        assert!(image_url.is_none());
        assert!(caption.contains("<a href=\"https://www.youtube.com/watch?v=abc\">Watch Trailer</a>"));
        assert_eq!(trailer_url.as_deref(), Some("https://www.youtube.com/watch?v=abc"));
    }

    #[test]
    fn long_overview_fits_photo_caption() {
        let mut movie = detail(Some("https://image.tmdb.org/p.jpg"), None);
        movie.overview = "word ".repeat(600);
        let OutboundReply::MediaCard { caption, .. } = render_detail_card(&movie) else {
            panic!("expected a card");
        };
        assert!(caption.chars().count() <= CAPTION_LIMIT);
        assert!(caption.contains('…'));
    }

    #[test]
    fn nul_in_provider_text_does_not_move_overview() {
        let mut movie = detail(None, None);
        movie.title = "Null\u{0}Title".to_string();
        movie.streaming_providers = vec!["Odd\u{0}Stream".to_string()];
        let caption = render_detail_card(&movie).text().unwrap().to_string();
        assert!(caption.contains("<b>Null\u{0}Title</b>"));
        assert!(caption.contains("📺 OTT: Odd\u{0}Stream"));
        assert!(caption.ends_with("📝 <i>Cobb &amp; co. enter dreams.</i>"));
    }

    #[test]
    fn missing_rating_uses_placeholder() {
        let mut movie = detail(None, None);
        movie.rating = 0.0;
        let caption = render_detail_card(&movie).text().unwrap().to_string();
        assert!(caption.contains("⭐ Rating: No rating available."));
    }

    #[test]
    fn clip_keeps_short_text() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("abcdef", 4), "abc…");
        assert_eq!(clip("abc", 0), "");
    }
}
