use chrono::NaiveDate;

pub const NO_DESCRIPTION: &str = "No description available.";

/// One row of a discover, trending or search listing.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieSummary {
    pub id: u64,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub overview: String,
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub total: u64,
    pub movies: Vec<MovieSummary>,
}

/// Detail record assembled from the movie, watch-provider and video lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetail {
    pub id: u64,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub overview: String,
    pub rating: f64,
    pub spoken_languages: Vec<String>,
    pub streaming_providers: Vec<String>,
    pub trailer_url: Option<String>,
    pub poster_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionToken {
    pub token: String,
    pub movie_id: u64,
}

/// A chat event after normalization. Commands and plain text both end up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Start,
    Latest,
    Trending,
    Search(String),
    Selection(String),
}

impl InboundEvent {
    /// Normalizes the text of an incoming message.
    ///
    /// `/search <args>` and plain text both become [`InboundEvent::Search`]. A
    /// `@botname` suffix on a command is ignored and unknown commands fall back to
    /// the welcome text.
    pub fn from_message_text(text: &str) -> Self {
        let trimmed = text.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return InboundEvent::Search(trimmed.to_string());
        };

        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        let command = head.split('@').next().unwrap_or(head).to_ascii_lowercase();

        match command.as_str() {
            "latest" => InboundEvent::Latest,
            "trending" => InboundEvent::Trending,
            "search" => InboundEvent::Search(args.to_string()),
            _ => InboundEvent::Start,
        }
    }

    pub fn from_callback_data(data: &str) -> Self {
        InboundEvent::Selection(data.to_string())
    }

    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::Start => "start",
            InboundEvent::Latest => "latest",
            InboundEvent::Trending => "trending",
            InboundEvent::Search(_) => "search",
            InboundEvent::Selection(_) => "selection",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub label: String,
    pub token: String,
}

/// What the transport should send back. All text is Telegram HTML.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundReply {
    PlainText(String),
    MenuText {
        text: String,
        options: Vec<MenuOption>,
    },
    MediaCard {
        image_url: Option<String>,
        caption: String,
        trailer_url: Option<String>,
    },
    /// Answer a button press without sending anything.
    Acknowledge,
}

impl OutboundReply {
    pub fn text(&self) -> Option<&str> {
        match self {
            OutboundReply::PlainText(text) => Some(text),
            OutboundReply::MenuText { text, .. } => Some(text),
            OutboundReply::MediaCard { caption, .. } => Some(caption),
            OutboundReply::Acknowledge => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_becomes_search() {
        assert_eq!(
            InboundEvent::from_message_text("  The Matrix "),
            InboundEvent::Search("The Matrix".to_string())
        );
    }

    #[test]
    fn search_command_and_plain_text_share_one_variant() {
        assert_eq!(
            InboundEvent::from_message_text("/search  Inception "),
            InboundEvent::from_message_text("Inception")
        );
        assert_eq!(
            InboundEvent::from_message_text("/search"),
            InboundEvent::Search(String::new())
        );
    }

    #[test]
    fn commands_are_recognized_with_bot_suffix_and_case() {
        assert_eq!(
            InboundEvent::from_message_text("/latest@cinescout_bot"),
            InboundEvent::Latest
        );
        assert_eq!(
            InboundEvent::from_message_text("/Trending"),
            InboundEvent::Trending
        );
        assert_eq!(
            InboundEvent::from_message_text("/search@cinescout_bot Heat"),
            InboundEvent::Search("Heat".to_string())
        );
    }

    #[test]
    fn start_help_and_unknown_commands_show_welcome() {
        assert_eq!(InboundEvent::from_message_text("/start"), InboundEvent::Start);
        assert_eq!(InboundEvent::from_message_text("/help"), InboundEvent::Start);
        assert_eq!(InboundEvent::from_message_text("/nope"), InboundEvent::Start);
    }
}
