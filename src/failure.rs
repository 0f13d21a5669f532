use crate::tmdb::CatalogError;

pub const NETWORK_TIMEOUT_MESSAGE: &str =
    "Couldn't reach the movie database. Check your connection or try again in a moment.";
pub const UNEXPECTED_MESSAGE: &str =
    "Something went wrong while talking to the movie database. Please try again.";
pub const RENDER_FAILURE_MESSAGE: &str =
    "I got the movie data but couldn't display it. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NetworkTimeout,
    Unexpected,
}

impl FailureKind {
    pub fn user_message(self) -> &'static str {
        match self {
            FailureKind::NetworkTimeout => NETWORK_TIMEOUT_MESSAGE,
            FailureKind::Unexpected => UNEXPECTED_MESSAGE,
        }
    }
}

pub fn classify(err: &CatalogError) -> FailureKind {
    if err.is_timeout() {
        FailureKind::NetworkTimeout
    } else {
        FailureKind::Unexpected
    }
}
