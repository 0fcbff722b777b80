use std::error::Error;
use std::fmt;

/// Outcome of fetching a single preview page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The remote answered with a non-success HTTP status.
    Status(u16),
    /// The request never completed: connect error, timeout, body read.
    Transport(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Status(code) => write!(f, "HTTP status {}", code),
            FetchFailure::Transport(reason) => write!(f, "request failed: {}", reason),
        }
    }
}

impl Error for FetchFailure {}

/// Failure of a whole scrape run.
///
/// Only the initial page fetch and the initial extraction can fail a run;
/// everything after that degrades into a soft stop with partial results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeError {
    /// The channel's default preview page could not be fetched.
    Fetch(FetchFailure),
    /// The initial page yielded zero records; the channel is empty,
    /// private, or does not exist.
    NoMessages,
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeError::Fetch(failure) => {
                write!(f, "failed to access channel: {}", failure)
            }
            ScrapeError::NoMessages => write!(f, "no messages found in the channel"),
        }
    }
}

impl Error for ScrapeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ScrapeError::Fetch(failure) => Some(failure),
            ScrapeError::NoMessages => None,
        }
    }
}
