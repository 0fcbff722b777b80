pub mod error;
pub mod extract;
pub mod message;
pub mod persist;
pub mod scrape;

pub use error::{FetchFailure, ScrapeError};
pub use message::ChannelMessage;
pub use scrape::{ChannelScraper, HttpFetcher, PageFetcher};
