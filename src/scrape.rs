use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{FetchFailure, ScrapeError};
use crate::extract::extract_messages;
use crate::message::ChannelMessage;

const BASE_URL: &str = "https://t.me/s";

/// Fetches one preview page as raw HTML. Implemented over reqwest in
/// production; tests script it with canned pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchFailure>;
}

/// Production fetcher over a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent("Mozilla/5.0 (compatible; tg-scrape/0.1)")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))
    }
}

/// Walks a channel's message history backward, page by page, starting
/// from the newest message id observed on the default preview page.
pub struct ChannelScraper<F: PageFetcher> {
    fetcher: F,
    delay: Duration,
    max_empty_responses: u32,
}

impl<F: PageFetcher> ChannelScraper<F> {
    pub fn new(fetcher: F, delay: Duration, max_empty_responses: u32) -> Self {
        Self {
            fetcher,
            delay,
            max_empty_responses,
        }
    }

    /// Collect every message reachable by backward pagination.
    ///
    /// Fails only on the initial page: a fetch failure or a page with
    /// zero records aborts the run. Once pagination has started, any
    /// fetch failure ends the loop and whatever was collected so far is
    /// returned.
    pub async fn scrape(&self, channel: &str) -> Result<Vec<ChannelMessage>, ScrapeError> {
        let channel = channel.trim_start_matches('@');

        let url = format!("{}/{}", BASE_URL, channel);
        let html = self
            .fetcher
            .fetch_page(&url)
            .await
            .map_err(ScrapeError::Fetch)?;

        let mut all_messages = extract_messages(&html);
        if all_messages.is_empty() {
            return Err(ScrapeError::NoMessages);
        }
        println!("Found initial {} messages", all_messages.len());

        let mut seen_ids: HashSet<u64> = all_messages.iter().filter_map(|m| m.id).collect();

        // Without a numeric id on the first page there is no anchor to
        // paginate from; return what the page gave us.
        let Some(max_id) = seen_ids.iter().copied().max() else {
            return Ok(all_messages);
        };

        let mut current_id = max_id;
        let mut consecutive_empty = 0u32;

        loop {
            let url = format!("{}/{}/{}", BASE_URL, channel, current_id);
            let html = match self.fetcher.fetch_page(&url).await {
                Ok(html) => html,
                Err(failure) => {
                    // Mid-loop failures end the crawl, they don't fail it.
                    eprintln!("Failed to fetch messages: {}", failure);
                    break;
                }
            };

            let page_messages = extract_messages(&html);

            if page_messages.is_empty() {
                consecutive_empty += 1;
                println!(
                    "No messages found for ID {}. Empty responses: {}",
                    current_id, consecutive_empty
                );
                if consecutive_empty >= self.max_empty_responses {
                    println!("Reached maximum number of consecutive empty responses. Stopping.");
                    break;
                }
            } else {
                consecutive_empty = 0;

                let page_min = page_messages.iter().filter_map(|m| m.id).min();
                let before = all_messages.len();
                for message in page_messages {
                    match message.id {
                        Some(id) => {
                            if seen_ids.insert(id) {
                                all_messages.push(message);
                            }
                        }
                        // Records without an id have no dedup key; keep them.
                        None => all_messages.push(message),
                    }
                }
                println!(
                    "Fetched {} new messages. Total: {}",
                    all_messages.len() - before,
                    all_messages.len()
                );

                match page_min {
                    Some(min_id) => current_id = min_id.saturating_sub(1),
                    // A page of only id-less records leaves no anchor to
                    // continue from.
                    None => break,
                }
            }

            if current_id <= 1 {
                println!("Reached the beginning of the channel. Stopping.");
                break;
            }

            tokio::time::sleep(self.delay).await;
        }

        Ok(all_messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct ScriptedFetcher {
        pages: HashMap<String, Result<String, FetchFailure>>,
    }

    impl ScriptedFetcher {
        fn new() -> Self {
            Self {
                pages: HashMap::new(),
            }
        }

        fn page(mut self, url: &str, html: String) -> Self {
            self.pages.insert(url.to_string(), Ok(html));
            self
        }

        fn failure(mut self, url: &str, failure: FetchFailure) -> Self {
            self.pages.insert(url.to_string(), Err(failure));
            self
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch_page(&self, url: &str) -> Result<String, FetchFailure> {
            match self.pages.get(url) {
                Some(result) => result.clone(),
                // Unknown anchors render as pages with no messages.
                None => Ok(String::new()),
            }
        }
    }

    fn page_html(channel: &str, ids: &[u64]) -> String {
        ids.iter()
            .map(|id| {
                format!(
                    r#"<div class="tgme_widget_message" data-post="{}/{}"><div class="tgme_widget_message_text">msg {}</div></div>"#,
                    channel, id, id
                )
            })
            .collect()
    }

    fn scraper(fetcher: ScriptedFetcher) -> ChannelScraper<ScriptedFetcher> {
        ChannelScraper::new(fetcher, Duration::ZERO, 3)
    }

    #[tokio::test]
    async fn test_initial_fetch_failure_is_fatal() {
        let fetcher =
            ScriptedFetcher::new().failure("https://t.me/s/chan", FetchFailure::Status(404));
        let result = scraper(fetcher).scrape("chan").await;
        assert_eq!(result, Err(ScrapeError::Fetch(FetchFailure::Status(404))));
    }

    #[tokio::test]
    async fn test_empty_initial_page_is_no_messages() {
        let fetcher = ScriptedFetcher::new().page("https://t.me/s/chan", String::new());
        let result = scraper(fetcher).scrape("chan").await;
        assert_eq!(result, Err(ScrapeError::NoMessages));
    }

    #[tokio::test]
    async fn test_leading_at_is_stripped() {
        let fetcher =
            ScriptedFetcher::new().page("https://t.me/s/chan", page_html("chan", &[10]));
        let messages = scraper(fetcher).scrape("@chan").await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, Some(10));
    }

    #[tokio::test]
    async fn test_three_empty_pages_stop_the_loop() {
        // Only the initial page exists; every anchor page is empty, so
        // the loop retries anchor 9 until the empty-response cap.
        let fetcher =
            ScriptedFetcher::new().page("https://t.me/s/chan", page_html("chan", &[10, 9]));
        let messages = scraper(fetcher).scrape("chan").await.unwrap();
        let ids: Vec<Option<u64>> = messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![Some(10), Some(9)]);
    }

    #[tokio::test]
    async fn test_mid_loop_fetch_failure_is_a_soft_stop() {
        let fetcher = ScriptedFetcher::new()
            .page("https://t.me/s/chan", page_html("chan", &[100, 99, 98]))
            .failure("https://t.me/s/chan/100", FetchFailure::Status(429));
        let messages = scraper(fetcher).scrape("chan").await.unwrap();
        assert_eq!(messages.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicates_from_later_pages_are_dropped() {
        let fetcher = ScriptedFetcher::new()
            .page("https://t.me/s/chan", page_html("chan", &[100, 99]))
            .page("https://t.me/s/chan/100", page_html("chan", &[100, 99, 98]));
        let messages = scraper(fetcher).scrape("chan").await.unwrap();
        let ids: Vec<Option<u64>> = messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![Some(100), Some(99), Some(98)]);
    }

    #[tokio::test]
    async fn test_anchor_at_or_below_one_stops_the_loop() {
        let fetcher = ScriptedFetcher::new()
            .page("https://t.me/s/chan", page_html("chan", &[3, 2]))
            .page("https://t.me/s/chan/3", page_html("chan", &[3, 2, 1]));
        let messages = scraper(fetcher).scrape("chan").await.unwrap();
        let ids: Vec<Option<u64>> = messages.iter().map(|m| m.id).collect();
        // Anchor becomes min(1) - 1 = 0, which terminates pagination.
        assert_eq!(ids, vec![Some(3), Some(2), Some(1)]);
    }

    #[tokio::test]
    async fn test_id_less_records_are_kept_but_never_anchor() {
        let html = format!(
            "{}{}",
            page_html("chan", &[20]),
            r#"<div class="tgme_widget_message" data-post="chan/pinned"></div>"#,
        );
        let fetcher = ScriptedFetcher::new().page("https://t.me/s/chan", html);
        let messages = scraper(fetcher).scrape("chan").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].id, None);
    }

    #[tokio::test]
    async fn test_backward_walk_collects_whole_history() {
        // First page {100, 99, 98}; the page anchored at 100 repeats
        // them; the page anchored at 97 adds {97, 96}; below that the
        // channel has nothing, so three empties end the crawl.
        let fetcher = ScriptedFetcher::new()
            .page("https://t.me/s/chan", page_html("chan", &[100, 99, 98]))
            .page("https://t.me/s/chan/100", page_html("chan", &[100, 99, 98]))
            .page("https://t.me/s/chan/97", page_html("chan", &[97, 96]));
        let messages = scraper(fetcher).scrape("chan").await.unwrap();
        let mut ids: Vec<u64> = messages.iter().filter_map(|m| m.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![96, 97, 98, 99, 100]);
    }
}
