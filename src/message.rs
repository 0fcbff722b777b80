use serde::Serialize;

/// One message scraped from a channel preview page.
///
/// Field order here is the field order in the serialized JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelMessage {
    /// Numeric message id, absent when the id segment of `data-post`
    /// is not all-digit.
    pub id: Option<u64>,
    /// ISO-8601 datetime string, empty when the page carries none.
    pub date: String,
    /// Plain message text with inline markup collapsed.
    pub text: String,
    /// Raw view-count display text, `"0"` when absent.
    pub views: String,
    /// Canonical `https://t.me/{channel}/{id}` link.
    pub link: String,
}

impl ChannelMessage {
    /// Sort key used for persistence; an absent id orders as 0.
    pub fn sort_id(&self) -> u64 {
        self.id.unwrap_or(0)
    }
}
