use scraper::{ElementRef, Html, Selector};

use crate::message::ChannelMessage;

/// Extract all message records from one preview page.
///
/// Returns records in document order. A page with no recognizable
/// message elements yields an empty vec; a malformed element is skipped
/// without aborting the rest of the page.
pub fn extract_messages(html: &str) -> Vec<ChannelMessage> {
    let document = Html::parse_document(html);

    let Ok(message_selector) = Selector::parse("div.tgme_widget_message") else {
        return Vec::new();
    };

    document
        .select(&message_selector)
        .filter_map(parse_message)
        .collect()
}

/// Build one record from a `div.tgme_widget_message` element.
///
/// Returns `None` when the `data-post` attribute is absent or has fewer
/// than two `/`-separated segments.
fn parse_message(element: ElementRef) -> Option<ChannelMessage> {
    let post = element.value().attr("data-post")?;
    let segments: Vec<&str> = post.split('/').collect();
    if segments.len() < 2 {
        return None;
    }
    // The attribute is "<channel>/<numeric-id>"; keep the last two
    // segments as raw strings.
    let channel = segments[segments.len() - 2];
    let message_id = segments[segments.len() - 1];

    let date = element_attr(element, "time.time", "datetime").unwrap_or_default();
    let text = element_text(element, "div.tgme_widget_message_text").unwrap_or_default();
    let views =
        element_text(element, "span.tgme_widget_message_views").unwrap_or_else(|| "0".to_string());

    // All-digit ids become numeric; anything else stays an absent id,
    // but the record is kept either way.
    let id = if !message_id.is_empty() && message_id.bytes().all(|b| b.is_ascii_digit()) {
        message_id.parse::<u64>().ok()
    } else {
        None
    };

    Some(ChannelMessage {
        id,
        date,
        text,
        views,
        link: format!("https://t.me/{}/{}", channel, message_id),
    })
}

/// Extract an attribute from the first descendant matching the given CSS selector.
fn element_attr(element: ElementRef, selector_str: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    let found = element.select(&selector).next()?;
    found.value().attr(attr).map(|v| v.to_string())
}

/// Extract the inner text from the first descendant matching the given CSS
/// selector, with inline markup collapsed and outer whitespace trimmed.
fn element_text(element: ElementRef, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    let found = element.select(&selector).next()?;
    let text: String = found.text().collect::<Vec<_>>().join("").trim().to_string();
    Some(text)
}
