//! HTML extraction for listing and detail pages
//!
//! Both functions are pure: they take page markup and return values, never
//! touching the network. A listing page yields one optional identifier per
//! `<li>` entry; a detail page yields a posting or nothing.

use crate::crawler::types::{CandidateId, Posting};
use scraper::{ElementRef, Html, Selector};

const LISTING_ENTRY: &str = "li";
const LISTING_CARD: &str = "div.base-card";
const LISTING_URN_ATTR: &str = "data-entity-urn";

const DETAIL_TITLE: &str = "h2.top-card-layout__title";
const DETAIL_LOCATION: &str = "span.topcard__flavor--bullet";
const DETAIL_ORG: &str = "a.topcard__org-name-link";
const DETAIL_DESCRIPTION: &str = "div.description__text";

/// Extracts one optional identifier per listing entry
///
/// Entries without a card or without a URN attribute yield `None`, so the
/// returned length equals the number of entries on the page.
///
/// # Example
///
/// ```
/// use posting_harvester::crawler::extract_candidate_ids;
///
/// let html = r#"<ul>
///     <li><div class="base-card" data-entity-urn="urn:li:jobPosting:101"></div></li>
///     <li><div class="other"></div></li>
/// </ul>"#;
/// let ids = extract_candidate_ids(html);
/// assert_eq!(ids.len(), 2);
/// assert_eq!(ids[0].as_ref().map(|id| id.as_str()), Some("101"));
/// assert!(ids[1].is_none());
/// ```
pub fn extract_candidate_ids(html: &str) -> Vec<Option<CandidateId>> {
    let document = Html::parse_document(html);
    let (Some(entry_selector), Some(card_selector)) =
        (selector(LISTING_ENTRY), selector(LISTING_CARD))
    else {
        return Vec::new();
    };

    document
        .select(&entry_selector)
        .map(|entry| {
            entry
                .select(&card_selector)
                .next()
                .and_then(|card| card.value().attr(LISTING_URN_ATTR))
                .and_then(id_from_urn)
        })
        .collect()
}

/// Takes the last `:`-separated segment of a URN such as `urn:li:jobPosting:123`
fn id_from_urn(urn: &str) -> Option<CandidateId> {
    urn.rsplit(':').next().and_then(CandidateId::new)
}

/// Extracts a posting from a detail page
///
/// Returns `None` when the title is missing or blank; every other field
/// falls back to an empty string. The detail link is left empty for the
/// caller to fill in.
pub fn extract_posting(html: &str) -> Option<Posting> {
    let document = Html::parse_document(html);

    let title = first_text(&document, DETAIL_TITLE)?;
    if title.is_empty() {
        return None;
    }

    let org = first_match(&document, DETAIL_ORG);

    Some(Posting {
        title,
        location: first_text(&document, DETAIL_LOCATION).unwrap_or_default(),
        org_name: org.map(|el| clean_text(&el)).unwrap_or_default(),
        org_link: org
            .and_then(|el| el.value().attr("href"))
            .map(|href| href.trim().to_string())
            .unwrap_or_default(),
        description: first_text(&document, DETAIL_DESCRIPTION).unwrap_or_default(),
        job_posting_link: String::new(),
    })
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn first_match<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let parsed = selector(css)?;
    document.select(&parsed).next()
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    first_match(document, css).map(|el| clean_text(&el))
}

/// Concatenates element text with newlines removed and the ends trimmed
fn clean_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .replace('\n', "")
        .trim()
        .to_string()
}
