//! Relevance scoring: text similarity, engagement and recency blended into
//! one score per item.
//!
//! The weights depend on which engagement signal an item carries:
//!
//! | Signal  | Text | Engagement | Recency |
//! |---------|------|------------|---------|
//! | views   | 0.45 | 0.40       | 0.15    |
//! | upvotes | 0.50 | 0.30       | 0.20    |
//! | none    | 0.70 | n/a        | 0.30    |
//!
//! Scoring never filters: every input item comes back, with `_score` set,
//! sorted by descending score. Ties keep their input order.

pub mod matcher;

use std::cmp::Ordering;

use aether_sources::{ContentItem, Engagement};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub use matcher::similarity_ratio;

/// Characters of `title + " " + description` compared against the query.
const TEXT_WINDOW: usize = 400;
/// Age in days at which recency reaches zero.
const RECENCY_HORIZON_DAYS: i64 = 90;
const VIEWS_SATURATION: f64 = 1_000_000.0;
const UPVOTES_SATURATION: f64 = 10_000.0;

/// Score `items` against `query` as of now.
pub fn score(items: Vec<ContentItem>, query: &str) -> Vec<ContentItem> {
    score_at(items, query, Utc::now())
}

/// Score `items` against `query` with recency measured from `now`.
pub fn score_at(mut items: Vec<ContentItem>, query: &str, now: DateTime<Utc>) -> Vec<ContentItem> {
    let query = query.to_lowercase();
    for item in &mut items {
        item.score = Some(blended_score(item, &query, now));
    }
    items.sort_by(|a, b| {
        b.score
            .unwrap_or(0.0)
            .partial_cmp(&a.score.unwrap_or(0.0))
            .unwrap_or(Ordering::Equal)
    });
    items
}

fn blended_score(item: &ContentItem, query: &str, now: DateTime<Utc>) -> f64 {
    let text = text_score(item, query);
    let recency = item
        .published
        .as_deref()
        .map(|p| recency_score(p, now))
        .unwrap_or(0.0);

    match item.engagement() {
        Engagement::Views(views) => {
            let engagement = views.map_or(0.0, |v| (v / VIEWS_SATURATION).min(1.0));
            0.45 * text + 0.40 * engagement + 0.15 * recency
        }
        Engagement::Upvotes(upvotes) => {
            let engagement = upvotes.map_or(0.0, |v| (v / UPVOTES_SATURATION).min(1.0));
            0.50 * text + 0.30 * engagement + 0.20 * recency
        }
        Engagement::Absent => 0.70 * text + 0.30 * recency,
    }
}

fn text_score(item: &ContentItem, query: &str) -> f64 {
    let text = format!(
        "{} {}",
        item.title,
        item.description.as_deref().unwrap_or("")
    )
    .to_lowercase();
    let window: String = text.chars().take(TEXT_WINDOW).collect();
    similarity_ratio(query, &window)
}

/// `max(0, 90 - age_days) / 90`. Future timestamps score 1.0 and
/// unparsable ones 0.0.
fn recency_score(published: &str, now: DateTime<Utc>) -> f64 {
    let Some(published) = parse_timestamp(published) else {
        return 0.0;
    };
    if published > now {
        return 1.0;
    }
    let age_days = (now - published).num_days();
    (RECENCY_HORIZON_DAYS - age_days).max(0) as f64 / RECENCY_HORIZON_DAYS as f64
}

/// Accepts RFC 3339, naive ISO-8601 date-times (taken as UTC) and bare dates.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
