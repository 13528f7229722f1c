//! Records returned by the listing collaborators (posts, categories, courses).

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

const DISPLAY_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day padding:none], [year]");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}

impl PostSummary {
    pub fn published_display(&self) -> Option<String> {
        self.published_at
            .and_then(|published| published.format(DISPLAY_DATE).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub post_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoursePackage {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    /// Smallest currency unit; `None` for free packages.
    #[serde(default)]
    pub price_cents: Option<u64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CoursePackage {
    pub fn price_display(&self) -> Option<String> {
        let cents = self.price_cents?;
        let currency = self.currency.as_deref().unwrap_or("USD");
        Some(format!("{currency} {}.{:02}", cents / 100, cents % 100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn published_display_formats_dates() {
        let post = PostSummary {
            id: "1".to_string(),
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            excerpt: None,
            cover_image: None,
            published_at: Some(datetime!(2024-03-05 10:00 UTC)),
        };
        assert_eq!(post.published_display().as_deref(), Some("Mar 5, 2024"));
    }

    #[test]
    fn price_display_uses_currency_and_cents() {
        let package = CoursePackage {
            id: "c1".to_string(),
            title: "Rust".to_string(),
            slug: "rust".to_string(),
            summary: None,
            cover_image: None,
            price_cents: Some(4_905),
            currency: Some("EUR".to_string()),
        };
        assert_eq!(package.price_display().as_deref(), Some("EUR 49.05"));
    }
}
