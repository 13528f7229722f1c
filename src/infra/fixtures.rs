//! JSON-backed listing collaborators for offline rendering.

use std::{fs, path::Path, sync::Arc};

use serde::Deserialize;
use tracing::info;

use super::error::InfraError;
use crate::{
    application::services::{
        CategoryListing, CourseCheckout, CoursePackages, PostListing, SearchService, ServiceError,
        Services,
    },
    domain::listings::{CategorySummary, CoursePackage, PostSummary},
};

const TARGET: &str = "infra::fixtures";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchFixture {
    pub action_url: String,
    pub placeholder: Option<String>,
    pub scripts: Vec<String>,
}

/// Listing data as it appears in a fixture file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FixtureData {
    pub posts: Option<Vec<PostSummary>>,
    pub categories: Option<Vec<CategorySummary>>,
    pub courses: Option<Vec<CoursePackage>>,
    pub owned_courses: Option<Vec<CoursePackage>>,
    pub checkout_base_url: Option<String>,
    pub search: Option<SearchFixture>,
}

/// Serves listings from in-memory [`FixtureData`]. A list missing from the
/// fixture leaves the matching handle unset.
#[derive(Debug, Clone, Default)]
pub struct FixtureServices {
    data: FixtureData,
}

impl FixtureServices {
    pub fn new(data: FixtureData) -> Self {
        Self { data }
    }

    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source).map(Self::new)
    }

    pub fn from_path(path: &Path) -> Result<Self, InfraError> {
        let source_path = path.display().to_string();
        let source = fs::read_to_string(path)
            .map_err(|err| InfraError::fixture(source_path.clone(), err.to_string()))?;
        let services = Self::from_json(&source)
            .map_err(|err| InfraError::fixture(source_path.clone(), err.to_string()))?;
        info!(
            target = TARGET,
            path = %source_path,
            posts = services.data.posts.as_ref().map_or(0, Vec::len),
            categories = services.data.categories.as_ref().map_or(0, Vec::len),
            courses = services.data.courses.as_ref().map_or(0, Vec::len),
            "Fixture data loaded"
        );
        Ok(services)
    }

    /// Attach every handle the fixture has data for.
    pub fn attach(self: Arc<Self>, mut services: Services) -> Services {
        if self.data.posts.is_some() {
            services = services.with_posts(self.clone());
        }
        if self.data.categories.is_some() {
            services = services.with_categories(self.clone());
        }
        if self.data.courses.is_some() {
            services = services.with_course_packages(self.clone());
        }
        if self.data.owned_courses.is_some() {
            services = services.with_course_checkout(self.clone());
        }
        if self.data.search.is_some() {
            services = services.with_search(self);
        }
        services
    }
}

fn take<T: Clone>(
    items: &Option<Vec<T>>,
    service: &'static str,
    limit: usize,
) -> Result<Vec<T>, ServiceError> {
    items
        .as_ref()
        .map(|items| items.iter().take(limit).cloned().collect())
        .ok_or(ServiceError::Unavailable { service })
}

impl PostListing for FixtureServices {
    fn recent_posts(&self, limit: usize) -> Result<Vec<PostSummary>, ServiceError> {
        let mut posts = take(&self.data.posts, "posts", usize::MAX)?;
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        posts.truncate(limit);
        Ok(posts)
    }
}

impl CategoryListing for FixtureServices {
    fn categories(&self, limit: usize) -> Result<Vec<CategorySummary>, ServiceError> {
        take(&self.data.categories, "categories", limit)
    }
}

impl CoursePackages for FixtureServices {
    fn catalog(&self, limit: usize) -> Result<Vec<CoursePackage>, ServiceError> {
        take(&self.data.courses, "courses", limit)
    }
}

impl CourseCheckout for FixtureServices {
    fn owned_packages(&self, limit: usize) -> Result<Vec<CoursePackage>, ServiceError> {
        take(&self.data.owned_courses, "course_checkout", limit)
    }

    fn checkout_url(&self, package: &CoursePackage) -> Option<String> {
        let base = self.data.checkout_base_url.as_deref()?;
        Some(format!("{}/{}", base.trim_end_matches('/'), package.slug))
    }
}

impl SearchService for FixtureServices {
    fn action_url(&self) -> String {
        self.data
            .search
            .as_ref()
            .map(|search| search.action_url.clone())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| "/search".to_string())
    }

    fn placeholder(&self) -> Option<String> {
        self.data.search.as_ref()?.placeholder.clone()
    }

    fn scripts(&self) -> Vec<String> {
        self.data
            .search
            .as_ref()
            .map(|search| search.scripts.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::application::services::ServiceProvider;

    const FIXTURE: &str = r#"{
        "posts": [
            {"id": "1", "title": "Old", "slug": "old", "published_at": "2023-01-01T00:00:00Z"},
            {"id": "2", "title": "New", "slug": "new", "published_at": "2024-06-01T00:00:00Z"},
            {"id": "3", "title": "Mid", "slug": "mid", "published_at": "2023-09-01T00:00:00Z"}
        ],
        "courses": [
            {"id": "c1", "title": "Rust", "slug": "rust", "price_cents": 1000}
        ],
        "checkout_base_url": "https://shop.example/buy/"
    }"#;

    #[test]
    fn posts_are_newest_first_and_limited() {
        let fixtures = FixtureServices::from_json(FIXTURE).expect("fixture");
        let posts = fixtures.recent_posts(2).expect("posts");
        let titles: Vec<&str> = posts.iter().map(|post| post.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Mid"]);
    }

    #[test]
    fn only_present_lists_are_attached() {
        let fixtures = Arc::new(FixtureServices::from_json(FIXTURE).expect("fixture"));
        let services = fixtures.clone().attach(Services::new());

        assert!(services.posts().is_some());
        assert!(services.course_packages().is_some());
        assert!(services.categories().is_none());
        assert!(services.course_checkout().is_none());
        assert!(services.search().is_none());

        let package = &fixtures.catalog(5).expect("catalog")[0];
        assert_eq!(
            fixtures.checkout_url(package).as_deref(),
            Some("https://shop.example/buy/rust")
        );
    }

    #[test]
    fn from_path_reports_the_file_on_bad_json() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "{{not json").expect("write");
        let err = FixtureServices::from_path(file.path()).expect_err("bad json");
        assert!(matches!(err, InfraError::Fixture { .. }));
    }

    #[test]
    fn from_path_loads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "{FIXTURE}").expect("write");
        let fixtures = FixtureServices::from_path(file.path()).expect("fixture file");
        assert_eq!(fixtures.recent_posts(1).expect("posts").len(), 1);
    }
}
