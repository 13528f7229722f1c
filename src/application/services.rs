//! Collaborator interfaces the rendering pipeline reads live data through.
//!
//! Every handle is optional: a provider that returns `None` simply lacks the
//! integration, which the pipeline renders as an "unavailable" notice rather
//! than an error.

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::domain::{
    definitions::TypeDefinitions,
    listings::{CategorySummary, CoursePackage, PostSummary},
};

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("service `{service}` is unavailable")]
    Unavailable { service: &'static str },
    #[error("query against `{service}` failed: {message}")]
    Query {
        service: &'static str,
        message: String,
    },
}

impl ServiceError {
    pub fn query(service: &'static str, err: impl fmt::Display) -> Self {
        Self::Query {
            service,
            message: err.to_string(),
        }
    }
}

pub trait PostListing: Send + Sync {
    /// Most recent published posts, newest first.
    fn recent_posts(&self, limit: usize) -> Result<Vec<PostSummary>, ServiceError>;

    fn post_url(&self, post: &PostSummary) -> String {
        format!("/posts/{}", post.slug)
    }

    /// Client scripts needed by post cards.
    fn scripts(&self) -> Vec<String> {
        Vec::new()
    }
}

pub trait CategoryListing: Send + Sync {
    fn categories(&self, limit: usize) -> Result<Vec<CategorySummary>, ServiceError>;

    fn category_url(&self, category: &CategorySummary) -> String {
        format!("/categories/{}", category.slug)
    }

    fn scripts(&self) -> Vec<String> {
        Vec::new()
    }
}

pub trait CoursePackages: Send + Sync {
    fn catalog(&self, limit: usize) -> Result<Vec<CoursePackage>, ServiceError>;

    fn package_url(&self, package: &CoursePackage) -> String {
        format!("/courses/{}", package.slug)
    }

    fn scripts(&self) -> Vec<String> {
        Vec::new()
    }
}

pub trait CourseCheckout: Send + Sync {
    /// Packages the current visitor already owns.
    fn owned_packages(&self, limit: usize) -> Result<Vec<CoursePackage>, ServiceError>;

    fn checkout_url(&self, _package: &CoursePackage) -> Option<String> {
        None
    }
}

pub trait SearchService: Send + Sync {
    fn action_url(&self) -> String;

    fn placeholder(&self) -> Option<String> {
        None
    }

    fn scripts(&self) -> Vec<String> {
        Vec::new()
    }
}

pub trait ThemeManager: Send + Sync {
    fn active_theme(&self) -> String;

    /// Extra wrapper classes the active theme declares for a section type.
    fn section_classes(&self, section_type: &str) -> Vec<String>;

    fn definitions(&self) -> Arc<TypeDefinitions>;
}

/// Optional product areas that gate live-data sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Blog,
    Courses,
}

impl Feature {
    pub fn as_str(self) -> &'static str {
        match self {
            Feature::Blog => "blog",
            Feature::Courses => "courses",
        }
    }
}

pub trait ServiceProvider: Send + Sync {
    fn posts(&self) -> Option<Arc<dyn PostListing>>;
    fn categories(&self) -> Option<Arc<dyn CategoryListing>>;
    fn course_packages(&self) -> Option<Arc<dyn CoursePackages>>;
    fn course_checkout(&self) -> Option<Arc<dyn CourseCheckout>>;
    fn search(&self) -> Option<Arc<dyn SearchService>>;
    fn themes(&self) -> Option<Arc<dyn ThemeManager>>;
    fn is_enabled(&self, feature: Feature) -> bool;
}

/// Concrete provider assembled by the host at startup.
#[derive(Clone)]
pub struct Services {
    posts: Option<Arc<dyn PostListing>>,
    categories: Option<Arc<dyn CategoryListing>>,
    course_packages: Option<Arc<dyn CoursePackages>>,
    course_checkout: Option<Arc<dyn CourseCheckout>>,
    search: Option<Arc<dyn SearchService>>,
    themes: Option<Arc<dyn ThemeManager>>,
    blog_enabled: bool,
    courses_enabled: bool,
}

impl Services {
    /// A provider with both features enabled and no collaborators attached.
    pub fn new() -> Self {
        Self {
            posts: None,
            categories: None,
            course_packages: None,
            course_checkout: None,
            search: None,
            themes: None,
            blog_enabled: true,
            courses_enabled: true,
        }
    }

    pub fn with_posts(mut self, posts: Arc<dyn PostListing>) -> Self {
        self.posts = Some(posts);
        self
    }

    pub fn with_categories(mut self, categories: Arc<dyn CategoryListing>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn with_course_packages(mut self, packages: Arc<dyn CoursePackages>) -> Self {
        self.course_packages = Some(packages);
        self
    }

    pub fn with_course_checkout(mut self, checkout: Arc<dyn CourseCheckout>) -> Self {
        self.course_checkout = Some(checkout);
        self
    }

    pub fn with_search(mut self, search: Arc<dyn SearchService>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_themes(mut self, themes: Arc<dyn ThemeManager>) -> Self {
        self.themes = Some(themes);
        self
    }

    pub fn with_feature(mut self, feature: Feature, enabled: bool) -> Self {
        match feature {
            Feature::Blog => self.blog_enabled = enabled,
            Feature::Courses => self.courses_enabled = enabled,
        }
        self
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceProvider for Services {
    fn posts(&self) -> Option<Arc<dyn PostListing>> {
        self.posts.clone()
    }

    fn categories(&self) -> Option<Arc<dyn CategoryListing>> {
        self.categories.clone()
    }

    fn course_packages(&self) -> Option<Arc<dyn CoursePackages>> {
        self.course_packages.clone()
    }

    fn course_checkout(&self) -> Option<Arc<dyn CourseCheckout>> {
        self.course_checkout.clone()
    }

    fn search(&self) -> Option<Arc<dyn SearchService>> {
        self.search.clone()
    }

    fn themes(&self) -> Option<Arc<dyn ThemeManager>> {
        self.themes.clone()
    }

    fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Blog => self.blog_enabled,
            Feature::Courses => self.courses_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticPosts;

    impl PostListing for StaticPosts {
        fn recent_posts(&self, limit: usize) -> Result<Vec<PostSummary>, ServiceError> {
            Ok((0..limit)
                .map(|index| PostSummary {
                    id: index.to_string(),
                    title: format!("Post {index}"),
                    slug: format!("post-{index}"),
                    excerpt: None,
                    cover_image: None,
                    published_at: None,
                })
                .collect())
        }
    }

    #[test]
    fn features_default_to_enabled() {
        let services = Services::new();
        assert!(services.is_enabled(Feature::Blog));
        assert!(services.is_enabled(Feature::Courses));
        assert!(services.posts().is_none());
    }

    #[test]
    fn builder_attaches_handles_and_toggles_features() {
        let services = Services::new()
            .with_posts(Arc::new(StaticPosts))
            .with_feature(Feature::Courses, false);

        let posts = services.posts().expect("posts handle");
        let listed = posts.recent_posts(2).expect("posts");
        assert_eq!(posts.post_url(&listed[1]), "/posts/post-1");
        assert!(!services.is_enabled(Feature::Courses));
        assert!(services.is_enabled(Feature::Blog));
    }
}
