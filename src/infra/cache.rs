//! Read-through caches for live listing collaborators.
//!
//! Listing sections hit the same queries on every render; these decorators
//! keep recent results per `limit` for a short TTL. Failed queries are never
//! stored, so a transient outage does not outlive the request that saw it.

use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use lru::LruCache;
use metrics::counter;
use tracing::debug;

use crate::{
    application::services::{
        CategoryListing, CoursePackages, PostListing, ServiceError, ServiceProvider, Services,
    },
    domain::listings::{CategorySummary, CoursePackage, PostSummary},
    util::lock::mutex_lock,
};

const TARGET: &str = "infra::cache";

struct Entry<V> {
    stored_at: Instant,
    items: Vec<V>,
}

/// LRU of listing results keyed by the requested limit.
pub struct ListingCache<V> {
    listing: &'static str,
    ttl: Duration,
    entries: Mutex<LruCache<usize, Entry<V>>>,
}

impl<V: Clone> ListingCache<V> {
    pub fn new(listing: &'static str, capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            listing,
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the cached result for `limit`, or run `load` and remember its
    /// success.
    pub fn get_or_load<F>(&self, limit: usize, load: F) -> Result<Vec<V>, ServiceError>
    where
        F: FnOnce() -> Result<Vec<V>, ServiceError>,
    {
        {
            let mut entries = mutex_lock(&self.entries, TARGET, "get_or_load.lookup");
            if let Some(entry) = entries.get(&limit)
                && entry.stored_at.elapsed() < self.ttl
            {
                counter!("tessera_listing_cache_hit_total", "listing" => self.listing)
                    .increment(1);
                debug!(target = TARGET, listing = self.listing, limit, "Listing cache hit");
                return Ok(entry.items.clone());
            }
            entries.pop(&limit);
        }

        counter!("tessera_listing_cache_miss_total", "listing" => self.listing).increment(1);
        debug!(target = TARGET, listing = self.listing, limit, "Listing cache miss");

        let items = load()?;
        mutex_lock(&self.entries, TARGET, "get_or_load.store").put(
            limit,
            Entry {
                stored_at: Instant::now(),
                items: items.clone(),
            },
        );
        Ok(items)
    }

    pub fn invalidate(&self) {
        mutex_lock(&self.entries, TARGET, "invalidate").clear();
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, TARGET, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct CachedPostListing {
    inner: Arc<dyn PostListing>,
    cache: ListingCache<PostSummary>,
}

impl CachedPostListing {
    pub fn new(inner: Arc<dyn PostListing>, capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            inner,
            cache: ListingCache::new("posts", capacity, ttl),
        }
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}

impl PostListing for CachedPostListing {
    fn recent_posts(&self, limit: usize) -> Result<Vec<PostSummary>, ServiceError> {
        self.cache.get_or_load(limit, || self.inner.recent_posts(limit))
    }

    fn post_url(&self, post: &PostSummary) -> String {
        self.inner.post_url(post)
    }

    fn scripts(&self) -> Vec<String> {
        self.inner.scripts()
    }
}

pub struct CachedCategoryListing {
    inner: Arc<dyn CategoryListing>,
    cache: ListingCache<CategorySummary>,
}

impl CachedCategoryListing {
    pub fn new(inner: Arc<dyn CategoryListing>, capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            inner,
            cache: ListingCache::new("categories", capacity, ttl),
        }
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}

impl CategoryListing for CachedCategoryListing {
    fn categories(&self, limit: usize) -> Result<Vec<CategorySummary>, ServiceError> {
        self.cache.get_or_load(limit, || self.inner.categories(limit))
    }

    fn category_url(&self, category: &CategorySummary) -> String {
        self.inner.category_url(category)
    }

    fn scripts(&self) -> Vec<String> {
        self.inner.scripts()
    }
}

pub struct CachedCoursePackages {
    inner: Arc<dyn CoursePackages>,
    cache: ListingCache<CoursePackage>,
}

impl CachedCoursePackages {
    pub fn new(inner: Arc<dyn CoursePackages>, capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            inner,
            cache: ListingCache::new("courses", capacity, ttl),
        }
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}

impl CoursePackages for CachedCoursePackages {
    fn catalog(&self, limit: usize) -> Result<Vec<CoursePackage>, ServiceError> {
        self.cache.get_or_load(limit, || self.inner.catalog(limit))
    }

    fn package_url(&self, package: &CoursePackage) -> String {
        self.inner.package_url(package)
    }

    fn scripts(&self) -> Vec<String> {
        self.inner.scripts()
    }
}

/// Wrap every listing handle `services` carries in a read-through cache.
pub fn with_listing_cache(services: Services, capacity: NonZeroUsize, ttl: Duration) -> Services {
    let mut cached = services.clone();
    if let Some(posts) = services.posts() {
        cached = cached.with_posts(Arc::new(CachedPostListing::new(posts, capacity, ttl)));
    }
    if let Some(categories) = services.categories() {
        cached = cached.with_categories(Arc::new(CachedCategoryListing::new(
            categories, capacity, ttl,
        )));
    }
    if let Some(packages) = services.course_packages() {
        cached = cached.with_course_packages(Arc::new(CachedCoursePackages::new(
            packages, capacity, ttl,
        )));
    }
    cached
}
