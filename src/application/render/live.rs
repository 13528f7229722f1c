//! Live-data sections: recent posts, categories and course packages.
//!
//! Each listing asks its collaborator for at most `limit` records and renders
//! one card template per record. Absent collaborators, query errors and card
//! failures degrade to notices or skipped cards.

use metrics::counter;
use serde_json::{Value, json};
use tracing::{error, warn};

use super::{
    RenderContext, RenderedFragment,
    escape::{escape_html, safe_url},
};
use crate::{
    application::services::ServiceError,
    domain::{
        definitions::{COURSES_MODE_OWNED, LimitSetting},
        listings::{CategorySummary, CoursePackage, PostSummary},
        sections::Section,
    },
};

const TARGET: &str = "application::render::live";

pub const POST_CARD_TEMPLATE: &str = "cards/post.html";
pub const CATEGORY_CARD_TEMPLATE: &str = "cards/category.html";
pub const COURSE_CARD_TEMPLATE: &str = "cards/course.html";

const FALLBACK_LIMIT: LimitSetting = LimitSetting {
    default: 6,
    min: 1,
    max: 24,
};

/// Fixed wording and template for one listing kind.
struct Listing {
    kind: &'static str,
    template: &'static str,
    empty: &'static str,
    unavailable: &'static str,
}

const POSTS: Listing = Listing {
    kind: "posts",
    template: POST_CARD_TEMPLATE,
    empty: "No posts yet.",
    unavailable: "Posts are unavailable right now.",
};

const CATEGORIES: Listing = Listing {
    kind: "categories",
    template: CATEGORY_CARD_TEMPLATE,
    empty: "No categories yet.",
    unavailable: "Categories are unavailable right now.",
};

const COURSES: Listing = Listing {
    kind: "courses",
    template: COURSE_CARD_TEMPLATE,
    empty: "No courses yet.",
    unavailable: "Courses are unavailable right now.",
};

const OWNED_COURSES: Listing = Listing {
    kind: "courses",
    template: COURSE_CARD_TEMPLATE,
    empty: "You have not enrolled in any courses yet.",
    unavailable: "Courses are unavailable right now.",
};

fn section_limit(section: &Section) -> usize {
    let limit = match section.limit {
        Some(limit) if limit > 0 => limit,
        _ => LimitSetting::legacy_for(&section.section_type)
            .unwrap_or(FALLBACK_LIMIT)
            .default,
    };
    usize::try_from(limit).unwrap_or(1).max(1)
}

pub(super) fn render_posts(
    section: &Section,
    prefix: &str,
    ctx: &dyn RenderContext,
) -> RenderedFragment {
    let limit = section_limit(section);
    let Some(posts) = ctx.services().posts() else {
        return unavailable(section, prefix, &POSTS, None);
    };

    let items = posts.recent_posts(limit);
    render_cards(section, prefix, ctx, &POSTS, items, limit, posts.scripts(), |post| {
        post_card(post, &posts.post_url(post), prefix)
    })
}

pub(super) fn render_categories(
    section: &Section,
    prefix: &str,
    ctx: &dyn RenderContext,
) -> RenderedFragment {
    let limit = section_limit(section);
    let Some(categories) = ctx.services().categories() else {
        return unavailable(section, prefix, &CATEGORIES, None);
    };

    let items = categories.categories(limit);
    render_cards(
        section,
        prefix,
        ctx,
        &CATEGORIES,
        items,
        limit,
        categories.scripts(),
        |category| category_card(category, &categories.category_url(category), prefix),
    )
}

pub(super) fn render_courses(
    section: &Section,
    prefix: &str,
    ctx: &dyn RenderContext,
) -> RenderedFragment {
    let limit = section_limit(section);
    let services = ctx.services();
    let packages = services.course_packages();
    let checkout = services.course_checkout();
    let owned = section
        .mode
        .as_deref()
        .is_some_and(|mode| mode.eq_ignore_ascii_case(COURSES_MODE_OWNED));

    let scripts = packages
        .as_ref()
        .map(|packages| packages.scripts())
        .unwrap_or_default();
    let package_url = |package: &CoursePackage| match &packages {
        Some(packages) => packages.package_url(package),
        None => format!("/courses/{}", package.slug),
    };

    if owned {
        let Some(checkout) = checkout else {
            return unavailable(section, prefix, &OWNED_COURSES, None);
        };
        let items = checkout.owned_packages(limit);
        return render_cards(
            section,
            prefix,
            ctx,
            &OWNED_COURSES,
            items,
            limit,
            scripts,
            |package| course_card(package, &package_url(package), None, true, prefix),
        );
    }

    let Some(catalog) = packages.as_ref() else {
        return unavailable(section, prefix, &COURSES, None);
    };
    let items = catalog.catalog(limit);
    render_cards(
        section,
        prefix,
        ctx,
        &COURSES,
        items,
        limit,
        scripts,
        |package| {
            let checkout_url = checkout
                .as_ref()
                .and_then(|checkout| checkout.checkout_url(package));
            course_card(package, &package_url(package), checkout_url, false, prefix)
        },
    )
}

#[allow(clippy::too_many_arguments)]
fn render_cards<T, F>(
    section: &Section,
    prefix: &str,
    ctx: &dyn RenderContext,
    listing: &Listing,
    items: Result<Vec<T>, ServiceError>,
    limit: usize,
    scripts: Vec<String>,
    card_context: F,
) -> RenderedFragment
where
    F: Fn(&T) -> Value,
{
    let items = match items {
        Ok(items) => items,
        Err(err) => return unavailable(section, prefix, listing, Some(&err)),
    };
    if items.is_empty() {
        return notice(prefix, "empty", listing.empty);
    }

    let templates = match ctx.clone_templates() {
        Ok(templates) => templates,
        Err(err) => {
            error!(
                target = TARGET,
                section_id = %section.id,
                listing = listing.kind,
                error = %err,
                "No template set available for listing cards"
            );
            counter!("tessera_render_degraded_total", "reason" => "no_templates")
                .increment(1);
            return notice(prefix, "unavailable", listing.unavailable);
        }
    };

    let mut cards = String::new();
    for item in items.iter().take(limit) {
        match templates.render(listing.template, card_context(item)) {
            Ok(card) => cards.push_str(&card),
            Err(err) => {
                warn!(
                    target = TARGET,
                    section_id = %section.id,
                    listing = listing.kind,
                    template = listing.template,
                    error = %err,
                    "Card failed to render; skipping"
                );
                counter!("tessera_render_degraded_total", "reason" => "card_failed")
                    .increment(1);
            }
        }
    }
    if cards.is_empty() {
        return notice(prefix, "unavailable", listing.unavailable);
    }

    RenderedFragment::html(format!(
        r#"<div class="{prefix}-cards {prefix}-cards--{kind}">{cards}</div>"#,
        kind = listing.kind
    ))
    .with_scripts(scripts)
}

fn unavailable(
    section: &Section,
    prefix: &str,
    listing: &Listing,
    err: Option<&ServiceError>,
) -> RenderedFragment {
    match err {
        Some(err) => {
            warn!(
                target = TARGET,
                section_id = %section.id,
                section_type = %section.section_type,
                listing = listing.kind,
                error = %err,
                "Listing query failed"
            );
            counter!("tessera_render_degraded_total", "reason" => "query_failed")
                .increment(1);
        }
        None => {
            warn!(
                target = TARGET,
                section_id = %section.id,
                section_type = %section.section_type,
                listing = listing.kind,
                "Listing collaborator is not configured"
            );
            counter!("tessera_render_degraded_total", "reason" => "service_unavailable")
                .increment(1);
        }
    }
    notice(prefix, "unavailable", listing.unavailable)
}

fn notice(prefix: &str, modifier: &str, message: &str) -> RenderedFragment {
    RenderedFragment::html(format!(
        r#"<p class="{prefix}-notice {prefix}-notice--{modifier}">{}</p>"#,
        escape_html(message)
    ))
}

fn post_card(post: &PostSummary, url: &str, prefix: &str) -> Value {
    json!({
        "class_prefix": prefix,
        "title": post.title,
        "url": safe_url(url),
        "excerpt": post.excerpt,
        "cover_image": post.cover_image.as_deref().and_then(safe_url),
        "published": post.published_display(),
    })
}

fn category_card(category: &CategorySummary, url: &str, prefix: &str) -> Value {
    json!({
        "class_prefix": prefix,
        "name": category.name,
        "url": safe_url(url),
        "description": category.description,
        "post_count": category.post_count,
    })
}

fn course_card(
    package: &CoursePackage,
    url: &str,
    checkout_url: Option<String>,
    owned: bool,
    prefix: &str,
) -> Value {
    json!({
        "class_prefix": prefix,
        "title": package.title,
        "url": safe_url(url),
        "summary": package.summary,
        "cover_image": package.cover_image.as_deref().and_then(safe_url),
        "price": package.price_display(),
        "checkout_url": checkout_url.as_deref().and_then(safe_url),
        "owned": owned,
    })
}
