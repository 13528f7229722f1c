//! Parsed template sets and the shared store that hands out isolated clones.
//!
//! The store holds exactly one active set. Renders never execute the shared
//! instance: they take a [`TemplateSet`] clone, which keeps working against
//! the snapshot it captured even if a theme reload swaps the store meanwhile.

use std::{
    collections::BTreeSet,
    sync::{Arc, RwLock},
};

use minijinja::{AutoEscape, Environment, ErrorKind};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::util::lock::{rw_read, rw_write};

const TARGET: &str = "presentation::templates";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("no template set has been loaded")]
    NotLoaded,
    #[error("template `{name}` is not defined by theme `{theme}`")]
    Missing { theme: String, name: String },
    #[error("template `{name}` failed to parse: {source}")]
    Parse {
        name: String,
        #[source]
        source: minijinja::Error,
    },
    #[error("template `{name}` failed to render: {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// An executable, independently mutable template set.
///
/// Cloning shares the parsed environment; the first mutation on a clone
/// copies it, so a clone never leaks changes back into the store.
#[derive(Clone)]
pub struct TemplateSet {
    theme: Arc<str>,
    env: Arc<Environment<'static>>,
    names: Arc<BTreeSet<String>>,
}

impl std::fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateSet")
            .field("theme", &self.theme)
            .field("names", &self.names)
            .finish()
    }
}

impl TemplateSet {
    pub fn empty(theme: &str) -> Self {
        Self {
            theme: Arc::from(theme),
            env: Arc::new(new_environment()),
            names: Arc::new(BTreeSet::new()),
        }
    }

    /// Parse every `(name, source)` pair; the first parse failure aborts.
    pub fn from_sources<I>(theme: &str, sources: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut set = Self::empty(theme);
        for (name, source) in sources {
            set.add_template(name, source)?;
        }
        Ok(set)
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn add_template(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), TemplateError> {
        let name = name.into();
        Arc::make_mut(&mut self.env)
            .add_template_owned(name.clone(), source.into())
            .map_err(|source| TemplateError::Parse {
                name: name.clone(),
                source,
            })?;
        Arc::make_mut(&mut self.names).insert(name);
        Ok(())
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, TemplateError> {
        let template = self.env.get_template(name).map_err(|err| {
            if err.kind() == ErrorKind::TemplateNotFound {
                TemplateError::Missing {
                    theme: self.theme.to_string(),
                    name: name.to_string(),
                }
            } else {
                TemplateError::Render {
                    name: name.to_string(),
                    source: err,
                }
            }
        })?;

        template.render(ctx).map_err(|source| TemplateError::Render {
            name: name.to_string(),
            source,
        })
    }
}

fn new_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env
}

/// The shared, reloadable home of the active [`TemplateSet`].
#[derive(Default)]
pub struct TemplateStore {
    active: RwLock<Option<TemplateSet>>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_set(set: TemplateSet) -> Self {
        Self {
            active: RwLock::new(Some(set)),
        }
    }

    /// Snapshot of the active set for one render.
    pub fn clone_set(&self) -> Result<TemplateSet, TemplateError> {
        rw_read(&self.active, TARGET, "clone_set")
            .as_ref()
            .cloned()
            .ok_or(TemplateError::NotLoaded)
    }

    /// Swap in a new set, returning the previous one.
    pub fn replace(&self, set: TemplateSet) -> Option<TemplateSet> {
        let theme = set.theme().to_string();
        let templates = set.names.len();
        let previous = rw_write(&self.active, TARGET, "replace").replace(set);
        info!(
            target = TARGET,
            theme = %theme,
            templates,
            "Template set replaced"
        );
        previous
    }

    /// Parse `sources` and swap them in. On a parse error the active set is kept.
    pub fn reload<I>(&self, theme: &str, sources: I) -> Result<(), TemplateError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let set = TemplateSet::from_sources(theme, sources)?;
        self.replace(set);
        Ok(())
    }

    pub fn active_theme(&self) -> Option<String> {
        rw_read(&self.active, TARGET, "active_theme")
            .as_ref()
            .map(|set| set.theme().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    fn sources(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(name, source)| (name.to_string(), source.to_string()))
            .collect()
    }

    #[test]
    fn empty_store_reports_not_loaded() {
        let store = TemplateStore::new();
        assert!(matches!(store.clone_set(), Err(TemplateError::NotLoaded)));
        assert!(store.active_theme().is_none());
    }

    #[test]
    fn render_escapes_values_by_default() {
        let set = TemplateSet::from_sources("t", sources(&[("card.html", "<p>{{ title }}</p>")]))
            .expect("parse");
        let html = set
            .render("card.html", context! { title => "<b>x</b>" })
            .expect("render");
        assert!(html.starts_with("<p>&lt;b&gt;x"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn missing_template_is_reported_by_name() {
        let set = TemplateSet::empty("t");
        let err = set.render("nope.html", context! {}).expect_err("missing");
        assert!(matches!(err, TemplateError::Missing { ref name, .. } if name == "nope.html"));
    }

    #[test]
    fn parse_failure_keeps_previous_set() {
        let store = TemplateStore::new();
        store
            .reload("first", sources(&[("a.html", "A")]))
            .expect("first load");

        let err = store
            .reload("second", sources(&[("b.html", "{% if %}")]))
            .expect_err("broken template");
        assert!(matches!(err, TemplateError::Parse { .. }));
        assert_eq!(store.active_theme().as_deref(), Some("first"));
    }

    #[test]
    fn clones_are_isolated_from_store_and_reloads() {
        let store = TemplateStore::new();
        store
            .reload("first", sources(&[("a.html", "first")]))
            .expect("load");

        let mut snapshot = store.clone_set().expect("clone");
        snapshot.add_template("extra.html", "extra").expect("add");
        assert!(!store.clone_set().expect("clone").has_template("extra.html"));

        store
            .reload("second", sources(&[("a.html", "second")]))
            .expect("reload");
        assert_eq!(snapshot.render("a.html", context! {}).expect("render"), "first");
        assert_eq!(
            store
                .clone_set()
                .expect("clone")
                .render("a.html", context! {})
                .expect("render"),
            "second"
        );
    }
}
