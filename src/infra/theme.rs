//! Theme loading and activation.
//!
//! A theme is a directory holding an optional `theme.toml` (name plus
//! section/element definitions) and a `templates/` tree. The default theme is
//! embedded in the binary; others are read from disk with `walkdir`.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use include_dir::{Dir, DirEntry, include_dir};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::{
    application::services::ThemeManager,
    domain::definitions::{TypeDefinitions, normalize_type_key},
    presentation::templates::{TemplateError, TemplateSet, TemplateStore},
    util::lock::{rw_read, rw_write},
};

const TARGET: &str = "infra::theme";

pub const DEFAULT_THEME_NAME: &str = "default";
pub const THEME_MANIFEST: &str = "theme.toml";
const TEMPLATES_DIR: &str = "templates";

static DEFAULT_THEME: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/themes/default");

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to walk theme directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("invalid theme manifest `{path}`: {source}")]
    Manifest {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("template `{path}` is not valid UTF-8")]
    Encoding { path: String },
    #[error(transparent)]
    Templates(#[from] TemplateError),
}

#[derive(Debug, Default, Deserialize)]
struct ThemeManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(flatten)]
    definitions: TypeDefinitions,
}

/// Parsed theme contents, not yet activated.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub definitions: Arc<TypeDefinitions>,
    /// `(name, source)` pairs; names are relative to `templates/` with `/`
    /// separators.
    pub templates: Vec<(String, String)>,
}

impl Theme {
    /// The theme compiled into the binary.
    pub fn builtin() -> Result<Self, ThemeError> {
        let manifest = match DEFAULT_THEME.get_file(THEME_MANIFEST) {
            Some(file) => {
                let source = file.contents_utf8().ok_or_else(|| ThemeError::Encoding {
                    path: THEME_MANIFEST.to_string(),
                })?;
                parse_manifest(THEME_MANIFEST, source)?
            }
            None => ThemeManifest::default(),
        };

        let mut templates = Vec::new();
        if let Some(dir) = DEFAULT_THEME.get_dir(TEMPLATES_DIR) {
            collect_embedded(dir, &mut templates)?;
        }
        templates.sort();

        Ok(Self::from_parts(DEFAULT_THEME_NAME, manifest, templates))
    }

    /// Load a theme from `root`. The directory name is the fallback theme name.
    pub fn load_dir(root: &Path) -> Result<Self, ThemeError> {
        let manifest_path = root.join(THEME_MANIFEST);
        let manifest = if manifest_path.is_file() {
            let source = read_file(&manifest_path)?;
            parse_manifest(&manifest_path.display().to_string(), &source)?
        } else {
            ThemeManifest::default()
        };

        let template_root = root.join(TEMPLATES_DIR);
        let mut templates = Vec::new();
        if template_root.is_dir() {
            for entry in WalkDir::new(&template_root).sort_by_file_name() {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Some(name) = template_name(&template_root, entry.path()) else {
                    warn!(
                        target = TARGET,
                        path = %entry.path().display(),
                        "Skipping template outside the theme root"
                    );
                    continue;
                };
                templates.push((name, read_file(entry.path())?));
            }
        }

        let fallback = root
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(DEFAULT_THEME_NAME)
            .to_string();
        Ok(Self::from_parts(&fallback, manifest, templates))
    }

    fn from_parts(
        fallback: &str,
        manifest: ThemeManifest,
        templates: Vec<(String, String)>,
    ) -> Self {
        let name = manifest
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        Self {
            name,
            definitions: Arc::new(manifest.definitions.or_builtin()),
            templates,
        }
    }

    /// Parse every template into an executable set.
    pub fn template_set(&self) -> Result<TemplateSet, TemplateError> {
        TemplateSet::from_sources(&self.name, self.templates.iter().cloned())
    }
}

fn parse_manifest(path: &str, source: &str) -> Result<ThemeManifest, ThemeError> {
    toml::from_str(source).map_err(|source| ThemeError::Manifest {
        path: path.to_string(),
        source,
    })
}

fn read_file(path: &Path) -> Result<String, ThemeError> {
    fs::read_to_string(path).map_err(|source| ThemeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn template_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

fn collect_embedded(
    dir: &Dir<'static>,
    templates: &mut Vec<(String, String)>,
) -> Result<(), ThemeError> {
    for entry in dir.entries() {
        match entry {
            DirEntry::Dir(child) => collect_embedded(child, templates)?,
            DirEntry::File(file) => {
                let path = file.path();
                let Some(name) = template_name(Path::new(TEMPLATES_DIR), path) else {
                    continue;
                };
                let source = file.contents_utf8().ok_or_else(|| ThemeError::Encoding {
                    path: path.display().to_string(),
                })?;
                templates.push((name, source.to_string()));
            }
        }
    }
    Ok(())
}

/// Holds the active theme and the template store rendered against it.
pub struct ThemeRegistry {
    active: RwLock<Arc<Theme>>,
    templates: Arc<TemplateStore>,
}

impl ThemeRegistry {
    pub fn new(theme: Theme) -> Result<Self, ThemeError> {
        let set = theme.template_set()?;
        info!(
            target = TARGET,
            theme = %theme.name,
            templates = theme.templates.len(),
            "Theme loaded"
        );
        Ok(Self {
            active: RwLock::new(Arc::new(theme)),
            templates: Arc::new(TemplateStore::with_set(set)),
        })
    }

    pub fn builtin() -> Result<Self, ThemeError> {
        Self::new(Theme::builtin()?)
    }

    pub fn templates(&self) -> Arc<TemplateStore> {
        Arc::clone(&self.templates)
    }

    pub fn active(&self) -> Arc<Theme> {
        Arc::clone(&rw_read(&self.active, TARGET, "active"))
    }

    /// Switch to `theme`. Templates are parsed before anything is swapped,
    /// so a broken theme leaves the current one in place.
    pub fn activate(&self, theme: Theme) -> Result<(), ThemeError> {
        let set = theme.template_set().map_err(|err| {
            warn!(
                target = TARGET,
                theme = %theme.name,
                error = %err,
                "Theme templates failed to parse; keeping the active theme"
            );
            err
        })?;

        let mut active = rw_write(&self.active, TARGET, "activate");
        self.templates.replace(set);
        info!(
            target = TARGET,
            previous = %active.name,
            theme = %theme.name,
            "Theme activated"
        );
        *active = Arc::new(theme);
        Ok(())
    }
}

impl ThemeManager for ThemeRegistry {
    fn active_theme(&self) -> String {
        rw_read(&self.active, TARGET, "active_theme").name.clone()
    }

    fn section_classes(&self, section_type: &str) -> Vec<String> {
        let theme = self.active();
        theme
            .definitions
            .section(&normalize_type_key(section_type))
            .map(|definition| definition.classes.clone())
            .unwrap_or_default()
    }

    fn definitions(&self) -> Arc<TypeDefinitions> {
        Arc::clone(&self.active().definitions)
    }
}
