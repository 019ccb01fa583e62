//! Prompt Manager
//!
//! Template store lookup, `_extends` inheritance resolution with caching,
//! and Handlebars rendering.
//!
//! Error policy: a missing template, an unparsable file, or a record without
//! a `template` body are recoverable - they are logged and surface as empty
//! output so one bad prompt cannot crash an interactive session. Only two
//! conditions are hard errors: calling any lookup before `initialize`, and a
//! cycle in the `_extends` chain.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Variable context handed to rendering. Caller values win over the
/// defaults declared on the resolved record.
pub type PromptVars = serde_json::Map<String, serde_json::Value>;

/// Template extension for definition files in the store
const TEMPLATE_EXT: &str = "yaml";

/// Reserved field naming the parent template
const EXTENDS_KEY: &str = "_extends";

/// Reserved field holding the renderable body
const TEMPLATE_KEY: &str = "template";

/// Prompt template engine with inheritance resolution and a per-instance
/// resolution cache.
///
/// One instance is constructed by the host process and shared (behind `Arc`)
/// by every call site. The store root is set exactly once via `initialize`;
/// resolved records are cached for the instance lifetime and never evicted,
/// so edits to the backing files are deliberately invisible after the first
/// resolution of a name.
pub struct PromptManager {
    /// Handlebars engine, non-strict so unresolved placeholders render empty
    hbs: Handlebars<'static>,
    /// Template store root, set once by `initialize`
    prompt_dir: RwLock<Option<PathBuf>>,
    /// Resolved records by template name, populated lazily
    cache: RwLock<HashMap<String, Mapping>>,
}

impl PromptManager {
    /// Create an uninitialized manager. Call `initialize` before use.
    pub fn new() -> Self {
        debug!("PromptManager::new: called");
        Self {
            hbs: Handlebars::new(),
            prompt_dir: RwLock::new(None),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Set the template store root. One-time: a repeat call is a logged
    /// no-op so an established cache is never invalidated mid-session.
    pub fn initialize(&self, prompt_dir: impl AsRef<Path>) {
        let dir = prompt_dir.as_ref();
        debug!(?dir, "PromptManager::initialize: called");
        if let Ok(mut slot) = self.prompt_dir.write() {
            if slot.is_some() {
                warn!("prompt manager is already initialized, ignoring re-initialization");
                return;
            }
            *slot = Some(dir.to_path_buf());
            info!(prompt_dir = %dir.display(), "prompt manager initialized");
        }
    }

    /// Whether `initialize` has been called
    pub fn is_initialized(&self) -> bool {
        self.prompt_dir.read().map(|d| d.is_some()).unwrap_or(false)
    }

    /// Store root, or the fatal not-initialized error
    fn prompt_dir(&self) -> Result<PathBuf> {
        match self.prompt_dir.read() {
            Ok(guard) => guard.clone().ok_or_else(|| {
                error!("prompt manager used before initialize()");
                eyre!("PromptManager not initialized. Call initialize() first")
            }),
            Err(_) => Err(eyre!("PromptManager not initialized. Call initialize() first")),
        }
    }

    /// Locate the definition file for a template name.
    ///
    /// A slash-delimited name is first probed as a direct path under the
    /// root. Otherwise (or when the probe misses) the whole tree is walked;
    /// a multi-segment name must also match its directory prefix exactly.
    /// The walk is sorted by file name so lookups are deterministic; when
    /// several files could satisfy a bare name the lexicographically first
    /// wins and the ambiguity is logged.
    fn find_template_file(&self, template_name: &str) -> Result<Option<PathBuf>> {
        debug!(%template_name, "PromptManager::find_template_file: called");
        let root = self.prompt_dir()?;

        if template_name.contains('/') {
            let direct = root.join(format!("{}.{}", template_name, TEMPLATE_EXT));
            if direct.is_file() {
                debug!(path = %direct.display(), "find_template_file: direct path match");
                return Ok(Some(direct));
            }
            debug!("find_template_file: no direct path match, walking the store");
        }

        let parts: Vec<&str> = template_name.split('/').collect();
        let leaf_file = format!("{}.{}", parts[parts.len() - 1], TEMPLATE_EXT);
        let dir_prefix: PathBuf = parts[..parts.len() - 1].iter().collect();

        let mut matches: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy() != leaf_file {
                continue;
            }
            if parts.len() > 1 {
                let rel_dir = entry.path().parent().and_then(|p| p.strip_prefix(&root).ok());
                if rel_dir != Some(dir_prefix.as_path()) {
                    debug!(path = %entry.path().display(), "find_template_file: directory prefix mismatch");
                    continue;
                }
            }
            matches.push(entry.into_path());
        }

        if matches.len() > 1 {
            warn!(
                %template_name,
                count = matches.len(),
                first = %matches[0].display(),
                "multiple definition files match, using the lexicographically first"
            );
        }

        match matches.into_iter().next() {
            Some(path) => {
                debug!(path = %path.display(), "find_template_file: found");
                Ok(Some(path))
            }
            None => {
                warn!("template file '{}' not found", template_name);
                Ok(None)
            }
        }
    }

    /// Parse a definition file into its top-level mapping.
    ///
    /// Parse failures are absorbed: they are logged and an empty mapping is
    /// returned, which callers treat as "nothing usable".
    fn load_yaml(&self, path: &Path) -> Mapping {
        debug!(path = %path.display(), "PromptManager::load_yaml: called");
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read template file");
                return Mapping::new();
            }
        };
        match serde_yaml::from_str::<Mapping>(&text) {
            Ok(mapping) => mapping,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to parse template file");
                Mapping::new()
            }
        }
    }

    /// Resolve a template name to its flattened record.
    ///
    /// Checks the cache first; otherwise loads the definition file, selects
    /// the record (exact leaf-key match, else the first declared key), and
    /// flattens any `_extends` chain with child fields overwriting parent
    /// fields. The result is cached before returning.
    ///
    /// Not-found and unparsable definitions resolve to an empty mapping.
    /// A cycle in the `_extends` chain is a hard configuration error.
    pub fn resolve(&self, template_name: &str) -> Result<Mapping> {
        let mut chain = Vec::new();
        self.resolve_inner(template_name, &mut chain)
    }

    fn resolve_inner(&self, template_name: &str, chain: &mut Vec<String>) -> Result<Mapping> {
        debug!(%template_name, depth = chain.len(), "PromptManager::resolve_inner: called");

        if chain.iter().any(|seen| seen == template_name) {
            chain.push(template_name.to_string());
            error!(cycle = %chain.join(" -> "), "cyclic template inheritance detected");
            return Err(eyre!("cyclic template inheritance: {}", chain.join(" -> ")));
        }

        if let Ok(cache) = self.cache.read()
            && let Some(cached) = cache.get(template_name)
        {
            debug!(%template_name, "resolve_inner: cache hit");
            return Ok(cached.clone());
        }

        let Some(path) = self.find_template_file(template_name)? else {
            error!("template '{}' not found", template_name);
            return Ok(Mapping::new());
        };

        let yaml_data = self.load_yaml(&path);
        if yaml_data.is_empty() {
            debug!(%template_name, "resolve_inner: definition file empty or unparsable");
            return Ok(Mapping::new());
        }

        // Exact leaf-key match first, else fall back to the first declared
        // key: a single-definition file need not repeat its logical name.
        let leaf = template_name.rsplit('/').next().unwrap_or(template_name);
        let record_value = match yaml_data.get(leaf) {
            Some(v) => {
                debug!(%leaf, "resolve_inner: exact key match");
                v
            }
            None => match yaml_data.iter().next() {
                Some((key, v)) => {
                    debug!(key = ?key, "resolve_inner: falling back to first declared key");
                    v
                }
                None => {
                    error!("no usable template record in '{}'", template_name);
                    return Ok(Mapping::new());
                }
            },
        };

        let Some(record) = record_value.as_mapping() else {
            error!(
                "template record for '{}' is not a mapping, ignoring it",
                template_name
            );
            return Ok(Mapping::new());
        };

        let resolved = match record.get(EXTENDS_KEY).and_then(Value::as_str) {
            Some(parent_name) => {
                debug!(%template_name, %parent_name, "resolve_inner: resolving parent");
                chain.push(template_name.to_string());
                let parent = self.resolve_inner(parent_name, chain)?;
                chain.pop();
                merge_records(&parent, record)
            }
            None => {
                let mut flat = record.clone();
                flat.remove(EXTENDS_KEY);
                flat
            }
        };

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(template_name.to_string(), resolved.clone());
        }
        debug!(%template_name, fields = resolved.len(), "resolve_inner: resolved and cached");
        Ok(resolved)
    }

    /// Render a template with caller-supplied variables.
    ///
    /// Context precedence, later wins: the resolved record's own fields,
    /// then `variables`. Recoverable failures render as an empty string.
    pub fn get_prompt(&self, template_name: &str, variables: Option<&PromptVars>) -> Result<String> {
        self.get_prompt_with(template_name, variables, &PromptVars::new())
    }

    /// Render with an extra, highest-precedence override tier.
    pub fn get_prompt_with(
        &self,
        template_name: &str,
        variables: Option<&PromptVars>,
        overrides: &PromptVars,
    ) -> Result<String> {
        debug!(%template_name, "PromptManager::get_prompt_with: called");
        let record = self.resolve(template_name)?;
        if record.is_empty() {
            debug!(%template_name, "get_prompt_with: nothing usable resolved");
            return Ok(String::new());
        }

        let Some(body) = record.get(TEMPLATE_KEY).and_then(Value::as_str) else {
            error!("template '{}' has no 'template' field", template_name);
            return Ok(String::new());
        };

        let mut context = PromptVars::new();
        for (key, value) in &record {
            let Some(key) = key.as_str() else { continue };
            if key == TEMPLATE_KEY {
                continue;
            }
            match serde_json::to_value(value) {
                Ok(json) => {
                    context.insert(key.to_string(), json);
                }
                Err(e) => {
                    warn!(%template_name, field = %key, error = %e, "skipping unconvertible template field");
                }
            }
        }
        if let Some(vars) = variables {
            for (key, value) in vars {
                context.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in overrides {
            context.insert(key.clone(), value.clone());
        }

        let body = rewrite_single_braces(body);
        match self.hbs.render_template(&body, &context) {
            Ok(rendered) => Ok(rendered),
            Err(e) => {
                error!(%template_name, error = %e, "template rendering failed");
                Ok(String::new())
            }
        }
    }

    /// Names along the `_extends` chain starting at `template_name`,
    /// child first. Stops at the first missing parent; a cycle ends the
    /// chain at the repeated name.
    pub fn inheritance_chain(&self, template_name: &str) -> Result<Vec<String>> {
        debug!(%template_name, "PromptManager::inheritance_chain: called");
        let mut chain = vec![template_name.to_string()];
        let mut current = template_name.to_string();

        loop {
            let Some(path) = self.find_template_file(&current)? else {
                break;
            };
            let yaml_data = self.load_yaml(&path);
            let leaf = current.rsplit('/').next().unwrap_or(&current).to_string();
            let record = yaml_data
                .get(leaf.as_str())
                .or_else(|| yaml_data.iter().next().map(|(_, v)| v));
            let Some(parent) = record
                .and_then(Value::as_mapping)
                .and_then(|m| m.get(EXTENDS_KEY))
                .and_then(Value::as_str)
            else {
                break;
            };

            let parent = parent.to_string();
            let seen = chain.iter().any(|name| name == &parent);
            chain.push(parent.clone());
            if seen {
                warn!(cycle = %chain.join(" -> "), "inheritance_chain: cycle, stopping");
                break;
            }
            current = parent;
        }

        Ok(chain)
    }

    /// List every definition file under the store root, as template names
    /// relative to the root with the extension stripped, in walk order.
    pub fn list_available_templates(&self) -> Result<Vec<String>> {
        debug!("PromptManager::list_available_templates: called");
        let root = self.prompt_dir()?;

        let mut templates = Vec::new();
        for entry in WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXT) {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&root) {
                let name = rel.with_extension("");
                let name = name
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                templates.push(name);
            }
        }
        debug!(count = templates.len(), "list_available_templates: done");
        Ok(templates)
    }
}

impl Default for PromptManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge a child record over its resolved parent.
///
/// Shallow overwrite: every child field replaces the parent's field of the
/// same name wholesale, nested structures are not deep-merged. The
/// `_extends` key never survives into the result.
fn merge_records(parent: &Mapping, child: &Mapping) -> Mapping {
    debug!(
        parent_fields = parent.len(),
        child_fields = child.len(),
        "merge_records: called"
    );
    let mut result = parent.clone();
    for (key, value) in child {
        if key.as_str() == Some(EXTENDS_KEY) {
            continue;
        }
        result.insert(key.clone(), value.clone());
    }
    result
}

/// Rewrite simple `{var}` placeholders to Handlebars `{{ var }}` spelling.
///
/// Spans that are already double-braced are left untouched, so `{{name}}`
/// never becomes triple-braced. Isolated so the rewrite rule is testable on
/// its own.
pub fn rewrite_single_braces(body: &str) -> String {
    // Alternation instead of lookaround: the first branch consumes existing
    // `{{ ... }}` spans verbatim, the second captures bare `{name}` spans.
    static BRACES: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\{\{[^{}]*\}\}|\{([^{}]+)\}").expect("brace rewrite pattern is valid")
    });

    BRACES
        .replace_all(body, |caps: &regex::Captures| match caps.get(1) {
            Some(inner) => format!("{{{{ {} }}}}", inner.as_str().trim()),
            None => caps[0].to_string(),
        })
        .into_owned()
}
