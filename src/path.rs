//! Address canonicalization.
//!
//! Content items reach the engine under several encodings of the same
//! physical file. A bundler may hand out alias-relative keys, a glob may
//! produce `./`-relative keys, and a resolved import may look absolute or
//! escape upward with `..` while still being relative to a content root that
//! only becomes apparent once every key in the snapshot is known:
//!
//! ```text
//! @content/guide/index.mdx          alias-relative
//! /@content/guide/index.mdx         alias-relative, leading slash
//! ./guide/index.mdx                 bare relative
//! /../site/content/guide/index.mdx  filesystem-like, common root "/../site/content"
//! @content/guide/index.mdx?import   any of the above with a query suffix
//! ```
//!
//! All of them normalize to `guide/index.mdx`. [`Normalizer`] applies an
//! ordered list of stripping rules and is the only place these encodings are
//! understood; the tree builder and the locator both go through it.

/// Alias token used when none is configured.
pub const DEFAULT_ALIAS: &str = "@content";

/// Extensions treated as content when none are configured.
pub const CONTENT_EXTENSIONS: &[&str] = &[
    "mdx", "md", "tsx", "ts", "jsx", "js", "png", "jpg", "jpeg", "gif", "svg", "webp", "css",
];

/// Canonicalizes raw addresses into content-relative paths.
///
/// A normalizer is built per snapshot: the common root used for
/// filesystem-like keys depends on the whole key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    alias: String,
    /// Common root of filesystem-like keys, e.g. `"/docs"`. `Some("")` means
    /// the root is `/` itself; `None` means no filesystem-like key was seen.
    root: Option<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_ALIAS)
    }
}

impl Normalizer {
    /// A normalizer that only understands alias and relative encodings.
    pub fn new(alias: &str) -> Self {
        Self {
            alias: alias.trim_matches('/').to_string(),
            root: None,
        }
    }

    /// Use an explicit common root for filesystem-like keys.
    pub fn with_root(mut self, root: &str) -> Self {
        let trimmed = root.trim_end_matches('/');
        self.root = Some(if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        });
        self
    }

    /// Infer the common root from every filesystem-like key in the snapshot.
    pub fn infer<S: AsRef<str>>(alias: &str, keys: &[S], extensions: &[&str]) -> Self {
        let normalizer = Self::new(alias);
        let fs_keys: Vec<&str> = keys
            .iter()
            .map(|k| strip_query(k.as_ref()))
            .filter(|k| normalizer.is_filesystem_like(k) && has_extension(k, extensions))
            .collect();
        match common_root(&fs_keys) {
            Some(root) => normalizer.with_root(&root),
            None => normalizer,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Map a raw address to its content-relative path.
    ///
    /// Returns `None` for keys that cannot be mapped: NUL sentinels, keys
    /// that escape the content root, filesystem-like keys outside the
    /// inferred root, and keys that reduce to nothing.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        if raw.contains('\0') {
            return None;
        }
        let key = strip_query(raw).replace('\\', "/");
        let key = key.as_str();

        let relative = if let Some(rest) = self.strip_alias(key) {
            rest
        } else if let Some(rest) = key.strip_prefix("./") {
            rest
        } else if self.is_filesystem_like(key) {
            let root = self.root.as_deref()?;
            if root.is_empty() {
                key.trim_start_matches('/')
            } else {
                let rooted = if key.starts_with('/') {
                    key.to_string()
                } else {
                    format!("/{key}")
                };
                let rest = rooted.strip_prefix(root)?;
                if !rest.starts_with('/') {
                    return None;
                }
                return clean_segments(rest);
            }
        } else {
            key
        };

        clean_segments(relative)
    }

    fn strip_alias<'a>(&self, key: &'a str) -> Option<&'a str> {
        if self.alias.is_empty() {
            return None;
        }
        let key = key.strip_prefix('/').unwrap_or(key);
        key.strip_prefix(self.alias.as_str())?.strip_prefix('/')
    }

    /// Absolute-looking (`/x/...`) or escaped-relative (`../x/...`) keys.
    fn is_filesystem_like(&self, key: &str) -> bool {
        self.strip_alias(key).is_none() && (key.starts_with('/') || key.starts_with("../"))
    }
}

/// Drop a trailing `?query` or `#fragment`.
pub fn strip_query(key: &str) -> &str {
    match key.find(['?', '#']) {
        Some(pos) => &key[..pos],
        None => key,
    }
}

/// Clean a request path coming from navigation: no query, no leading or
/// trailing slash, no `./`. The root comes back as `""`.
pub fn clean_request(path: &str) -> String {
    let path = strip_query(path);
    let mut parts = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Whether the last segment ends in one of `extensions` (case-insensitive).
pub fn has_extension(path: &str, extensions: &[&str]) -> bool {
    extension(path).is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Extension of the last path segment, without the dot.
///
/// Leading dots do not start an extension (`.env` has none).
pub fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let pos = name.rfind('.')?;
    if pos == 0 || pos + 1 == name.len() {
        return None;
    }
    Some(&name[pos + 1..])
}

/// Longest common directory prefix shared by all keys.
///
/// Only directory segments are compared, never the file name:
/// `["/docs/a.mdx", "/docs/b/c.mdx"]` → `Some("/docs")`. Keys that share no
/// directory give `Some("")`; an empty key list gives `None`.
pub fn common_root(keys: &[&str]) -> Option<String> {
    let dirs: Vec<Vec<&str>> = keys
        .iter()
        .map(|k| {
            let mut parts: Vec<&str> = k.split('/').filter(|p| !p.is_empty()).collect();
            parts.pop();
            parts
        })
        .collect();
    let first = dirs.first()?;

    let mut common = 0;
    for (i, segment) in first.iter().enumerate() {
        if dirs.iter().all(|parts| parts.get(i) == Some(segment)) {
            common = i + 1;
        } else {
            break;
        }
    }

    if common == 0 {
        Some(String::new())
    } else {
        Some(format!("/{}", first[..common].join("/")))
    }
}

/// Re-join segments, dropping empty and `.` parts. `..` escapes the root.
fn clean_segments(path: &str) -> Option<String> {
    let mut parts = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => return None,
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
