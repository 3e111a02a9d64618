//! Asset manifest parsing
//!
//! A manifest names one release (its Version Tag) and the exhaustive list of
//! URLs that make up the app shell for that release. Manifests are written as
//! TOML and resolved against the controller scope, so the same file works when
//! the app is hosted under a sub-path.

use crate::error::{AppShellError, AppShellResult};
use crate::http::{Request, RequestKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use url::Url;

/// Manifest compiled into the binary for the flashcards app
pub const BUILTIN_MANIFEST: &str = include_str!("../manifests/flashcards.toml");

/// Opaque release identifier, also the name of that release's bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionTag(String);

impl VersionTag {
    /// Validate a tag. Tags become directory names, so only
    /// `[A-Za-z0-9._-]` is allowed and a leading `.` is rejected.
    pub fn new(tag: impl Into<String>) -> AppShellResult<Self> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(AppShellError::ManifestInvalid(
                "release version must not be empty".to_string(),
            ));
        }
        if tag.starts_with('.') {
            return Err(AppShellError::ManifestInvalid(format!(
                "release version '{}' must not start with '.'",
                tag
            )));
        }
        if let Some(bad) = tag
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(AppShellError::ManifestInvalid(format!(
                "release version '{}' contains invalid character '{}'",
                tag, bad
            )));
        }
        Ok(Self(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VersionTag {
    type Error = AppShellError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VersionTag> for String {
    fn from(tag: VersionTag) -> Self {
        tag.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse and normalize a controller scope. The scope must be an absolute
/// http(s) URL; a missing trailing `/` is added so relative paths resolve
/// beneath it.
pub fn parse_scope(scope: &str) -> AppShellResult<Url> {
    let mut url = Url::parse(scope).map_err(|e| AppShellError::ScopeInvalid {
        scope: scope.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppShellError::ScopeInvalid {
            scope: scope.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Raw manifest file as written on disk
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManifestFile {
    /// Release metadata
    pub release: ReleaseMeta,

    /// Asset list
    pub assets: ManifestAssets,
}

/// `[release]` section
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReleaseMeta {
    /// Version Tag for this release
    pub version: String,
}

/// `[assets]` section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ManifestAssets {
    /// Paths relative to the controller scope, in install order
    #[serde(default)]
    pub paths: Vec<String>,
}

impl ManifestFile {
    /// Parse a manifest from a TOML file on disk
    pub async fn from_file(path: &Path) -> AppShellResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppShellError::io(format!("reading manifest {}", path.display()), e))?;
        Self::parse(&content)
    }

    /// Parse a manifest from a TOML string
    pub fn parse(content: &str) -> AppShellResult<Self> {
        toml::from_str(content).map_err(|e| AppShellError::ManifestInvalid(e.to_string()))
    }

    /// The manifest compiled into the binary
    pub fn builtin() -> AppShellResult<Self> {
        Self::parse(BUILTIN_MANIFEST)
    }

    /// Resolve every path against `scope`
    pub fn resolve(&self, scope: &Url) -> AppShellResult<AssetManifest> {
        AssetManifest::new(
            VersionTag::new(self.release.version.clone())?,
            scope,
            &self.assets.paths,
        )
    }
}

/// A release's resolved, ordered, duplicate-free list of app-shell URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    version: VersionTag,
    scope: Url,
    assets: Vec<Url>,
}

impl AssetManifest {
    pub fn new(version: VersionTag, scope: &Url, paths: &[String]) -> AppShellResult<Self> {
        if paths.is_empty() {
            return Err(AppShellError::ManifestInvalid(format!(
                "release {} lists no assets",
                version
            )));
        }

        let mut seen = HashSet::new();
        let mut assets = Vec::with_capacity(paths.len());

        for path in paths {
            let mut url = scope.join(path).map_err(|_| AppShellError::ManifestPath {
                path: path.clone(),
                scope: scope.to_string(),
            })?;
            url.set_fragment(None);

            if url.origin() != scope.origin() {
                return Err(AppShellError::ManifestPath {
                    path: path.clone(),
                    scope: scope.to_string(),
                });
            }
            if !seen.insert(url.clone()) {
                return Err(AppShellError::ManifestDuplicate(url.to_string()));
            }
            assets.push(url);
        }

        Ok(Self {
            version,
            scope: scope.clone(),
            assets,
        })
    }

    pub fn version(&self) -> &VersionTag {
        &self.version
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    pub fn urls(&self) -> &[Url] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// GET requests for every asset, in manifest order
    pub fn requests(&self) -> impl Iterator<Item = Request> + '_ {
        self.assets.iter().cloned().map(Request::get)
    }

    /// Whether a stored entry key belongs to this manifest
    pub fn contains_key(&self, key: &RequestKey) -> bool {
        self.requests().any(|r| &r.key() == key)
    }

    /// SHA-256 over the version and the ordered resolved URLs
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.version.as_str().as_bytes());
        hasher.update(b"\n");
        for url in &self.assets {
            hasher.update(url.as_str().as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}
