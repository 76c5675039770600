//! Install-time asset manifest.

use fitshell_core::Error;
use fitshell_core::config::DEFAULT_MANIFEST;
use url::Url;

use crate::fetch::{resolve, same_origin};

/// Same-origin assets that must be cached before install completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<Url>,
}

impl Manifest {
    /// Resolve manifest entries against the app origin.
    ///
    /// Duplicates collapse to one entry; cross-origin entries are rejected.
    pub fn resolve<S: AsRef<str>>(origin: &Url, entries: &[S]) -> Result<Self, Error> {
        let mut resolved: Vec<Url> = Vec::with_capacity(entries.len());
        for entry in entries {
            let url = resolve(origin, entry.as_ref()).map_err(|e| Error::InvalidUrl(e.to_string()))?;
            if !same_origin(origin, &url) {
                return Err(Error::InvalidInput(format!("manifest entry {url} is not on {origin}")));
            }
            if !resolved.contains(&url) {
                resolved.push(url);
            }
        }
        Ok(Self { entries: resolved })
    }

    /// The built-in manifest for this origin.
    pub fn default_for(origin: &Url) -> Result<Self, Error> {
        Self::resolve(origin, DEFAULT_MANIFEST)
    }

    pub fn urls(&self) -> &[Url] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://app.example").unwrap()
    }

    #[test]
    fn test_resolve_paths() {
        let manifest = Manifest::resolve(&origin(), &["/index.html", "/manifest.json"]).unwrap();
        let urls: Vec<&str> = manifest.urls().iter().map(Url::as_str).collect();
        assert_eq!(urls, vec!["https://app.example/index.html", "https://app.example/manifest.json"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let manifest =
            Manifest::resolve(&origin(), &["/index.html", "https://app.example/index.html", "/index.html#x"]).unwrap();
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn test_cross_origin_rejected() {
        let result = Manifest::resolve(&origin(), &["https://cdn.example/app.js"]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_default_manifest() {
        let manifest = Manifest::default_for(&origin()).unwrap();
        assert_eq!(manifest.len(), DEFAULT_MANIFEST.len());
        assert!(manifest.urls().iter().any(|u| u.path() == "/index.html"));
    }
}
