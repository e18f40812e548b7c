use anyhow::Result;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use crate::cache::{Cache, CacheEntry};
use crate::error::DepledgerError;
use crate::models::{dep_key, Dependency, Ecosystem, NON_STANDARD_LICENSE, UNKNOWN_LICENSE};
use crate::registry::{RegistryClient, VersionInfo};

const BATCH_SIZE: usize = 75;

/// Resolves dependency identities to license lists, cache first and the
/// registry on a miss. The resolver owns the cache for the run; writes go
/// through it alone.
pub struct Resolver {
    cache: Cache,
    client: RegistryClient,
}

impl Resolver {
    pub fn new(cache: Cache, client: RegistryClient) -> Self {
        Self { cache, client }
    }

    /// Resolve one identity. Not-found and empty registry answers become
    /// sentinel entries; both are written back to the cache so a repeat
    /// lookup in the same run never hits the network again.
    pub async fn resolve(
        &mut self,
        ecosystem: Ecosystem,
        name: &str,
        version: &str,
    ) -> Result<Vec<String>, DepledgerError> {
        let key = dep_key(ecosystem, name, version);

        if let Some(entry) = self.cache.get(&key) {
            debug!("license cache hit for {key}");
            return Ok(entry.licenses.clone());
        }

        info!("requesting {key} from registry");
        let fetched = self
            .client
            .version(ecosystem, name, version)
            .await
            .map_err(|source| DepledgerError::ResolutionFailed {
                ecosystem,
                name: name.to_string(),
                version: version.to_string(),
                source: source.into(),
            })?;

        let licenses = normalize_licenses(fetched);
        self.cache.put(CacheEntry {
            ecosystem,
            name: name.to_string(),
            version: version.to_string(),
            licenses: licenses.clone(),
        });
        Ok(licenses)
    }

    /// Populate `licenses` on every record. Unique uncached identities are
    /// fetched in parallel batches; cache writes happen on this task only,
    /// after each batch completes. Report ordering is unaffected — the
    /// aggregator re-sorts everything.
    pub async fn resolve_all(
        &mut self,
        deps: &mut [Dependency],
        quiet: bool,
    ) -> Result<(), DepledgerError> {
        let mut pending: Vec<(Ecosystem, String, String)> = Vec::new();
        let mut queued = std::collections::HashSet::new();
        for dep in deps.iter() {
            let key = dep.key();
            if self.cache.contains(&key) {
                debug!("license cache hit for {key}");
                continue;
            }
            if queued.insert(key) {
                pending.push((dep.ecosystem, dep.name.clone(), dep.version.clone()));
            }
        }

        let pb = if !quiet && !pending.is_empty() {
            Some(progress_bar(pending.len() as u64))
        } else {
            None
        };

        for batch in pending.chunks(BATCH_SIZE) {
            let futures: Vec<_> = batch
                .iter()
                .map(|(ecosystem, name, version)| {
                    let client = &self.client;
                    async move {
                        info!(
                            "requesting {} from registry",
                            dep_key(*ecosystem, name, version)
                        );
                        client.version(*ecosystem, name, version).await
                    }
                })
                .collect();

            let results = join_all(futures).await;

            for ((ecosystem, name, version), result) in batch.iter().zip(results) {
                let fetched = result.map_err(|source| DepledgerError::ResolutionFailed {
                    ecosystem: *ecosystem,
                    name: name.clone(),
                    version: version.clone(),
                    source: source.into(),
                })?;
                self.cache.put(CacheEntry {
                    ecosystem: *ecosystem,
                    name: name.clone(),
                    version: version.clone(),
                    licenses: normalize_licenses(fetched),
                });
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
            }
        }

        if let Some(pb) = pb {
            pb.finish_with_message("Done");
        }

        for dep in deps.iter_mut() {
            if let Some(entry) = self.cache.get(&dep.key()) {
                dep.licenses = entry.licenses.clone();
            }
        }
        Ok(())
    }

    pub fn save_cache(&self) -> Result<()> {
        self.cache.save()
    }

    #[cfg(test)]
    pub fn cache(&self) -> &Cache {
        &self.cache
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Map a registry answer onto the pipeline's license list: the literal
/// `non-standard` is re-tagged so it cannot be mistaken for an SPDX
/// identifier, and "nothing known" becomes the unknown sentinel.
fn normalize_licenses(fetched: Option<VersionInfo>) -> Vec<String> {
    let licenses: Vec<String> = fetched
        .map(|info| info.licenses)
        .unwrap_or_default()
        .into_iter()
        .map(|license| {
            if license == "non-standard" {
                NON_STANDARD_LICENSE.to_string()
            } else {
                license
            }
        })
        .collect();

    if licenses.is_empty() {
        vec![UNKNOWN_LICENSE.to_string()]
    } else {
        licenses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn unroutable_client() -> RegistryClient {
        // A cache hit must never touch the network; this base URL fails fast
        // if it does.
        RegistryClient::with_base_url("http://127.0.0.1:1".to_string()).unwrap()
    }

    /// Minimal local registry that answers every request with 404, standing
    /// in for "version unknown to deps.dev".
    async fn not_found_server() -> (String, tokio::task::JoinHandle<()>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 404 Not Found\r\n\
                          content-length: 0\r\n\
                          connection: close\r\n\r\n",
                    )
                    .await;
            }
        });
        (base, handle)
    }

    #[test]
    fn test_not_found_becomes_unknown_sentinel() {
        assert_eq!(normalize_licenses(None), vec![UNKNOWN_LICENSE]);
    }

    #[test]
    fn test_empty_license_list_becomes_unknown_sentinel() {
        let info = VersionInfo { licenses: vec![] };
        assert_eq!(normalize_licenses(Some(info)), vec![UNKNOWN_LICENSE]);
    }

    #[test]
    fn test_non_standard_is_retagged() {
        let info = VersionInfo {
            licenses: vec!["MIT".to_string(), "non-standard".to_string()],
        };
        assert_eq!(
            normalize_licenses(Some(info)),
            vec!["MIT", NON_STANDARD_LICENSE]
        );
    }

    #[tokio::test]
    async fn test_cache_hit_skips_registry() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = Cache::empty(&dir.path().join("licenses.json"));
        cache.put(CacheEntry {
            ecosystem: Ecosystem::Npm,
            name: "express".to_string(),
            version: "4.18.2".to_string(),
            licenses: vec!["MIT".to_string()],
        });

        let mut resolver = Resolver::new(cache, unroutable_client());
        let licenses = resolver
            .resolve(Ecosystem::Npm, "express", "4.18.2")
            .await
            .unwrap();
        assert_eq!(licenses, vec!["MIT"]);
    }

    #[tokio::test]
    async fn test_resolve_all_serves_cached_identities() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = Cache::empty(&dir.path().join("licenses.json"));
        cache.put(CacheEntry {
            ecosystem: Ecosystem::Pypi,
            name: "flask".to_string(),
            version: "2.0.1".to_string(),
            licenses: vec![UNKNOWN_LICENSE.to_string()],
        });

        let mut deps = vec![
            Dependency {
                ecosystem: Ecosystem::Pypi,
                name: "flask".to_string(),
                version: "2.0.1".to_string(),
                origin: Path::new("a/requirements.txt").to_path_buf(),
                indirect: false,
                licenses: Vec::new(),
            },
            Dependency {
                ecosystem: Ecosystem::Pypi,
                name: "flask".to_string(),
                version: "2.0.1".to_string(),
                origin: Path::new("b/requirements.txt").to_path_buf(),
                indirect: true,
                licenses: Vec::new(),
            },
        ];

        let mut resolver = Resolver::new(cache, unroutable_client());
        resolver.resolve_all(&mut deps, true).await.unwrap();
        assert_eq!(deps[0].licenses, vec![UNKNOWN_LICENSE]);
        assert_eq!(deps[1].licenses, vec![UNKNOWN_LICENSE]);
        assert_eq!(resolver.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_cached_for_repeat_lookups() {
        let (base, server) = not_found_server().await;
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::empty(&dir.path().join("licenses.json"));
        let mut resolver = Resolver::new(cache, RegistryClient::with_base_url(base).unwrap());

        let licenses = resolver
            .resolve(Ecosystem::Npm, "left-pad", "1.3.0")
            .await
            .unwrap();
        assert_eq!(licenses, vec![UNKNOWN_LICENSE]);
        assert!(resolver
            .cache()
            .contains(&dep_key(Ecosystem::Npm, "left-pad", "1.3.0")));

        // The written-back sentinel must satisfy the repeat lookup without
        // the registry.
        server.abort();
        let licenses = resolver
            .resolve(Ecosystem::Npm, "left-pad", "1.3.0")
            .await
            .unwrap();
        assert_eq!(licenses, vec![UNKNOWN_LICENSE]);
    }

    #[tokio::test]
    async fn test_resolve_all_writes_fetched_entries_back() {
        let (base, server) = not_found_server().await;
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::empty(&dir.path().join("licenses.json"));
        let mut resolver = Resolver::new(cache, RegistryClient::with_base_url(base).unwrap());

        let mut deps = vec![Dependency {
            ecosystem: Ecosystem::Go,
            name: "example.com/a".to_string(),
            version: "v1.0.0".to_string(),
            origin: Path::new("go.mod").to_path_buf(),
            indirect: false,
            licenses: Vec::new(),
        }];
        resolver.resolve_all(&mut deps, true).await.unwrap();
        server.abort();

        assert_eq!(deps[0].licenses, vec![UNKNOWN_LICENSE]);
        assert!(resolver
            .cache()
            .contains(&dep_key(Ecosystem::Go, "example.com/a", "v1.0.0")));
    }

    #[tokio::test]
    async fn test_transport_error_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::empty(&dir.path().join("licenses.json"));
        let mut resolver = Resolver::new(cache, unroutable_client());

        let err = resolver
            .resolve(Ecosystem::Cargo, "serde", "1.0.150")
            .await
            .unwrap_err();
        assert!(matches!(err, DepledgerError::ResolutionFailed { .. }));
    }
}
