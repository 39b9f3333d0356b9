//! Trusted boot asset observer.
//!
//! # Design
//! - Only models with a grade measure their boot chain; other models resolve
//!   to `NotApplicable`.
//! - Every new revision of a trusted asset is copied into the cache as
//!   `<asset>-<sha256>` before the update writes it, so the measurement
//!   subsystem can reseal against both the old and the new asset.
//! - Cancellation drops only the cache entries created by this observer.

use std::fs;
use std::path::{Path, PathBuf};

use gadgetd_gadget::{
    ContentChange, ContentChangeAction, ContentObserver, ContentOperation, GadgetError,
    GadgetResult,
};
use gadgetd_snap::Model;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{BootError, BootResult};
use crate::resolver::{ObserverResolution, ObserverResolver};

const DEFAULT_TRUSTED_ASSETS: &[&str] = &["grubx64.efi", "bootx64.efi"];

/// Resolves [`TrustedAssetsObserver`]s backed by an on-disk cache.
#[derive(Debug, Clone)]
pub struct TrustedAssetsResolver {
    cache_dir: PathBuf,
    trusted_assets: Vec<String>,
}

impl TrustedAssetsResolver {
    /// Resolver tracking the default grub EFI assets.
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            trusted_assets: DEFAULT_TRUSTED_ASSETS
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }

    /// Replace the tracked asset names.
    #[must_use]
    pub fn with_trusted_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_assets = assets.into_iter().map(Into::into).collect();
        self
    }

    /// Build a concrete observer, bypassing the trait object.
    ///
    /// # Errors
    ///
    /// Returns an error when the cache directory cannot be created.
    pub fn build_observer(&self) -> BootResult<TrustedAssetsObserver> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|source| BootError::io("create_cache_dir", &self.cache_dir, source))?;
        Ok(TrustedAssetsObserver {
            cache_dir: self.cache_dir.clone(),
            trusted_assets: self.trusted_assets.clone(),
            observed: Vec::new(),
        })
    }
}

impl ObserverResolver for TrustedAssetsResolver {
    fn observer_for_model(&self, model: &Model) -> BootResult<ObserverResolution> {
        if !model.has_grade() {
            debug!(model = %model.reference(), "trusted asset observer not applicable");
            return Ok(ObserverResolution::NotApplicable);
        }
        let observer = self.build_observer()?;
        Ok(ObserverResolution::Observer(Box::new(observer)))
    }
}

/// A trusted asset captured by the observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedAsset {
    /// Asset file name.
    pub name: String,
    /// Hex sha256 of the new content.
    pub hash: String,
    /// Location of the cached copy.
    pub cache_path: PathBuf,
    newly_cached: bool,
}

/// Observer caching new revisions of trusted boot assets.
#[derive(Debug)]
pub struct TrustedAssetsObserver {
    cache_dir: PathBuf,
    trusted_assets: Vec<String>,
    observed: Vec<ObservedAsset>,
}

impl TrustedAssetsObserver {
    /// Assets observed so far.
    #[must_use]
    pub fn observed(&self) -> &[ObservedAsset] {
        &self.observed
    }

    fn tracked_name(&self, relative_path: &str) -> Option<String> {
        let name = Path::new(relative_path).file_name()?.to_str()?;
        self.trusted_assets
            .iter()
            .any(|asset| asset == name)
            .then(|| name.to_string())
    }

    fn cache_asset(&mut self, name: String, source: &Path) -> BootResult<()> {
        let bytes = fs::read(source).map_err(|err| BootError::io("read_asset", source, err))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let hash = format!("{:x}", hasher.finalize());

        let cache_path = self.cache_dir.join(format!("{name}-{hash}"));
        let newly_cached = !cache_path.exists();
        if newly_cached {
            fs::write(&cache_path, &bytes)
                .map_err(|err| BootError::io("write_cache", &cache_path, err))?;
        }
        info!(asset = %name, hash = %hash, "observed trusted boot asset update");
        self.observed.push(ObservedAsset {
            name,
            hash,
            cache_path,
            newly_cached,
        });
        Ok(())
    }
}

impl ContentObserver for TrustedAssetsObserver {
    fn observe(
        &mut self,
        operation: ContentOperation,
        change: &ContentChange<'_>,
    ) -> GadgetResult<ContentChangeAction> {
        if operation == ContentOperation::Rollback {
            return Ok(ContentChangeAction::Apply);
        }
        if let Some(name) = self.tracked_name(change.relative_path) {
            self.cache_asset(name, change.after)
                .map_err(|err| GadgetError::observer("observe", err))?;
        }
        Ok(ContentChangeAction::Apply)
    }

    fn canceled(&mut self) -> GadgetResult<()> {
        for asset in self.observed.drain(..).filter(|asset| asset.newly_cached) {
            if let Err(err) = fs::remove_file(&asset.cache_path) {
                warn!(
                    error = %err,
                    path = %asset.cache_path.display(),
                    "failed to drop cached trusted asset"
                );
            }
        }
        Ok(())
    }
}
