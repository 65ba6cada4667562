use common::settings::ObjectStorage;
use tracing::{debug, error};

use data::bundle::Bundle;
use data::client::UpdateInfo;
use data::version::Version;
use repos::{Repo, bundle::BundleRepo, environment::EnvironmentRepo, error::RepoError};

use crate::{registry::VersionRegistry, version_number};

const FULL_ROLLOUT: i32 = 100;

/// Answers client update checks.
#[derive(Clone)]
pub struct UpdateDecisionEngine {
    repo: Repo,
    public_base_url: String,
}

impl UpdateDecisionEngine {
    pub fn new(repo: Repo, settings: &ObjectStorage) -> Self {
        Self {
            repo,
            public_base_url: settings.public_base_url.clone(),
        }
    }

    /// Never fails: lookup misses and internal errors both mean "no update".
    pub async fn check_update(
        &self,
        environment_key: &str,
        app_version: &str,
        package_hash: &str,
    ) -> Option<UpdateInfo> {
        match self.lookup(environment_key, app_version, package_hash).await {
            Ok(info) => info,
            Err(err) => {
                error!("Update check for app version {app_version} failed: {err}");
                None
            }
        }
    }

    async fn lookup(
        &self,
        environment_key: &str,
        app_version: &str,
        package_hash: &str,
    ) -> Result<Option<UpdateInfo>, RepoError> {
        let pool = &self.repo.pool;

        let Some(environment) = EnvironmentRepo::get_by_key(pool, environment_key).await? else {
            debug!("Update check with unknown deployment key");
            return Ok(None);
        };

        let Some(version) =
            VersionRegistry::get_by_environment_and_app_version(pool, environment.id, app_version)
                .await?
        else {
            return Ok(None);
        };

        let Some(current_id) = version.current_bundle_id else {
            return Ok(None);
        };

        let Some(bundle) = BundleRepo::get_by_id(pool, current_id).await? else {
            return Ok(None);
        };

        let latest = VersionRegistry::get_latest(pool, environment.id).await?;

        Ok(decide(
            &version,
            &bundle,
            latest.as_ref(),
            app_version,
            package_hash,
            &self.public_base_url,
        ))
    }
}

/// Picks between a bundle update, a native upgrade signal and nothing.
pub fn decide(
    version: &Version,
    bundle: &Bundle,
    latest: Option<&Version>,
    app_version: &str,
    package_hash: &str,
    public_base_url: &str,
) -> Option<UpdateInfo> {
    if bundle.hash != package_hash && version.app_version == app_version {
        return Some(UpdateInfo {
            download_url: download_url(public_base_url, &bundle.download_file),
            description: bundle.description.clone(),
            is_available: true,
            is_disabled: !bundle.is_valid,
            target_binary_range: app_version.to_string(),
            package_hash: bundle.hash.clone(),
            label: bundle.label.clone(),
            package_size: bundle.size,
            update_app_version: false,
            should_run_binary_version: false,
            is_mandatory: bundle.is_mandatory,
            rollout: FULL_ROLLOUT,
        });
    }

    let latest = latest?;
    // clients reporting an unparseable version never get the native signal
    let client_number = version_number::encode(app_version).ok()?;

    if latest.app_version != app_version && latest.version_number > client_number {
        return Some(UpdateInfo {
            target_binary_range: latest.app_version.clone(),
            update_app_version: true,
            ..Default::default()
        });
    }

    None
}

pub fn download_url(public_base_url: &str, download_file: &str) -> String {
    format!("{}/{}", public_base_url.trim_end_matches('/'), download_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE_URL: &str = "https://cdn.example.com/ota/";

    fn version(app_version: &str) -> Version {
        Version {
            app_version: app_version.to_string(),
            version_number: version_number::encode(app_version).unwrap(),
            ..Default::default()
        }
    }

    fn bundle(hash: &str) -> Bundle {
        Bundle {
            hash: hash.to_string(),
            label: "v1000000000000:2".to_string(),
            download_file: "bundles/b2.zip".to_string(),
            description: "fixes".to_string(),
            size: 42,
            sequence_id: 2,
            is_valid: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_bundle_update() {
        let v1 = version("1.0.0");
        let info = decide(&v1, &bundle("h2"), Some(&v1), "1.0.0", "h1", BASE_URL)
            .expect("update");

        assert_eq!(info.download_url, "https://cdn.example.com/ota/bundles/b2.zip");
        assert_eq!(info.package_hash, "h2");
        assert_eq!(info.label, "v1000000000000:2");
        assert_eq!(info.target_binary_range, "1.0.0");
        assert_eq!(info.package_size, 42);
        assert_eq!(info.rollout, 100);
        assert!(info.is_available);
        assert!(!info.is_disabled);
        assert!(!info.update_app_version);
    }

    #[test]
    fn test_disabled_bundle_is_flagged() {
        let v1 = version("1.0.0");
        let mut disabled = bundle("h2");
        disabled.is_valid = false;
        disabled.is_mandatory = true;

        let info = decide(&v1, &disabled, Some(&v1), "1.0.0", "h1", BASE_URL).expect("update");
        assert!(info.is_disabled);
        assert!(info.is_mandatory);
    }

    #[test]
    fn test_matching_hash_is_no_update() {
        let v1 = version("1.0.0");
        assert_eq!(
            decide(&v1, &bundle("h2"), Some(&v1), "1.0.0", "h2", BASE_URL),
            None
        );
    }

    #[test]
    fn test_native_upgrade_signal() {
        let v1 = version("1.0.0");
        let v2 = version("2.0.0");

        let info = decide(&v1, &bundle("h2"), Some(&v2), "1.0.0", "h2", BASE_URL)
            .expect("native upgrade");
        assert!(info.update_app_version);
        assert_eq!(info.target_binary_range, "2.0.0");
        assert!(info.download_url.is_empty());
        assert!(!info.is_available);
    }

    #[test]
    fn test_no_native_upgrade_towards_older_latest() {
        let v2 = version("1.10.0");
        let older = version("1.2.0");
        assert_eq!(
            decide(&v2, &bundle("h2"), Some(&older), "1.10.0", "h2", BASE_URL),
            None
        );
    }

    #[test]
    fn test_unparseable_client_version_skips_native_upgrade() {
        let odd = Version {
            app_version: "1.0.0-beta".to_string(),
            ..Default::default()
        };
        let latest = version("2.0.0");
        assert_eq!(
            decide(&odd, &bundle("h2"), Some(&latest), "1.0.0-beta", "h2", BASE_URL),
            None
        );
    }

    #[test]
    fn test_download_url_joins_with_single_slash() {
        assert_eq!(download_url("https://x/ota", "bundles/a.zip"), "https://x/ota/bundles/a.zip");
        assert_eq!(download_url("https://x/ota//", "bundles/a.zip"), "https://x/ota/bundles/a.zip");
    }
}
