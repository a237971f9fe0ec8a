// ─── Add-on Tracker ───
// Keeps an add-on install in step with its upstream releases, one tag per
// tracked item, recorded in `.version.json` once everything is in place.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::downloader::{Downloader, ProgressListener, WorkItem};
use crate::core::error::UpdaterResult;
use crate::core::manifest::fetch_release_tag;
use crate::core::state::{AddonItemKind, AddonSettings, TrackedItem};

use super::deploy::deploy_archive;
use super::version_file::{read_version_record, write_version_record, AddonVersionRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddonOutcome {
    UpToDate,
    /// Stale items were replaced; holds the record that was written.
    Updated(AddonVersionRecord),
}

/// A tracked item whose installed tag differs from the latest release.
#[derive(Debug, Clone)]
struct StaleItem<'a> {
    item: &'a TrackedItem,
    tag: String,
    dest: PathBuf,
}

pub struct AddonTracker<'a> {
    settings: &'a AddonSettings,
    downloader: Downloader,
}

impl<'a> AddonTracker<'a> {
    pub fn new(settings: &'a AddonSettings, downloader: Downloader) -> Self {
        Self {
            settings,
            downloader,
        }
    }

    /// Fetch, deploy and record every stale item.
    ///
    /// The version record is only written after every download and deployment
    /// succeeded; on error the previous record stays untouched.
    pub fn update_if_necessary(
        &self,
        listener: &dyn ProgressListener,
    ) -> UpdaterResult<AddonOutcome> {
        let install_dir = &self.settings.install_dir;
        let existing = read_version_record(install_dir);
        let every_update_required = existing.is_none();
        let mut record = existing.unwrap_or_default();

        if every_update_required {
            info!("No usable version record in {:?}, fetching everything", install_dir);
        }

        let stale = self.stale_items(&record, every_update_required);
        if stale.is_empty() {
            info!("Add-on is up to date");
            return Ok(AddonOutcome::UpToDate);
        }

        let items: Vec<WorkItem> = stale
            .iter()
            .map(|s| WorkItem::unverified(s.item.download_url.clone(), s.dest.clone()))
            .collect();
        self.downloader.download_batch(&items, listener)?;

        for s in stale
            .iter()
            .filter(|s| s.item.kind == AddonItemKind::Archive)
        {
            deploy_archive(&s.dest, install_dir)?;
        }

        for s in &stale {
            record.set(s.item.version_key.clone(), s.tag.clone());
        }
        write_version_record(install_dir, &record)?;

        info!("Updated {} add-on item(s)", stale.len());
        Ok(AddonOutcome::Updated(record))
    }

    fn stale_items(
        &self,
        record: &AddonVersionRecord,
        every_update_required: bool,
    ) -> Vec<StaleItem<'a>> {
        let settings: &'a AddonSettings = self.settings;
        let mut stale = Vec::new();

        for item in &settings.items {
            if !every_update_required && !record.contains(&item.version_key) {
                debug!("{} is not tracked in the version record", item.version_key);
                continue;
            }

            let Some(tag) = fetch_release_tag(self.downloader.transport(), &item.release_url) else {
                continue;
            };

            if every_update_required || record.get(&item.version_key) != Some(tag.as_str()) {
                debug!(
                    "{}: installed {:?}, latest {}",
                    item.version_key,
                    record.get(&item.version_key),
                    tag
                );
                stale.push(StaleItem {
                    item,
                    dest: settings.install_dir.join(download_file_name(item)),
                    tag,
                });
            }
        }

        stale
    }
}

/// Last path segment of the download URL, without query or fragment.
fn download_file_name(item: &TrackedItem) -> String {
    let url = item.download_url.as_str();
    let path = url.split(['?', '#']).next().unwrap_or(url);

    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => item.version_key.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::addon::version_file::version_file_path;
    use crate::core::downloader::NullProgressListener;
    use crate::core::test_support::{zip_bytes, MemoryTransport};

    const RAW_RELEASE: &str = "https://api.test/rawfiles/latest";
    const RAW_ZIP: &str = "https://files.test/rawfiles/release.zip";
    const LIB_RELEASE: &str = "https://api.test/library/latest";
    const LIB_DLL: &str = "https://files.test/library/iw4x.dll?raw=1";

    fn settings(install_dir: PathBuf) -> AddonSettings {
        AddonSettings {
            install_dir,
            items: vec![
                TrackedItem {
                    version_key: "iw4x_version".into(),
                    release_url: LIB_RELEASE.into(),
                    download_url: LIB_DLL.into(),
                    kind: AddonItemKind::File,
                },
                TrackedItem {
                    version_key: "rawfile_version".into(),
                    release_url: RAW_RELEASE.into(),
                    download_url: RAW_ZIP.into(),
                    kind: AddonItemKind::Archive,
                },
            ],
        }
    }

    fn tag(name: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({ "tag_name": name })).unwrap()
    }

    fn full_transport(raw_tag: &str, lib_tag: &str) -> MemoryTransport {
        MemoryTransport::new()
            .with(RAW_RELEASE, tag(raw_tag))
            .with(LIB_RELEASE, tag(lib_tag))
            .with(RAW_ZIP, zip_bytes(&[("main/readme.txt", "rawfiles")]))
            .with(LIB_DLL, b"library".to_vec())
    }

    fn run(settings: &AddonSettings, transport: Arc<MemoryTransport>) -> UpdaterResult<AddonOutcome> {
        AddonTracker::new(settings, Downloader::new(transport)).update_if_necessary(&NullProgressListener)
    }

    fn write_record(dir: &std::path::Path, json: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(version_file_path(dir), json).unwrap();
    }

    #[test]
    fn fresh_install_fetches_and_records_everything() {
        let dir = tempfile::tempdir().unwrap();
        let install = dir.path().join("iw4x");
        let settings = settings(install.clone());

        let outcome = run(&settings, Arc::new(full_transport("r2", "l5"))).unwrap();

        let AddonOutcome::Updated(record) = outcome else {
            panic!("expected an update");
        };
        assert_eq!(record.get("rawfile_version"), Some("r2"));
        assert_eq!(record.get("iw4x_version"), Some("l5"));
        assert_eq!(std::fs::read(install.join("main/readme.txt")).unwrap(), b"rawfiles");
        assert_eq!(std::fs::read(install.join("iw4x.dll")).unwrap(), b"library");
        assert!(!install.join("release.zip").exists());
        assert_eq!(read_version_record(&install), Some(record));
    }

    #[test]
    fn matching_tags_download_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_record(
            dir.path(),
            r#"{"rawfile_version": "r2", "iw4x_version": "l5"}"#,
        );
        let transport = Arc::new(full_transport("r2", "l5"));

        let outcome = run(&settings(dir.path().to_path_buf()), transport.clone()).unwrap();

        assert_eq!(outcome, AddonOutcome::UpToDate);
        assert_eq!(transport.request_count(RAW_ZIP), 0);
        assert_eq!(transport.request_count(LIB_DLL), 0);
    }

    #[test]
    fn only_stale_items_are_replaced_and_other_keys_survive() {
        let dir = tempfile::tempdir().unwrap();
        write_record(
            dir.path(),
            r#"{"rawfile_version": "r1", "iw4x_version": "l5", "extra": "kept"}"#,
        );
        let transport = Arc::new(full_transport("r2", "l5"));

        let outcome = run(&settings(dir.path().to_path_buf()), transport.clone()).unwrap();

        let AddonOutcome::Updated(record) = outcome else {
            panic!("expected an update");
        };
        assert_eq!(record.get("rawfile_version"), Some("r2"));
        assert_eq!(record.get("iw4x_version"), Some("l5"));
        assert_eq!(record.get("extra"), Some("kept"));
        assert_eq!(transport.request_count(LIB_DLL), 0);
        assert_eq!(transport.request_count(RAW_ZIP), 1);
    }

    #[test]
    fn keys_absent_from_a_valid_record_are_not_checked() {
        let dir = tempfile::tempdir().unwrap();
        write_record(dir.path(), r#"{"rawfile_version": "r2"}"#);
        let transport = Arc::new(full_transport("r2", "l9"));

        let outcome = run(&settings(dir.path().to_path_buf()), transport.clone()).unwrap();

        assert_eq!(outcome, AddonOutcome::UpToDate);
        assert_eq!(transport.request_count(LIB_RELEASE), 0);
    }

    #[test]
    fn malformed_record_forces_full_resync() {
        let dir = tempfile::tempdir().unwrap();
        write_record(dir.path(), "[]");

        let outcome = run(
            &settings(dir.path().to_path_buf()),
            Arc::new(full_transport("r2", "l5")),
        )
        .unwrap();

        assert!(matches!(outcome, AddonOutcome::Updated(_)));
        assert_eq!(
            read_version_record(dir.path()).unwrap().get("iw4x_version"),
            Some("l5")
        );
    }

    #[test]
    fn unknown_latest_tag_is_not_stale() {
        let dir = tempfile::tempdir().unwrap();
        write_record(dir.path(), r#"{"rawfile_version": "r1"}"#);
        let transport = Arc::new(full_transport("r2", "l5").failing(RAW_RELEASE));

        let outcome = run(&settings(dir.path().to_path_buf()), transport.clone()).unwrap();

        assert_eq!(outcome, AddonOutcome::UpToDate);
        assert_eq!(transport.request_count(RAW_ZIP), 0);
        assert_eq!(
            std::fs::read_to_string(version_file_path(dir.path())).unwrap(),
            r#"{"rawfile_version": "r1"}"#
        );
    }

    #[test]
    fn corrupt_archive_keeps_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let original = r#"{"rawfile_version": "r1"}"#;
        write_record(dir.path(), original);
        let transport = Arc::new(
            MemoryTransport::new()
                .with(RAW_RELEASE, tag("r2"))
                .with(RAW_ZIP, b"not a zip".to_vec()),
        );

        let result = run(&settings(dir.path().to_path_buf()), transport);

        assert!(result.is_err());
        assert_eq!(
            std::fs::read_to_string(version_file_path(dir.path())).unwrap(),
            original
        );
    }

    #[test]
    fn failed_download_keeps_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let original = r#"{"rawfile_version": "r1"}"#;
        write_record(dir.path(), original);
        let transport = Arc::new(
            MemoryTransport::new()
                .with(RAW_RELEASE, tag("r2"))
                .failing(RAW_ZIP),
        );

        let result = run(&settings(dir.path().to_path_buf()), transport);

        assert!(result.is_err());
        assert_eq!(
            std::fs::read_to_string(version_file_path(dir.path())).unwrap(),
            original
        );
    }

    #[test]
    fn destination_uses_url_file_name() {
        let settings = settings(PathBuf::from("/games/iw4x"));
        assert_eq!(download_file_name(&settings.items[0]), "iw4x.dll");
        assert_eq!(download_file_name(&settings.items[1]), "release.zip");

        let bare = TrackedItem {
            download_url: "https://files.test/".into(),
            ..settings.items[0].clone()
        };
        assert_eq!(download_file_name(&bare), "iw4x_version");
    }
}
