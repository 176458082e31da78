//! Database updater: release discovery, download and extraction.
//!
//! New releases are announced on a public article feed. Each feed entry
//! carries the release date in its title and links an article page that in
//! turn carries the installer-archive download URL. The installer is an Inno
//! Setup `setup.exe` wrapped in a zip archive, so extraction shells out to
//! `innoextract` to pull `qqwry.dat` out of it before the fresh file is
//! renamed over the configured path.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::metadata::UpdateMetadata;

/// Default article feed listing database releases.
pub const DEFAULT_FEED_URL: &str = "https://mp.weixin.qq.com/mp/appmsgalbum?action=getalbum&album_id=2329805780276838401&f=json&count=10";

/// Default interval between feed checks (7 days).
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Inno Setup path of the database inside the installer.
const INSTALLER_MEMBER: &str = r"app\qqwry.dat";

static INSTALLER_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https://www\.cz88\.net/soft/.*?\.zip").unwrap());

static RELEASE_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());

/// A database release announced on the feed.
#[derive(Debug, Clone)]
pub struct Release {
    /// Calendar date of the release (published under UTC+8).
    pub date: NaiveDate,
    /// Article page carrying the installer link.
    pub article_url: String,
}

/// Manager for the database file lifecycle.
///
/// # Example
///
/// ```ignore
/// use qqwry::Updater;
///
/// let updater = Updater::new("qqwry.dat");
/// if updater.update()? {
///     println!("database updated");
/// }
/// ```
pub struct Updater {
    db_path: PathBuf,
    feed_url: String,
    extractor: String,
    check_interval: Duration,
}

impl Updater {
    /// Create an updater for the database at `db_path`.
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            feed_url: DEFAULT_FEED_URL.to_string(),
            extractor: "innoextract".to_string(),
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    /// Use a custom release feed.
    pub fn with_feed_url(mut self, url: &str) -> Self {
        self.feed_url = url.to_string();
        self
    }

    /// Use a custom `innoextract` binary.
    pub fn with_extractor(mut self, path: &str) -> Self {
        self.extractor = path.to_string();
        self
    }

    /// Set a custom interval for [`Updater::update_if_due`].
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Path of the metadata file kept next to the database.
    pub fn metadata_path(&self) -> PathBuf {
        let mut name = self.db_path.as_os_str().to_owned();
        name.push(".meta");
        PathBuf::from(name)
    }

    /// Release date of the installed database, if one is present.
    pub fn installed_version(&self) -> Result<Option<NaiveDate>> {
        if !self.db_path.exists() {
            return Ok(None);
        }
        let db = Database::open(&self.db_path)?;
        Ok(Some(db.version()?))
    }

    /// Latest release announced on the feed.
    pub fn latest_release(&self) -> Result<Release> {
        let body = http_get_string(&self.feed_url)?;
        parse_feed(&body)
    }

    /// Check the feed and install the latest release if newer.
    ///
    /// A missing database always downloads. Returns `true` if a new
    /// database was installed.
    pub fn update(&self) -> Result<bool> {
        let installed = self.installed_version()?;
        let release = self.latest_release()?;
        let mut meta = UpdateMetadata::load(self.metadata_path())?;
        if let Some(current) = installed {
            if release.date <= current {
                log::info!(
                    "database is current: installed {current}, latest {}",
                    release.date
                );
                meta.touch();
                meta.save(self.metadata_path())?;
                return Ok(false);
            }
            log::info!("installed {current} is older than {}, updating", release.date);
        } else {
            log::info!(
                "no database at {}, downloading latest release",
                self.db_path.display()
            );
        }
        self.install(&release)?;
        meta.record_release(release.date);
        meta.save(self.metadata_path())?;
        Ok(true)
    }

    /// Run [`Updater::update`] only when the configured interval has
    /// elapsed since the last feed check.
    pub fn update_if_due(&self) -> Result<bool> {
        let meta = UpdateMetadata::load(self.metadata_path())?;
        if meta.needs_check(self.check_interval) {
            self.update()
        } else {
            Ok(false)
        }
    }

    /// Download the release and install it over the database path.
    fn install(&self, release: &Release) -> Result<()> {
        let page = http_get_string(&release.article_url)?;
        let installer_url = find_installer_url(&page)
            .ok_or_else(|| Error::Download("no installer link in release page".to_string()))?;
        log::info!("downloading installer from {installer_url}");
        let archive = http_get_bytes(installer_url)?;

        // Scratch space next to the target so the final rename stays on one
        // filesystem.
        let parent = self.db_path.parent().unwrap_or(Path::new("."));
        let scratch = tempfile::tempdir_in(parent)?;
        let setup_path = scratch.path().join("setup.exe");
        extract_setup(&archive, &setup_path)?;
        run_extractor(&self.extractor, scratch.path(), &setup_path)?;

        let extracted = scratch.path().join("app").join("qqwry.dat");
        let len = fs::metadata(&extracted)?.len();
        fs::rename(&extracted, &self.db_path)?;
        log::info!("installed {} ({len} bytes)", self.db_path.display());
        Ok(())
    }
}

fn http_get_string(url: &str) -> Result<String> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| Error::Download(e.to_string()))?;
    if response.status() != 200 {
        return Err(Error::Download(format!("HTTP {} from {url}", response.status())));
    }
    response
        .into_string()
        .map_err(|e| Error::Download(e.to_string()))
}

fn http_get_bytes(url: &str) -> Result<Vec<u8>> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| Error::Download(e.to_string()))?;
    if response.status() != 200 {
        return Err(Error::Download(format!("HTTP {} from {url}", response.status())));
    }
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| Error::Download(e.to_string()))?;
    Ok(bytes)
}

/// Pick the latest release out of the feed JSON.
fn parse_feed(body: &str) -> Result<Release> {
    let feed: serde_json::Value =
        serde_json::from_str(body).map_err(|e| Error::Feed(e.to_string()))?;
    let ret = feed.pointer("/base_resp/ret").and_then(|v| v.as_i64());
    if ret != Some(0) {
        return Err(Error::Feed(format!("feed returned ret={ret:?}")));
    }
    let latest = feed
        .pointer("/getalbum_resp/article_list/0")
        .ok_or_else(|| Error::Feed("empty article list".to_string()))?;
    let title = latest
        .get("title")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Feed("article has no title".to_string()))?;
    let url = latest
        .get("url")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Feed("article has no url".to_string()))?;
    let date = release_date_from_title(title)
        .ok_or_else(|| Error::Feed(format!("no release date in title {title:?}")))?;
    Ok(Release {
        date,
        article_url: url.to_string(),
    })
}

/// The article title embeds the release date as `YYYY-MM-DD`.
fn release_date_from_title(title: &str) -> Option<NaiveDate> {
    let found = RELEASE_DATE.find(title)?;
    NaiveDate::parse_from_str(found.as_str(), "%Y-%m-%d").ok()
}

fn find_installer_url(page: &str) -> Option<&str> {
    INSTALLER_URL.find(page).map(|m| m.as_str())
}

/// Pull `setup.exe` out of the downloaded zip archive.
fn extract_setup(archive: &[u8], dest: &Path) -> Result<()> {
    let mut zip = zip::ZipArchive::new(io::Cursor::new(archive))?;
    let mut setup = zip.by_name("setup.exe")?;
    let mut out = File::create(dest)?;
    io::copy(&mut setup, &mut out)?;
    Ok(())
}

/// Run `innoextract` to pull the database file out of the installer.
fn run_extractor(extractor: &str, dir: &Path, setup: &Path) -> Result<()> {
    let status = Command::new(extractor)
        .arg("-d")
        .arg(dir)
        .arg("-I")
        .arg(INSTALLER_MEMBER)
        .arg(setup)
        .status()
        .map_err(|e| Error::Extract(format!("failed to run {extractor}: {e}")))?;
    if !status.success() {
        return Err(Error::Extract(format!("{extractor} exited with {status}")));
    }
    Ok(())
}
