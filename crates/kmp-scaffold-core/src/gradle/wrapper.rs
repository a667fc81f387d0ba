//! Gradle wrapper materialization
//!
//! Writes `gradle/wrapper/gradle-wrapper.properties`, downloads and verifies
//! `gradle-wrapper.jar`, and installs the `gradlew` launchers from templates.
//! Files that already exist are kept as they are.

use crate::config::ScaffoldConfig;
use crate::error::ScaffoldError;
use crate::io::{atomic_write, set_executable, write_if_missing};
use crate::templates::TemplateStore;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use zip::ZipArchive;

/// Timeout for the jar download
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Entry point class every wrapper jar contains
const WRAPPER_MAIN_CLASS: &str = "org/gradle/wrapper/GradleWrapperMain.class";

pub const PROPERTIES_PATH: &str = "gradle/wrapper/gradle-wrapper.properties";
pub const JAR_PATH: &str = "gradle/wrapper/gradle-wrapper.jar";

/// Launcher scripts, installed from templates of the same name
pub const LAUNCHERS: &[&str] = &["gradlew", "gradlew.bat"];

/// What materialization did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WrapperReport {
    pub written: Vec<PathBuf>,
    pub kept: Vec<PathBuf>,
}

impl WrapperReport {
    fn record(&mut self, relative: &str, written: bool) {
        let path = PathBuf::from(relative);
        if written {
            self.written.push(path);
        } else {
            self.kept.push(path);
        }
    }
}

/// Contents of `gradle-wrapper.properties`
pub fn wrapper_properties(distribution_url: &Url) -> String {
    // `:` must be escaped in .properties values
    let escaped = distribution_url.as_str().replace(':', "\\:");
    format!(
        "distributionBase=GRADLE_USER_HOME\n\
         distributionPath=wrapper/dists\n\
         distributionUrl={}\n\
         networkTimeout=10000\n\
         validateDistributionUrl=true\n\
         zipStoreBase=GRADLE_USER_HOME\n\
         zipStorePath=wrapper/dists\n",
        escaped
    )
}

/// Check that `bytes` is a jar containing the wrapper entry point
pub fn verify_wrapper_jar(bytes: &[u8]) -> Result<(), ScaffoldError> {
    let corrupt = |detail: String| ScaffoldError::ExternalTool {
        message: format!("Downloaded gradle-wrapper.jar is not usable: {}", detail),
        hint: "Check the download URL, or run `gradle wrapper` in the project to generate it"
            .to_string(),
    };

    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| corrupt(format!("not a jar ({})", e)))?;
    archive
        .by_name(WRAPPER_MAIN_CLASS)
        .map(|_| ())
        .map_err(|_| corrupt(format!("missing {}", WRAPPER_MAIN_CLASS)))
}

/// Fetch the wrapper jar
pub async fn download_wrapper_jar(client: &reqwest::Client, url: &Url) -> Result<Vec<u8>, ScaffoldError> {
    let failed = |detail: String| ScaffoldError::ExternalTool {
        message: format!("Failed to download gradle-wrapper.jar from {}: {}", url, detail),
        hint: format!(
            "Check your network connection, set {} to a reachable mirror, or run `gradle wrapper` in the project",
            crate::config::WRAPPER_JAR_URL_ENV
        ),
    };

    debug!(%url, "downloading wrapper jar");
    let response = client
        .get(url.clone())
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .await
        .map_err(|e| failed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Install the wrapper under `root`, keeping any files that already exist
pub async fn materialize(
    root: &Path,
    config: &ScaffoldConfig,
    store: &TemplateStore,
    client: &reqwest::Client,
) -> Result<WrapperReport, ScaffoldError> {
    let mut report = WrapperReport::default();

    let written = write_if_missing(
        &root.join(PROPERTIES_PATH),
        wrapper_properties(&config.distribution_url).as_bytes(),
    )?;
    report.record(PROPERTIES_PATH, written);

    let jar = root.join(JAR_PATH);
    if jar.exists() {
        report.record(JAR_PATH, false);
    } else {
        let bytes = download_wrapper_jar(client, &config.wrapper_jar_url).await?;
        verify_wrapper_jar(&bytes)?;
        atomic_write(&jar, &bytes)?;
        info!(bytes = bytes.len(), "installed gradle-wrapper.jar");
        report.record(JAR_PATH, true);
    }

    for launcher in LAUNCHERS {
        let path = root.join(launcher);
        let written = if path.exists() {
            false
        } else {
            write_if_missing(&path, &store.load(launcher)?)?
        };
        if *launcher == "gradlew" {
            set_executable(&path)?;
        }
        report.record(launcher, written);
    }

    Ok(report)
}
