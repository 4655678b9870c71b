//! Locating and launching Chrome for head reads and writes
//!
//! Lookup order: `browser.executable`, the `CHROMIUM_PATH` environment
//! variable, well-known install locations, `PATH`, and finally a managed
//! Chromium download when `browser.download` is on.

use anyhow::{Context, Result, bail};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::BrowserConfig;
use crate::utils::constants::{CHROME_USER_AGENT, MANAGED_BROWSER_CACHE_DIR};

/// Executable names searched for on `PATH`, in order
const PATH_COMMANDS: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Flags that keep a throwaway profile quiet
const QUIET_FLAGS: &[&str] = &[
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-extensions",
    "--disable-notifications",
    "--disable-background-networking",
    "--password-store=basic",
    "--use-mock-keychain",
    "--mute-audio",
];

/// Handler errors for CDP messages chromiumoxide cannot decode
///
/// Chrome emits events newer than the bundled protocol definitions; none of
/// them matter for head reads and writes.
const UNDECODABLE_MESSAGE_ERRORS: &[&str] = &[
    "data did not match any variant of untagged enum Message",
    "Failed to deserialize WS response",
];

/// Where the Chrome executable came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeSource {
    Configured,
    Environment,
    Installed,
    SearchPath,
    Downloaded,
}

/// Find a Chrome executable, downloading one if allowed
pub async fn locate_chrome(config: &BrowserConfig) -> Result<(PathBuf, ChromeSource)> {
    if let Some(path) = &config.executable {
        if path.is_file() {
            return Ok((path.clone(), ChromeSource::Configured));
        }
        bail!("browser.executable does not exist: {}", path.display());
    }

    if let Some(path) = std::env::var_os("CHROMIUM_PATH").map(PathBuf::from) {
        if path.is_file() {
            return Ok((path, ChromeSource::Environment));
        }
        warn!("Ignoring CHROMIUM_PATH, no such file: {}", path.display());
    }

    if let Some(path) = install_locations().into_iter().find(|p| p.is_file()) {
        return Ok((path, ChromeSource::Installed));
    }

    if let Some(path) = std::env::var_os("PATH").and_then(|paths| find_on_path(&paths)) {
        return Ok((path, ChromeSource::SearchPath));
    }

    if !config.download {
        bail!("No Chrome/Chromium found and browser.download is off");
    }
    Ok((download_chromium().await?, ChromeSource::Downloaded))
}

fn install_locations() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if cfg!(target_os = "windows") {
        let roots = [std::env::var_os("ProgramFiles"), std::env::var_os("ProgramFiles(x86)")]
            .into_iter()
            .flatten()
            .map(PathBuf::from)
            .chain(dirs::data_local_dir());
        for root in roots {
            paths.push(root.join(r"Google\Chrome\Application\chrome.exe"));
            paths.push(root.join(r"Chromium\Application\chrome.exe"));
        }
    } else if cfg!(target_os = "macos") {
        let app_dirs = std::iter::once(PathBuf::from("/Applications"))
            .chain(dirs::home_dir().map(|home| home.join("Applications")));
        for dir in app_dirs {
            paths.push(dir.join("Google Chrome.app/Contents/MacOS/Google Chrome"));
            paths.push(dir.join("Chromium.app/Contents/MacOS/Chromium"));
        }
    } else {
        paths.push(PathBuf::from("/opt/google/chrome/chrome"));
        paths.push(PathBuf::from("/snap/bin/chromium"));
    }

    paths
}

/// First `PATH_COMMANDS` entry present in any directory of `paths`
fn find_on_path(paths: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(paths)
        .flat_map(|dir| PATH_COMMANDS.iter().map(move |cmd| dir.join(cmd)))
        .find(|candidate| candidate.is_file())
}

async fn download_chromium() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(MANAGED_BROWSER_CACHE_DIR);
    tokio::fs::create_dir_all(&cache_dir)
        .await
        .with_context(|| format!("Failed to create {}", cache_dir.display()))?;

    info!("Downloading Chromium into {}", cache_dir.display());
    let options = BrowserFetcherOptions::builder()
        .with_path(&cache_dir)
        .build()
        .context("Invalid Chromium fetcher options")?;
    let installed = BrowserFetcher::new(options)
        .fetch()
        .await
        .context("Chromium download failed")?;

    Ok(installed.executable_path)
}

/// Chrome sandboxing unless turned off by config or by running in a container
pub fn sandbox_enabled(config: &BrowserConfig) -> bool {
    if config.disable_security {
        return false;
    }
    // setuid sandboxing does not work inside containers
    config.sandbox.unwrap_or_else(|| !in_container())
}

fn in_container() -> bool {
    Path::new("/.dockerenv").exists()
        || std::env::var_os("container").is_some()
        || std::env::var_os("KUBERNETES_SERVICE_HOST").is_some()
}

/// Command-line flags for a launch with `config`; `extra_args` come last
pub fn chrome_args(config: &BrowserConfig) -> Vec<String> {
    let user_agent = config.user_agent.as_deref().unwrap_or(CHROME_USER_AGENT);
    let mut args = vec![format!("--user-agent={user_agent}")];
    args.extend(QUIET_FLAGS.iter().map(|flag| flag.to_string()));

    if config.disable_security {
        args.push("--disable-web-security".into());
        args.push("--ignore-certificate-errors".into());
    }
    if !sandbox_enabled(config) {
        args.push("--no-sandbox".into());
        args.push("--disable-setuid-sandbox".into());
    }

    args.extend(config.extra_args.iter().cloned());
    args
}

fn is_undecodable_message(error: &str) -> bool {
    UNDECODABLE_MESSAGE_ERRORS
        .iter()
        .any(|pattern| error.contains(pattern))
}

/// Launch Chrome with `profile_dir` as its user data directory
///
/// Returns the browser and the task draining its CDP event handler.
pub async fn launch_chrome(
    config: &BrowserConfig,
    profile_dir: &Path,
) -> Result<(Browser, JoinHandle<()>)> {
    let (executable, source) = locate_chrome(config).await?;
    info!("Launching Chrome {} ({:?})", executable.display(), source);

    if config.disable_security {
        warn!("Web security is disabled for this browser session");
    }

    let mut builder = BrowserConfigBuilder::default()
        .chrome_executable(executable)
        .user_data_dir(profile_dir)
        .window_size(config.window.width, config.window.height)
        .request_timeout(Duration::from_millis(config.navigation_timeout_ms))
        .args(chrome_args(config));
    builder = if config.headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };

    let browser_config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid browser config: {e}"))?;
    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("Failed to launch Chrome")?;

    let events = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            match event {
                Ok(()) => {}
                Err(e) if is_undecodable_message(&e.to_string()) => {
                    trace!("Ignored undecodable CDP message: {e}");
                }
                Err(e) => error!("Browser handler error: {e:?}"),
            }
        }
        debug!("Browser event handler finished");
    });

    Ok((browser, events))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BrowserConfig {
        BrowserConfig {
            sandbox: Some(true),
            ..BrowserConfig::default()
        }
    }

    #[test]
    fn sandbox_follows_explicit_setting() {
        let args = chrome_args(&config());
        assert!(!args.iter().any(|a| a == "--no-sandbox"));

        let args = chrome_args(&BrowserConfig {
            sandbox: Some(false),
            ..config()
        });
        assert!(args.iter().any(|a| a == "--no-sandbox"));
    }

    #[test]
    fn disabled_security_also_drops_sandbox() {
        let insecure = BrowserConfig {
            disable_security: true,
            ..config()
        };
        assert!(!sandbox_enabled(&insecure));
        let args = chrome_args(&insecure);
        assert!(args.iter().any(|a| a == "--disable-web-security"));
        assert!(args.iter().any(|a| a == "--no-sandbox"));
    }

    #[test]
    fn user_agent_override_and_extra_args_order() {
        let args = chrome_args(&BrowserConfig {
            user_agent: Some("FitflixBot/1.0".into()),
            extra_args: vec!["--lang=en-IN".into()],
            ..config()
        });
        assert_eq!(args.first().map(String::as_str), Some("--user-agent=FitflixBot/1.0"));
        assert_eq!(args.last().map(String::as_str), Some("--lang=en-IN"));
    }

    #[test]
    fn undecodable_messages_are_recognized() {
        assert!(is_undecodable_message(
            "data did not match any variant of untagged enum Message at line 1"
        ));
        assert!(!is_undecodable_message("Websocket closed"));
    }

    #[test]
    fn path_search_finds_first_known_command() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_on_path(dir.path().as_os_str()), None);

        let chromium = dir.path().join("chromium");
        std::fs::write(&chromium, "").unwrap();
        assert_eq!(find_on_path(dir.path().as_os_str()), Some(chromium));
    }

    #[tokio::test]
    async fn configured_executable_wins() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let (path, source) = locate_chrome(&BrowserConfig {
            executable: Some(file.path().to_path_buf()),
            ..config()
        })
        .await
        .unwrap();
        assert_eq!(path.as_path(), file.path());
        assert_eq!(source, ChromeSource::Configured);

        let missing = BrowserConfig {
            executable: Some(PathBuf::from("/nonexistent/fitflix-chrome")),
            ..config()
        };
        assert!(locate_chrome(&missing).await.is_err());
    }
}
