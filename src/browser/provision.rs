// src/browser/provision.rs
//! Best-effort check that a WebDriver engine is listening before a live run.
//! Nothing here is fatal: a missing engine shows up later as a connection error.

use std::time::Duration;

use tokio::process::{Child, Command};

use crate::browser::BrowserConfig;

const STATUS_TIMEOUT: Duration = Duration::from_secs(3);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);
const READY_POLL_ATTEMPTS: u32 = 20;

/// Ensures a WebDriver server answers at `config.webdriver_url`, launching
/// `config.chromedriver` when one is configured and none is ready.
/// The returned child (if any) is killed when dropped.
pub async fn ensure_engine(config: &BrowserConfig) -> Option<Child> {
    let client = match reqwest::Client::builder().timeout(STATUS_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("Could not build HTTP client for engine status check: {}", e);
            return None;
        }
    };

    if engine_ready(&client, &config.webdriver_url).await {
        tracing::info!("WebDriver engine ready at {}", config.webdriver_url);
        return None;
    }

    let Some(binary) = &config.chromedriver else {
        tracing::warn!(
            "No WebDriver engine answering at {} and no driver binary configured",
            config.webdriver_url
        );
        return None;
    };

    let Some(port) = webdriver_port(&config.webdriver_url) else {
        tracing::warn!("Cannot derive a port from {}", config.webdriver_url);
        return None;
    };

    tracing::info!("Launching {} on port {}", binary.display(), port);
    let child = match Command::new(binary)
        .arg(format!("--port={}", port))
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!("Failed to launch {}: {}", binary.display(), e);
            return None;
        }
    };

    for _ in 0..READY_POLL_ATTEMPTS {
        tokio::time::sleep(READY_POLL_INTERVAL).await;
        if engine_ready(&client, &config.webdriver_url).await {
            tracing::info!("WebDriver engine ready at {}", config.webdriver_url);
            return Some(child);
        }
    }

    tracing::warn!("Launched driver did not report ready; continuing anyway");
    Some(child)
}

/// True when `{webdriver_url}/status` reports `value.ready == true`.
async fn engine_ready(client: &reqwest::Client, webdriver_url: &str) -> bool {
    let url = format!("{}/status", webdriver_url.trim_end_matches('/'));
    let response = match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            tracing::debug!("Engine status returned {}", response.status());
            return false;
        }
        Err(e) => {
            tracing::debug!("Engine status check failed: {}", e);
            return false;
        }
    };

    match response.json::<serde_json::Value>().await {
        Ok(body) => status_is_ready(&body),
        Err(e) => {
            tracing::debug!("Engine status body unreadable: {}", e);
            false
        }
    }
}

fn status_is_ready(body: &serde_json::Value) -> bool {
    body.pointer("/value/ready")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

fn webdriver_port(webdriver_url: &str) -> Option<u16> {
    reqwest::Url::parse(webdriver_url).ok()?.port_or_known_default()
}
