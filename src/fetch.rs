// src/fetch.rs

//! Page fetching with proxy and identity rotation.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};

use crate::config::CrawlerConfig;
use crate::error::{AppError, Result};

/// Fetches one page body by URL.
///
/// Seam between the crawl controller and the network; tests substitute a
/// scripted implementation. Failures worth retrying must surface as
/// [`AppError::Transient`] so the controller's retry policy can tell them
/// apart from permanent errors.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// reqwest-backed fetcher.
///
/// Keeps one client per configured proxy (or a single direct client when
/// the pool is empty) and picks a client plus a user-agent at random for
/// every request, independently of earlier choices.
pub struct HttpFetcher {
    clients: Vec<Client>,
    user_agents: Vec<String>,
}

impl HttpFetcher {
    /// Build a fetcher from the crawler configuration.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut clients = Vec::new();

        if config.proxies.is_empty() {
            clients.push(Client::builder().timeout(timeout).build()?);
        } else {
            for proxy_url in &config.proxies {
                let proxy = reqwest::Proxy::all(proxy_url)?;
                clients.push(Client::builder().timeout(timeout).proxy(proxy).build()?);
            }
        }

        Ok(Self {
            clients,
            user_agents: config.user_agents.clone(),
        })
    }

    /// Rotated (client, user-agent) pair for one request.
    fn pick_identity(&self) -> (&Client, Option<&str>) {
        let mut rng = rand::rng();
        let client = self
            .clients
            .choose(&mut rng)
            .expect("fetcher has at least one client");
        let agent = self.user_agents.choose(&mut rng).map(String::as_str);
        (client, agent)
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<String, reqwest::Error> {
        let (client, agent) = self.pick_identity();
        let mut request = client.get(url);
        if let Some(agent) = agent {
            request = request.header(USER_AGENT, agent);
        }
        let response = request.send().await?.error_for_status()?;
        response.text().await
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        match self.fetch_once(url).await {
            Ok(body) => Ok(body),
            Err(e) if is_transient(&e) => Err(AppError::Transient(e.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

/// Whether a request failure is worth retrying.
fn is_transient(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_connect() {
        return true;
    }
    err.status()
        .is_some_and(|s| s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS)
}
