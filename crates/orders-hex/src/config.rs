use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::time::Duration;

pub const DEFAULT_LIST_PAGE_SIZE: u64 = 50;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub redis_url: Option<String>,
    pub store_timeout: Option<Duration>,
    pub list_page_size: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "3000".into());
        let redis_url = env::var("REDIS_URL").ok();
        let store_timeout = match env::var("STORE_TIMEOUT_MS").ok() {
            Some(ms) => Some(Duration::from_millis(
                ms.parse().context("STORE_TIMEOUT_MS must be an integer")?,
            )),
            None => None,
        };
        let list_page_size = match env::var("LIST_PAGE_SIZE").ok() {
            Some(size) => size.parse().context("LIST_PAGE_SIZE must be an integer")?,
            None => DEFAULT_LIST_PAGE_SIZE,
        };
        Ok(Self {
            server_port,
            redis_url,
            store_timeout,
            list_page_size,
        })
    }
}
