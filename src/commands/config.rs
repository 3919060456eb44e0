use anyhow::Result;
use log::debug;
use reqwest::Client;

use std::path::PathBuf;

use crate::{
    catalog::{Catalog, RemoteCatalog},
    download::Fetcher,
    http::HttpClient,
    paths::NymPaths,
    platform::Platform,
    runtime::Runtime,
};

/// User agent sent with every catalog and download request.
pub const USER_AGENT: &str = "nym-cli";

pub struct Config<R: Runtime, C: Catalog> {
    pub runtime: R,
    pub catalog: C,
    pub fetcher: Fetcher,
    pub paths: NymPaths,
    pub platform: Platform,
}

impl<R: Runtime> Config<R, RemoteCatalog> {
    pub fn new(runtime: R, install_root: Option<PathBuf>, mirror: Option<String>) -> Result<Self> {
        let paths = NymPaths::resolve(&runtime, install_root)?;

        let client = Client::builder().user_agent(USER_AGENT).build()?;
        let catalog = RemoteCatalog::new(HttpClient::new(client.clone()), mirror);
        debug!("Using mirror: {}", catalog.mirror());
        let fetcher = Fetcher::new(HttpClient::new(client));

        Ok(Self {
            runtime,
            catalog,
            fetcher,
            paths,
            platform: Platform::detect(),
        })
    }
}
