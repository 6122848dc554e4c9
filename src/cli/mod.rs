//! CLI for inspecting applets.
//!
//! Fetches the applet list once, from the CMP API or a local file, and
//! prints what the registry resolves as JSON.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use crate::applets::{AppletApi, AppletIndex, AppletStore, FetchOptions, FileAppletApi, HttpAppletApi};
use crate::config::Config;

#[derive(Parser)]
#[command(name = "cmp-applets")]
#[command(about = "Inspect CMP applets and where they render", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: <config dir>/cmp-applets/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Target application namespace (e.g. 'cui', 'hui')
    #[arg(long, short)]
    pub target: Option<String>,

    /// CMP base URL to fetch applets from
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Local JSON applet list, used instead of the API
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List the applets that render at a page and area
    Resolve {
        page: String,
        area: String,

        /// Only applets with this id or name
        #[arg(long)]
        filter: Option<String>,
    },

    /// List the stylesheet URLs of the enabled applets
    Styles,

    /// Show one applet by id
    Show { id: String },

    /// Dump the page/area index for the target application
    Index,
}

enum Source {
    File(FileAppletApi),
    Http(HttpAppletApi),
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<Config> {
        match self.config {
            Some(ref path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display())),
            None => Ok(Config::load()),
        }
    }

    fn source(&self, config: &Config) -> anyhow::Result<Source> {
        if let Some(ref file) = self.file {
            return Ok(Source::File(FileAppletApi::new(file)));
        }
        if let Some(ref url) = self.url {
            return Ok(Source::Http(with_token(HttpAppletApi::new(url), config)));
        }
        if let Some(file) = config.applets.applets_file_path() {
            return Ok(Source::File(FileAppletApi::new(file)));
        }
        if let Some(ref url) = config.applets.api_url {
            return Ok(Source::Http(with_token(HttpAppletApi::new(url), config)));
        }
        bail!("No applet source: pass --file or --url, or set applets.api_url in the config")
    }
}

fn with_token(api: HttpAppletApi, config: &Config) -> HttpAppletApi {
    match config.applets.api_token {
        Some(ref token) => api.with_token(token.clone()),
        None => api,
    }
}

async fn fetch<A: AppletApi>(store: &AppletStore, api: &A, options: &FetchOptions) -> anyhow::Result<()> {
    store.fetch_applets(api, None, options).await;
    match store.last_error() {
        Some(err) => Err(anyhow!("{}", err)),
        None => Ok(()),
    }
}

/// Run a command against a loaded store.
pub fn execute(store: &AppletStore, command: &Commands) -> anyhow::Result<Value> {
    match command {
        Commands::Resolve { page, area, filter } => {
            let applets = store.get_applets_for_target(page, area, filter.as_deref())?;
            Ok(serde_json::to_value(
                applets.iter().map(|applet| applet.as_ref()).collect::<Vec<_>>(),
            )?)
        }
        Commands::Styles => Ok(json!(store.applets_css_hrefs())),
        Commands::Show { id } => {
            let applet = store
                .get_applet(id)
                .ok_or_else(|| crate::applets::AppletError::AppletNotFound(id.clone()))?;
            Ok(serde_json::to_value(applet.as_ref())?)
        }
        Commands::Index => {
            let index = store.applets_index()?;
            Ok(index_summary(&index))
        }
    }
}

/// Page -> { areas: { area -> [id] }, configured: [id] }, sorted by name.
fn index_summary(index: &AppletIndex) -> Value {
    let pages: BTreeMap<&str, Value> = index
        .pages()
        .map(|(page, targets)| {
            let areas: BTreeMap<&str, Vec<&str>> = targets
                .area_names()
                .map(|area| {
                    let ids = targets.area(area).iter().map(|a| a.id.as_str()).collect();
                    (area, ids)
                })
                .collect();
            let configured: Vec<&str> = targets.configured().iter().map(|a| a.id.as_str()).collect();
            (page, json!({ "areas": areas, "configured": configured }))
        })
        .collect();
    json!(pages)
}

/// Parse arguments, fetch the applets and print the command's result.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    let target = cli
        .target
        .clone()
        .unwrap_or_else(|| config.applets.target_application.clone());
    let store = AppletStore::new(target);
    let options = FetchOptions::from(&config.messages);

    match cli.source(&config)? {
        Source::File(api) => fetch(&store, &api, &options).await?,
        Source::Http(api) => fetch(&store, &api, &options).await?,
    }

    let output = execute(&store, &cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
