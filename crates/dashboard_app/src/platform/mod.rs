mod app;
mod config;
mod effects;
mod logging;
mod ui;

use std::path::PathBuf;

use clap::Parser;

pub use app::run_app;
use logging::LogDestination;

/// Terminal dashboard for the URL crawl service.
#[derive(Debug, Parser)]
#[command(name = "crawl-dash", version, about)]
pub struct Args {
    /// Config file (RON). Missing file means defaults.
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// API base URL, overrides the config file and CRAWL_DASH_BASE_URL.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Initial page, e.g. `/` or `/detail/4`.
    #[arg(long, default_value = "/")]
    pub route: String,

    #[arg(long, value_enum, default_value_t = LogDestination::File)]
    pub log_to: LogDestination,
}
