mod cli;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands, ListArgs};
use quotelist::config::Config;
use quotelist::listing::{Lister, PageRequest, PageSize};
use quotelist::observability::{self, Metrics};
use quotelist::provider::{HttpConfig, SearchClient};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    observability::init_tracing();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Server(args) => quotelist::api::run(config, args.address).await?,
        Commands::List(args) => list_once(config, args).await?,
    }

    Ok(())
}

async fn list_once(config: Config, args: ListArgs) -> Result<(), AnyError> {
    let credentials = config.provider.credentials()?;
    let client = SearchClient::new(HttpConfig::from(&config.provider))?;
    let lister = Lister::new(
        Arc::new(client),
        config.listing.options(),
        Arc::new(Metrics::new()),
    );

    let request = PageRequest {
        token: args.next,
        page_size: PageSize::parse(
            args.per.as_deref(),
            config.listing.default_page_size,
            config.listing.max_page_size,
        ),
        prefix_filter: !args.no_prefix,
        base_url: args
            .base_url
            .or(config.listing.site_base_url)
            .unwrap_or_default(),
    };

    let page = lister.list_page(&credentials, &request).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);

    Ok(())
}
