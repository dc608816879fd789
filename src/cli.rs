use clap::{Parser, Subcommand};
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(name = "quotelist")]
#[command(about = "Merged listing of stored quote documents", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Server(ServerArgs),
    /// Fetch one merged page and print it as JSON
    List(ListArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (defaults to server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Page size per partition
    #[arg(long)]
    pub per: Option<String>,

    /// Continuation token from a previous page
    #[arg(long, default_value = "")]
    pub next: String,

    /// List the whole folder instead of prefix-matching names
    #[arg(long)]
    pub no_prefix: bool,

    /// Base URL for item links (defaults to listing.site_base_url)
    #[arg(long)]
    pub base_url: Option<String>,
}
