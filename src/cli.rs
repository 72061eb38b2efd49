//! Command-line arguments

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "zaplap-chat", about = "Conversational shopping assistant for the Zaplap store")]
pub struct Cli {
    /// Path to the configuration file (without extension)
    #[arg(long, env = "ZAPLAP_CONFIG")]
    pub config: Option<String>,

    /// Override the listen host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port
    #[arg(long)]
    pub port: Option<u16>,
}
