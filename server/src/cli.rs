use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(about = "Find the wind turbine nearest to an address.")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the front-end and the /calculate API
    Http {
        #[arg(env = "TURBINE_SERVER_ADDRESS", default_value = "127.0.0.1:5000")]
        address: std::net::SocketAddr,
    },
    /// Look up a single address and print the JSON response
    Locate {
        #[arg(required = true, num_args = 1..)]
        address: Vec<String>,
    },
    /// Load the turbine dataset and report how many turbines it holds
    Check,
}
