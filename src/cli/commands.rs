use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "maxcrm", version, about = "Max CRM backend and AI operator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve,

    /// Enter interactive terminal chat with Max
    Chat {
        #[arg(long, default_value = "tenant-A")]
        tenant: String,

        #[arg(long, default_value = "dev-user")]
        user: String,

        /// Session id within the tenant+user scope
        #[arg(long, default_value = "default")]
        session: String,
    },

    /// Inspect chat sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// List sessions for a tenant
    List {
        #[arg(long, default_value = "tenant-A")]
        tenant: String,
    },

    /// Print a session transcript
    Show {
        #[arg(long, default_value = "tenant-A")]
        tenant: String,

        #[arg(long, default_value = "dev-user")]
        user: String,

        #[arg(long, default_value = "default")]
        session: String,
    },
}
