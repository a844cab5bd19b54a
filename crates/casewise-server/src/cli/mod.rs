use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for the `casewise` binary.
#[derive(Debug, Parser)]
#[command(
    name = "casewise",
    version,
    about = "Casewise - rehabilitation case management service"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve(ServeArgs),
    /// Print registered JSON schemas
    Schema(SchemaArgs),
}

/// Overrides applied on top of the loaded configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Address to bind (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Database file (overrides database.path)
    #[arg(short, long)]
    pub database: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct SchemaArgs {
    /// Schema to print; lists all names when omitted
    pub name: Option<String>,
}
