use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "storefront", version, about = "Storefront session and deep-link host")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to load instead of ~/.storefront/config.toml / ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Override `storage.data_dir`.
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Use process-local stores (nothing is persisted).
    #[arg(long, global = true, default_value_t = false)]
    pub memory: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect or modify persisted session state.
    #[command(subcommand)]
    Session(SessionCommand),
    /// Parse, simulate and test deep links.
    #[command(subcommand)]
    Link(LinkCommand),
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Run the startup bootstrap and print the resulting state.
    Show,
    Login(LoginArgs),
    Logout,
    SetTheme {
        theme: String,
    },
    Notifications {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    AddCart(AddCartArgs),
    /// Remove theme, notification and cart preferences.
    Clear,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct LoginArgs {
    #[arg(long)]
    pub user_id: String,

    #[arg(long)]
    pub token: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AddCartArgs {
    pub product_id: String,

    #[arg(long, default_value_t = 1)]
    pub quantity: u32,
}

#[derive(Subcommand, Debug)]
pub enum LinkCommand {
    /// Parse and validate a single URL without dispatching it.
    Parse { url: String },
    Simulate(SimulateArgs),
    /// Open a URL through the link opener and report whether it was handled.
    Test { url: String },
}

/// Drive a router with a scripted sequence of platform events and print
/// every event delivered to the listener as a JSON line.
#[derive(ClapArgs, Debug, Clone)]
pub struct SimulateArgs {
    /// Launch URI (cold start).
    #[arg(long)]
    pub initial: Option<String>,

    /// Add-to-cart intents raised before any listener exists.
    #[arg(long = "pending", action = clap::ArgAction::Append)]
    pub pending: Vec<String>,

    /// Emit a foreground-resume signal after the URLs.
    #[arg(long, default_value_t = false)]
    pub resume: bool,

    /// URIs delivered while running (warm start).
    pub urls: Vec<String>,
}
