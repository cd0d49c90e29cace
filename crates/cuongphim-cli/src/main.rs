use clap::{ArgAction, Parser, Subcommand};
use commands::{auth, context, list, maintenance, sync, toggle};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "cuongphim")]
#[command(about = "Thế Giới Cuồng Phim - manage your saved movies and series from the terminal")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and pull your watchlist from the server
    Login {
        /// Account email (prompted if omitted)
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: Option<String>,

        /// Display name
        #[arg(long)]
        name: Option<String>,
    },
    /// Sign out (the local watchlist is kept)
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show the saved-media collection
    List {
        /// Read the legacy favorites endpoint instead of the local collection
        #[arg(long, action = ArgAction::SetTrue)]
        legacy: bool,
    },
    /// Save an item, or remove it if already saved
    #[command(long_about = "Toggle an item in the saved-media collection. Signed in, the server decides the new state; as a guest the change is local only.")]
    Toggle {
        /// Backend movie id (required when signed in)
        #[arg(long)]
        id: Option<u64>,

        #[arg(long)]
        slug: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        year: Option<u32>,

        #[arg(long)]
        quality: Option<String>,

        #[arg(long)]
        thumb_url: Option<String>,

        #[arg(long)]
        poster_url: Option<String>,
    },
    /// Replace the local collection with the server's
    Sync,
    /// Run the one-time favorites/watchlist migration now
    Migrate,
    /// Delete the favorites backup if its retention window has passed
    CleanupBackup,
    /// Clear local data
    Clear {
        /// Clear the collection and the credential
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["collection", "credentials"])]
        all: bool,

        /// Clear the local saved-media collection
        #[arg(long, action = ArgAction::SetTrue)]
        collection: bool,

        /// Clear the stored credential
        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let (paths, config) = context::load_config()?;
    let log_file = config.logging.to_file.then(|| paths.log_file());
    logging::init_logging(cli.verbose, cli.quiet, &config.logging.level, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Login { email } => auth::run_login(paths, config, email, &output).await,
        Commands::Register { email, name } => auth::run_register(paths, config, email, name, &output).await,
        Commands::Logout => auth::run_logout(paths, config, &output).await,
        Commands::Whoami => auth::run_whoami(paths, config, &output).await,
        Commands::List { legacy } => list::run_list(paths, config, legacy, &output).await,
        Commands::Toggle {
            id,
            slug,
            name,
            year,
            quality,
            thumb_url,
            poster_url,
        } => {
            let item = toggle::build_item(id, slug, name, year, quality, thumb_url, poster_url);
            toggle::run_toggle(paths, config, item, &output).await
        }
        Commands::Sync => sync::run_sync(paths, config, &output).await,
        Commands::Migrate => maintenance::run_migrate(paths, config, &output).await,
        Commands::CleanupBackup => maintenance::run_cleanup_backup(paths, config, &output).await,
        Commands::Clear { all, collection, credentials } => {
            maintenance::run_clear(paths, config, all, collection, credentials, &output).await
        }
    }
}
