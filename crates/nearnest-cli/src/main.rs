//! Terminal client for NearNest.

mod commands;
mod config;
mod geo;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use nearnest_store::{BlockList, LocalStore};
use uuid::Uuid;

use commands::App;
use config::Settings;

#[derive(Parser)]
#[command(name = "nearnest")]
#[command(about = "Anonymous chat with people nearby", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configuration and sign-in state
    Status,
    /// Email a one-time sign-in code
    Login {
        #[arg(short, long)]
        email: String,
    },
    /// Sign in with the emailed code
    Verify {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        code: String,
    },
    /// Sign in without an email address
    Anon,
    /// Sign out on this device
    Signout,
    /// Create your profile
    Setup {
        /// Pick a handle instead of getting a generated one
        #[arg(long)]
        handle: Option<String>,
    },
    /// Set your (rounded) location
    Locate {
        #[arg(long, env = "NEARNEST_LAT", allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, env = "NEARNEST_LON", allow_negative_numbers = true)]
        lon: Option<f64>,
    },
    /// Open the nearby message feed
    Chat,
    /// List other users, most recently seen first
    Users,
    /// Open a direct conversation
    Dm {
        /// Id of the other user, from 'nearnest users'
        user_id: Uuid,
    },
    /// List handles blocked on this device
    Blocked,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nearnest=info,nearnest_client=info,nearnest_api=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();
    let store = Arc::new(LocalStore::open_or_memory(&settings.store_path));

    match cli.command {
        Commands::Status => commands::status::run(settings, store).await?,
        Commands::Blocked => commands::users::blocked(&BlockList::load(store)),
        command => {
            let mut app = App::connect(settings, store).await?;
            match command {
                Commands::Login { email } => commands::auth::login(&app, &email).await?,
                Commands::Verify { email, code } => commands::auth::verify(&mut app, &email, &code).await?,
                Commands::Anon => commands::auth::anonymous(&mut app).await?,
                Commands::Signout => commands::auth::sign_out(&mut app).await?,
                Commands::Setup { handle } => commands::onboarding::setup(&mut app, handle).await?,
                Commands::Locate { lat, lon } => commands::onboarding::locate(&mut app, lat, lon).await?,
                Commands::Chat => commands::chat::feed(&mut app).await?,
                Commands::Users => commands::users::list(&app).await?,
                Commands::Dm { user_id } => commands::chat::direct(&mut app, user_id).await?,
                Commands::Status | Commands::Blocked => {}
            }
        }
    }

    Ok(())
}
