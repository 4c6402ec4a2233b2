use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use bookmark_profile_switcher::{
    ChromiumBookmarkStore, JsonFileKeyValueStore, ProfileLayout, ProfileService, SwitcherConfig,
};

type Service = ProfileService<ChromiumBookmarkStore, JsonFileKeyValueStore>;

#[derive(Parser)]
#[command(name = "bookmark-profile-switcher")]
#[command(about = "Swap named bookmark profiles in and out of the bookmarks bar", long_about = None)]
#[command(version)]
struct Cli {
    /// Chromium `Bookmarks` file to operate on
    #[arg(long, global = true, env = "BOOKMARK_PROFILES_FILE")]
    bookmarks_file: Option<PathBuf>,

    /// State file holding the active profile id
    #[arg(long, global = true, env = "BOOKMARK_PROFILES_STATE")]
    state_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all profiles, marking the active one
    List,

    /// Create a new, empty profile
    Create {
        /// Profile name
        name: String,
    },

    /// Show the active profile
    Active,

    /// Switch the bookmarks bar to another profile
    Switch {
        /// Profile id or exact profile name
        profile: String,
    },

    /// Show the bookmarks bar contents and the active profile
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SwitcherConfig::new(cli.bookmarks_file, cli.state_file, ProfileLayout::default())?;
    info!("📖 Using bookmarks file {:?}", config.bookmarks_file);

    let store = Arc::new(ChromiumBookmarkStore::open(&config.bookmarks_file)?);
    let kv = Arc::new(JsonFileKeyValueStore::open(&config.state_file)?);
    let service = ProfileService::new(store, kv, config.layout.clone());

    match cli.command {
        Commands::List => {
            print_profiles(&service).await?;
        }

        Commands::Create { name } => {
            let profile = service.create_profile(Some(name.as_str())).await?;
            info!("✅ Created profile '{}' ({})", profile.title, profile.id);
            print_profiles(&service).await?;
        }

        Commands::Active => {
            let overview = service.overview().await?;
            match overview.active_profile() {
                Some(profile) => println!("{}\t{}", profile.id, profile.title),
                None => println!("{}", overview.active_profile_id),
            }
        }

        Commands::Switch { profile } => {
            let Some(target) = service.find_profile(&profile).await? else {
                bail!("No profile with id or name '{}'", profile);
            };
            info!("🔄 Switching to profile '{}' ({})", target.title, target.id);
            let report = service.switch_to(&target.id).await?;
            println!(
                "Switched {} -> {}: {} bookmarks parked, {} bookmarks loaded",
                report.from, report.to, report.evacuated, report.imported
            );
        }

        Commands::Status => {
            let overview = service.overview().await?;
            let bar = service.bar_contents().await?;
            let active = overview
                .active_profile()
                .map(|p| p.title.as_str())
                .unwrap_or("?");
            println!("Active profile: {} ({})", active, overview.active_profile_id);
            println!("Bookmarks bar ({} items):", bar.len());
            for node in &bar {
                match &node.url {
                    Some(url) => println!("  • {} <{}>", node.title, url),
                    None => println!("  📁 {}", node.title),
                }
            }
        }
    }

    Ok(())
}

async fn print_profiles(service: &Service) -> Result<()> {
    let overview = service.overview().await?;
    for profile in &overview.profiles {
        let marker = if profile.id == overview.active_profile_id {
            "*"
        } else {
            " "
        };
        println!("{} {}\t{}", marker, profile.id, profile.title);
    }
    Ok(())
}
