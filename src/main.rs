use baby_diary::{AppConfig, AppError, DiaryStore};
use clap::{Parser, Subcommand};
use diary_client::{CancellationToken, DiaryApiClient, PhotoFile};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "baby-diary", version, about = "Attach photos to baby diary entries")]
struct Cli {
    /// Path to the TOML configuration
    #[arg(long, default_value = "baby-diary.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a photo to a diary entry
    Upload {
        #[arg(long)]
        diary_id: i64,
        /// Image file to upload
        file: PathBuf,
        /// Local diary snapshot to merge the new photos into
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Show the diaries held in the local snapshot
    List {
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

fn snapshot_path(arg: Option<PathBuf>, config: &AppConfig) -> Option<PathBuf> {
    arg.or_else(|| config.snapshot_path.as_ref().map(PathBuf::from))
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::load_or_default(&cli.config)?;
    let store = DiaryStore::new();

    match cli.command {
        Command::Upload {
            diary_id,
            file,
            snapshot,
        } => {
            let snapshot = snapshot_path(snapshot, &config);
            if let Some(path) = snapshot.as_ref().filter(|p| p.exists()) {
                store.load_snapshot(path)?;
            }

            let client = DiaryApiClient::new(config.api.clone())?;
            log::debug!("Using API at {}", client.config().base_url);
            let photo = PhotoFile::from_path(&file).await?;

            let token = CancellationToken::new();
            let interrupt = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("Interrupted, cancelling upload");
                    interrupt.cancel();
                }
            });

            let records = store
                .upload_photo_cancellable(&client, diary_id, photo, &token)
                .await?;
            println!("{}", serde_json::to_string_pretty(&records)?);

            if let Some(path) = snapshot {
                store.save_snapshot(&path)?;
            }
        }
        Command::List { snapshot } => {
            let path = snapshot_path(snapshot, &config)
                .ok_or_else(|| AppError::Config("No snapshot path configured".to_string()))?;
            store.load_snapshot(&path)?;

            let selected = store.selected_id();
            for diary in store.diaries() {
                let marker = if selected == Some(diary.id) { "*" } else { " " };
                println!(
                    "{} {:>6}  {:<10}  {} photos",
                    marker,
                    diary.id,
                    diary.diary_date.as_deref().unwrap_or("-"),
                    diary.photos.len()
                );
            }
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
