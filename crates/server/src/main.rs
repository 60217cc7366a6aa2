//! # sheetshift-server
//!
//! HTTP server for order-sheet transfers.

mod routes;

use anyhow::{Context, Result};
use clap::Parser;
use routes::{create_router, AppState};
use sheetshift_core::{TransferConfig, TransferService};
use sheetshift_sheet::{Book, MemoryProvider, SheetProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// sheetshift-server - move order rows between sheets over HTTP
#[derive(Parser)]
#[command(name = "sheetshift-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "SHEETSHIFT_BIND", default_value = "0.0.0.0:3000")]
    bind: String,

    /// Transfer configuration (YAML)
    #[arg(short, long, env = "SHEETSHIFT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory of spreadsheets to preload: <spreadsheet>/<sheet>.csv
    #[arg(long, value_name = "DIR")]
    seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match &args.config {
        Some(path) => TransferConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => TransferConfig::default(),
    };

    let sheets = Arc::new(MemoryProvider::new());
    if let Some(dir) = &args.seed {
        seed(&sheets, dir).await?;
    }

    let service = TransferService::in_memory(Arc::clone(&sheets) as Arc<dyn SheetProvider>, config)
        .context("Invalid transfer configuration")?;
    let app = create_router(AppState::new(service, sheets));

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    tracing::info!(addr = %args.bind, "sheetshift-server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Load every `<spreadsheet>/<sheet>.csv` under `dir`.
async fn seed(sheets: &MemoryProvider, dir: &Path) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read seed directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let id = entry.file_name().to_string_lossy().into_owned();
        let book = Book::from_csv_dir(&id, &path)
            .with_context(|| format!("Failed to load spreadsheet: {}", path.display()))?;
        tracing::info!(spreadsheet = %id, sheets = book.sheet_count(), "Seeded spreadsheet");
        sheets.insert_book(book).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use sheetshift_sheet::{Sheet, SheetRef};

    #[test]
    fn test_default_bind() {
        let command = Args::command();
        let bind = command
            .get_arguments()
            .find(|arg| arg.get_id() == "bind")
            .unwrap();
        let defaults: Vec<&str> = bind
            .get_default_values()
            .iter()
            .filter_map(|v| v.to_str())
            .collect();
        assert_eq!(defaults, ["0.0.0.0:3000"]);
        assert_eq!(bind.get_env(), Some(std::ffi::OsStr::new("SHEETSHIFT_BIND")));
    }

    #[test]
    fn test_flags_override_environment() {
        let args = Args::parse_from([
            "sheetshift-server",
            "--bind",
            "127.0.0.1:8080",
            "--config",
            "transfer.yaml",
        ]);
        assert_eq!(args.bind, "127.0.0.1:8080");
        assert_eq!(args.config, Some(PathBuf::from("transfer.yaml")));
    }

    #[tokio::test]
    async fn test_seed_loads_csv_tree() {
        let dir = tempfile::tempdir().unwrap();
        let orders = dir.path().join("orders");
        std::fs::create_dir(&orders).unwrap();
        Sheet::from_data(vec![
            vec!["DATE", "ORDER ID"],
            vec!["2024-01-10", "ORD-001"],
        ])
        .save_as_csv(orders.join("Pending.csv"))
        .unwrap();
        std::fs::write(dir.path().join("README.txt"), "ignored").unwrap();

        let sheets = MemoryProvider::new();
        seed(&sheets, dir.path()).await.unwrap();

        assert_eq!(sheets.spreadsheet_ids().await, vec!["orders"]);
        let pending = sheets
            .snapshot(&SheetRef::new("orders", "Pending"))
            .await
            .unwrap();
        assert_eq!(pending.row_count(), 1);
    }
}
