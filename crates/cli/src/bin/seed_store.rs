use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cli::{sample_document, seed};
use remote_store::{DocumentStore, FileStore, JsonBinConfig, JsonBinStore};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "seed-store", about = "Write two sample trades and a default profile into a trade journal store.")]
struct Args {
    /// Local store file to seed; defaults to LEGACY_DATA_FILE (data/store.json)
    #[arg(short, long, conflicts_with = "remote")]
    output: Option<PathBuf>,

    /// Seed the configured JSONBin bin instead of a local file
    #[arg(short, long)]
    remote: bool,

    /// Overwrite a store that already holds trades
    #[arg(long, default_value_t = false)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = settings_loader::load_from_env().context("loading settings")?;

    let store: Box<dyn DocumentStore> = if args.remote {
        if !settings.jsonbin.is_configured() {
            return Err(anyhow!("JSONBIN_BIN_ID and JSONBIN_MASTER_KEY must be set for --remote"));
        }
        Box::new(JsonBinStore::new(JsonBinConfig {
            base_url: settings.jsonbin.base_url.clone(),
            bin_id: settings.jsonbin.bin_id.clone(),
            master_key: settings.jsonbin.master_key.clone(),
        })?)
    } else {
        let path = args.output.unwrap_or_else(|| settings.legacy.data_file.clone());
        Box::new(FileStore::new(path))
    };

    let document = sample_document(&settings.profile.default_name);
    seed(store.as_ref(), &document, args.force).await?;

    println!("Seeded {} with {} sample trades.", store.name(), document.trades.len());
    Ok(())
}
