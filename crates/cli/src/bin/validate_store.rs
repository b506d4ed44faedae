use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cli::validate_document;
use remote_store::{DocumentStore, JsonBinConfig, JsonBinStore};
use serde_json::Value;
use std::{fs, path::PathBuf};

#[derive(Parser, Debug)]
#[command(name = "validate-store", about = "Check a trade journal document for broken or inconsistent entries.")]
struct Args {
    /// Local store file to check (e.g., data/store.json)
    #[arg(short, long, conflicts_with = "remote")]
    file: Option<PathBuf>,

    /// Check the configured JSONBin bin instead of a local file
    #[arg(short, long)]
    remote: bool,
}

async fn fetch_remote() -> Result<Value> {
    let settings = settings_loader::load_from_env().context("loading settings")?;
    if !settings.jsonbin.is_configured() {
        return Err(anyhow!("JSONBIN_BIN_ID and JSONBIN_MASTER_KEY must be set for --remote"));
    }
    let store = JsonBinStore::new(JsonBinConfig {
        base_url: settings.jsonbin.base_url,
        bin_id: settings.jsonbin.bin_id,
        master_key: settings.jsonbin.master_key,
    })?;
    // the record as stored, so shape problems reach the report
    store.fetch_raw().await.context("fetching JSONBin document")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (source, val) = if args.remote {
        ("jsonbin".to_string(), fetch_remote().await?)
    } else {
        let path = match args.file {
            Some(path) => path,
            None => settings_loader::load_from_env().context("loading settings")?.legacy.data_file,
        };
        let txt = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let val: Value = serde_json::from_str(&txt).with_context(|| format!("parsing {}", path.display()))?;
        (path.display().to_string(), val)
    };

    let report = validate_document(&val);
    report.print(&source);

    if report.has_errors() {
        Err(anyhow!("Validation failed"))
    } else {
        println!("Store document passed validation ({} warnings).", report.warnings.len());
        Ok(())
    }
}
