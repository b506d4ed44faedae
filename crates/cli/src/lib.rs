use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use models::{CATEGORIES, Confidence, Direction, INSTRUMENTS, Outcome, Profile, StoreDocument, TIMEFRAMES, Trade};
use regex::Regex;
use remote_store::{DocumentStore, trade_count};
use serde_json::Value;

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://\S+$").unwrap());

#[derive(Default)]
pub struct Report {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Report {
    fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }
    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
    pub fn print(&self, source: &str) {
        for w in &self.warnings {
            println!("[WARN] {}: {}", source, w);
        }
        for e in &self.errors {
            println!("[ERROR] {}: {}", source, e);
        }
    }
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

fn check_image_url(rep: &mut Report, at: &str, key: &str, value: Option<&Value>) {
    match value {
        None | Some(Value::Null) => {}
        Some(Value::String(url)) if URL_RE.is_match(url) => {}
        Some(other) => rep.error(format!("{} '{}' is not an http(s) URL: {}", at, key, other)),
    }
}

fn validate_trade(rep: &mut Report, i: usize, t: &Value, seen: &mut HashSet<String>) {
    let at = format!("trades[{}]", i);
    let Some(obj) = t.as_object() else {
        rep.error(format!("{} is not an object", at));
        return;
    };

    match obj.get("id").and_then(|v| v.as_str()) {
        None | Some("") => rep.error(format!("{} missing string 'id'", at)),
        Some(id) => {
            if !seen.insert(id.to_string()) {
                rep.error(format!("{} duplicate id '{}'", at, id));
            }
        }
    }

    check_image_url(rep, &at, "imageBefore", obj.get("imageBefore"));
    check_image_url(rep, &at, "imageAfter", obj.get("imageAfter"));
    check_image_url(rep, &at, "imageUrl", obj.get("imageUrl"));

    // image-only entries from /store/image carry no trade details
    let str_field = |k: &str| obj.get(k).and_then(|v| v.as_str()).unwrap_or("");
    if obj.contains_key("imageUrl") && str_field("instrument").is_empty() {
        return;
    }

    let direction = str_field("direction");
    if Direction::from_str(direction).is_none() {
        rep.error(format!("{} unknown direction '{}'", at, direction));
    }
    let outcome = str_field("outcome");
    if Outcome::from_str(outcome).is_none() {
        rep.error(format!("{} unknown outcome '{}'", at, outcome));
    }

    match obj.get("confidence") {
        None | Some(Value::Null) => rep.warn(format!("{} missing 'confidence'", at)),
        Some(raw) => {
            let parsed: Option<Confidence> = serde_json::from_value(raw.clone()).ok();
            if parsed.and_then(|c| c.level()).is_none() {
                rep.error(format!("{} confidence {} outside 1-5", at, raw));
            }
            if raw.is_number() {
                rep.warn(format!("{} confidence stored as a number; it will be rewritten as a string", at));
            }
        }
    }

    let date = str_field("date");
    if date.is_empty() {
        rep.warn(format!("{} missing 'date'", at));
    } else if !DATE_RE.is_match(date) || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        rep.error(format!("{} invalid date '{}', expected YYYY-MM-DD", at, date));
    }

    let instrument = str_field("instrument");
    if !INSTRUMENTS.iter().any(|(value, _)| *value == instrument) {
        rep.warn(format!("{} instrument '{}' not in the form catalog", at, instrument));
    }
    let timeframe = str_field("timeframe");
    if !TIMEFRAMES.contains(&timeframe) {
        rep.warn(format!("{} timeframe '{}' not in the form catalog", at, timeframe));
    }
    let category = str_field("category");
    if !CATEGORIES.contains(&category) {
        rep.warn(format!("{} category '{}' not in the form catalog", at, category));
    }
}

/// Checks a raw store document.
pub fn validate_document(val: &Value) -> Report {
    let mut rep = Report::default();

    if !val.is_object() {
        rep.error("document is not a JSON object");
        return rep;
    }

    match val.get("trades") {
        None => rep.warn("missing 'trades'; it will read as an empty list"),
        Some(Value::Array(trades)) => {
            let mut seen = HashSet::new();
            for (i, t) in trades.iter().enumerate() {
                validate_trade(&mut rep, i, t, &mut seen);
            }
        }
        Some(_) => rep.error("'trades' is not an array"),
    }

    match val.get("profile") {
        None | Some(Value::Null) => rep.warn("missing 'profile'; the default profile will be used"),
        Some(Value::Object(profile)) => {
            if profile.get("name").and_then(|v| v.as_str()).unwrap_or("").is_empty() {
                rep.warn("profile has no 'name'");
            }
            check_image_url(&mut rep, "profile", "photo", profile.get("photo"));
        }
        Some(_) => rep.error("'profile' is not an object"),
    }

    rep
}

/// Two example trades for a fresh store.
pub fn sample_document(profile_name: &str) -> StoreDocument {
    let trade = |id: &str,
                 instrument: &str,
                 timeframe: &str,
                 category: &str,
                 direction: &str,
                 outcome: &str,
                 rr: &str,
                 date: &str,
                 confidence: &str,
                 notes: &str| Trade {
        id: id.to_string(),
        instrument: Some(instrument.to_string()),
        timeframe: Some(timeframe.to_string()),
        category: Some(category.to_string()),
        direction: Some(direction.to_string()),
        rr: Some(rr.to_string()),
        outcome: Some(outcome.to_string()),
        confidence: Some(Confidence::from(confidence)),
        notes: Some(notes.to_string()),
        date: Some(date.to_string()),
        image_before: Some(None),
        image_after: Some(None),
        ..Default::default()
    };

    StoreDocument {
        trades: vec![
            trade(
                "1",
                "XAUUSD",
                "M15",
                "FVG",
                "Buy",
                "Win",
                "1:4",
                "2024-12-28",
                "5",
                "Classic liquidity sweep followed by a change of character. Entered on the FVG retest.",
            ),
            trade(
                "2",
                "BTCUSD",
                "H4",
                "Order Blocks",
                "Sell",
                "Loss",
                "1:3",
                "2024-12-25",
                "3",
                "Price tapped into H4 order block but failed to reject. Stop loss hit.",
            ),
        ],
        profile: Some(Profile::named(profile_name)),
        ..Default::default()
    }
}

/// Writes `document` to `store`. Without `force`, a store that already holds
/// trades is left alone; with it, the current contents are not even read.
pub async fn seed(store: &dyn DocumentStore, document: &StoreDocument, force: bool) -> Result<()> {
    if !force {
        let existing = store
            .fetch_raw()
            .await
            .with_context(|| format!("reading current {} document", store.name()))?;
        let held = trade_count(&existing);
        if held > 0 {
            return Err(anyhow!("{} already holds {} trades; pass --force to overwrite", store.name(), held));
        }
    }

    store
        .save(document)
        .await
        .with_context(|| format!("writing {} document", store.name()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use remote_store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_seed_empty_store() {
        let store = MemoryStore::from_value(json!({ "trades": [], "profile": {} }));
        seed(&store, &sample_document("Trader"), false).await.unwrap();
        let doc = store.snapshot().await;
        assert_eq!(doc.trades.len(), 2);
        assert_eq!(doc.profile.unwrap().name, "Trader");
    }

    #[tokio::test]
    async fn test_seed_refuses_non_empty_store() {
        let existing = json!({ "trades": [{ "id": "1" }], "profile": { "name": "Me" } });
        let store = MemoryStore::from_value(existing.clone());
        let err = seed(&store, &sample_document("Trader"), false).await.unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(store.saves(), 0);
        assert_eq!(store.raw_snapshot().await, existing);
    }

    #[tokio::test]
    async fn test_seed_force_overwrites() {
        let store = MemoryStore::from_value(json!({ "trades": [{ "id": "1" }] }));
        seed(&store, &sample_document("Trader"), true).await.unwrap();
        let ids: Vec<String> = store.snapshot().await.trades.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(store.saves(), 1);
    }

    #[tokio::test]
    async fn test_seed_does_not_write_over_unreadable_store() {
        let store = MemoryStore::default();
        store.fail_fetches(true);
        assert!(seed(&store, &sample_document("Trader"), false).await.is_err());
        assert_eq!(store.saves(), 0);
    }

    #[tokio::test]
    async fn test_raw_fetch_reports_stored_shape() {
        let store = MemoryStore::from_value(json!({
            "trades": [{
                "id": "1", "instrument": "XAUUSD", "timeframe": "M15", "category": "FVG",
                "direction": "Buy", "outcome": "Win", "confidence": 5, "date": "2024-12-28"
            }]
        }));
        let rep = validate_document(&store.fetch_raw().await.unwrap());
        assert!(!rep.has_errors(), "{:?}", rep.errors);
        assert!(rep.warnings.iter().any(|w| w.contains("stored as a number")));
        assert!(rep.warnings.iter().any(|w| w.contains("missing 'profile'")));
    }

    #[test]
    fn test_sample_document_is_clean() {
        let val = serde_json::to_value(sample_document("Trader")).unwrap();
        let rep = validate_document(&val);
        assert!(rep.errors.is_empty(), "{:?}", rep.errors);
        assert!(rep.warnings.is_empty(), "{:?}", rep.warnings);
    }

    #[test]
    fn test_duplicate_and_missing_ids() {
        let val = json!({
            "trades": [
                { "id": "1", "direction": "Buy", "outcome": "Win", "confidence": "3", "date": "2024-01-01" },
                { "id": "1", "direction": "Buy", "outcome": "Win", "confidence": "3", "date": "2024-01-01" },
                { "direction": "Buy", "outcome": "Win", "confidence": "3", "date": "2024-01-01" }
            ],
            "profile": { "name": "Trader" }
        });
        let rep = validate_document(&val);
        assert!(rep.errors.iter().any(|e| e.contains("duplicate id '1'")));
        assert!(rep.errors.iter().any(|e| e.contains("trades[2] missing string 'id'")));
    }

    #[test]
    fn test_bad_values() {
        let val = json!({
            "trades": [{
                "id": "1",
                "direction": "Long",
                "outcome": "Draw",
                "confidence": 9,
                "date": "2024-13-01",
                "imageBefore": "file:///tmp/x.png"
            }],
            "profile": { "name": "Trader", "photo": null }
        });
        let rep = validate_document(&val);
        assert_eq!(rep.errors.len(), 5, "{:?}", rep.errors);
    }

    #[test]
    fn test_numeric_confidence_is_warning() {
        let val = json!({
            "trades": [{
                "id": "1", "instrument": "XAUUSD", "timeframe": "M15", "category": "FVG",
                "direction": "Buy", "outcome": "Win", "confidence": 5, "date": "2024-12-28"
            }],
            "profile": { "name": "Trader" }
        });
        let rep = validate_document(&val);
        assert!(!rep.has_errors());
        assert_eq!(rep.warnings.len(), 1);
    }

    #[test]
    fn test_legacy_image_entry_skips_trade_checks() {
        let val = json!({
            "trades": [{ "id": "1", "imageUrl": "https://res.cloudinary.com/x.png", "timestamp": "2024-12-28T10:00:00.000Z" }],
            "profile": {}
        });
        let rep = validate_document(&val);
        assert!(!rep.has_errors(), "{:?}", rep.errors);
        assert_eq!(rep.warnings, vec!["profile has no 'name'".to_string()]);
    }

    #[test]
    fn test_shape_errors() {
        assert!(validate_document(&json!([])).has_errors());
        assert!(validate_document(&json!({ "trades": {}, "profile": {} })).has_errors());
        let rep = validate_document(&json!({}));
        assert!(!rep.has_errors());
        assert_eq!(rep.warnings.len(), 2);
    }
}
