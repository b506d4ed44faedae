use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

// Form catalog
pub const INSTRUMENTS: &[(&str, &str)] = &[
	("XAUUSD", "Gold (XAUUSD)"),
	("BTCUSD", "Bitcoin (BTCUSD)"),
	("EURUSD", "EURUSD"),
	("GBPUSD", "GBPUSD"),
	("US30", "US30"),
	("NAS100", "NAS100"),
];

pub const TIMEFRAMES: &[&str] = &["M1", "M5", "M15", "H1", "H4", "D1"];

pub const CATEGORIES: &[&str] = &[
	"Order Blocks",
	"FVG",
	"SMC Confirmations",
	"BOS",
	"Liquidity Grabs",
	"Supply & Demand",
	"Institutional Candles",
	"Rejection",
];

pub const DEFAULT_PROFILE_NAME: &str = "Irshad Sheikh";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
	Buy,
	Sell,
}

impl Direction {
	pub const ALL: [Direction; 2] = [Direction::Buy, Direction::Sell];

	pub fn as_str(&self) -> &'static str {
		match self {
			Direction::Buy => "Buy",
			Direction::Sell => "Sell",
		}
	}

	pub fn from_str(s: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|d| d.as_str() == s)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
	Win,
	Loss,
	#[serde(rename = "BE")]
	BreakEven,
	Pending,
}

impl Outcome {
	pub const ALL: [Outcome; 4] = [Outcome::Win, Outcome::Loss, Outcome::BreakEven, Outcome::Pending];

	pub fn as_str(&self) -> &'static str {
		match self {
			Outcome::Win => "Win",
			Outcome::Loss => "Loss",
			Outcome::BreakEven => "BE",
			Outcome::Pending => "Pending",
		}
	}

	pub fn from_str(s: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|o| o.as_str() == s)
	}
}

/// Confidence rating as stored in the document.
///
/// Always written as a string ("1".."5"). Older documents wrote a bare number,
/// so both shapes are accepted on read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Confidence(pub String);

impl Confidence {
	pub const MIN: u8 = 1;
	pub const MAX: u8 = 5;

	/// The rating as a number, if it is a whole number within 1..=5.
	pub fn level(&self) -> Option<u8> {
		let n: u8 = self.0.trim().parse().ok()?;
		(Self::MIN..=Self::MAX).contains(&n).then_some(n)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for Confidence {
	fn from(s: &str) -> Self {
		Confidence(s.to_string())
	}
}

impl Serialize for Confidence {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.0)
	}
}

impl<'de> Deserialize<'de> for Confidence {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Text(String),
			Int(i64),
			Float(f64),
		}

		Ok(match Raw::deserialize(deserializer)? {
			Raw::Text(s) => Confidence(s),
			Raw::Int(n) => Confidence(n.to_string()),
			Raw::Float(f) if f.fract() == 0.0 => Confidence(format!("{}", f as i64)),
			Raw::Float(f) => Confidence(f.to_string()),
		})
	}
}

/// Text as older documents may hold it: numbers and booleans become their
/// decimal form, `null` reads as absent.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
	Ok(match Option::<Value>::deserialize(deserializer)? {
		None | Some(Value::Null) => None,
		Some(Value::String(s)) => Some(s),
		Some(Value::Number(n)) => Some(n.to_string()),
		Some(Value::Bool(b)) => Some(b.to_string()),
		Some(other) => return Err(de::Error::custom(format!("expected text, found {}", other))),
	})
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	Ok(lenient_text(deserializer)?.unwrap_or_default())
}

/// Keeps an explicit `null` apart from a missing key.
fn nullable_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Option<String>>, D::Error> {
	lenient_text(deserializer).map(Some)
}

fn text(field: &Option<String>) -> &str {
	field.as_deref().unwrap_or("")
}

/// One logged journal entry.
///
/// Every field is optional on read: legacy image-only entries only carry
/// `id`, `imageUrl` and `timestamp`. Absent fields stay absent on write, and
/// keys this struct does not know about are kept in `extra`.
///
/// `image_before` / `image_after` are `Some(None)` for an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
	#[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
	pub id: String,
	#[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
	pub instrument: Option<String>,
	#[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
	pub timeframe: Option<String>,
	#[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	#[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
	pub direction: Option<String>,
	#[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
	pub rr: Option<String>,
	#[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
	pub outcome: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub confidence: Option<Confidence>,
	#[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
	pub notes: Option<String>,
	#[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
	pub date: Option<String>,
	#[serde(default, deserialize_with = "nullable_text", skip_serializing_if = "Option::is_none")]
	pub image_before: Option<Option<String>>,
	#[serde(default, deserialize_with = "nullable_text", skip_serializing_if = "Option::is_none")]
	pub image_after: Option<Option<String>>,
	#[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
	pub image_url: Option<String>,
	#[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Trade {
	pub fn instrument(&self) -> &str {
		text(&self.instrument)
	}

	pub fn category(&self) -> &str {
		text(&self.category)
	}

	pub fn outcome(&self) -> &str {
		text(&self.outcome)
	}

	pub fn image_before(&self) -> Option<&str> {
		self.image_before.as_ref().and_then(|url| url.as_deref())
	}

	pub fn image_after(&self) -> Option<&str> {
		self.image_after.as_ref().and_then(|url| url.as_deref())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
	#[serde(default, deserialize_with = "lenient_string")]
	pub name: String,
	#[serde(default, deserialize_with = "lenient_text")]
	pub photo: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Profile {
	pub fn named(name: impl Into<String>) -> Self {
		Self { name: name.into(), ..Default::default() }
	}
}

/// The whole unit of persistence. Every save replaces the remote copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
	#[serde(default)]
	pub trades: Vec<Trade>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub profile: Option<Profile>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl StoreDocument {
	/// Empty trade list with a default profile carrying `name`.
	pub fn empty(name: &str) -> Self {
		Self { profile: Some(Profile::named(name)), ..Default::default() }
	}

	/// Fill a missing profile with the default one.
	pub fn with_default_profile(mut self, name: &str) -> Self {
		if self.profile.is_none() {
			self.profile = Some(Profile::named(name));
		}
		self
	}

	pub fn contains_id(&self, id: &str) -> bool {
		self.trades.iter().any(|t| t.id == id)
	}

	pub fn find_trade(&self, id: &str) -> Option<&Trade> {
		self.trades.iter().find(|t| t.id == id)
	}
}

// Catalog output
#[derive(Debug, Serialize, Clone)]
pub struct CatalogOption {
	pub value: String,
	pub label: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct Catalog {
	pub instruments: Vec<CatalogOption>,
	pub timeframes: Vec<String>,
	pub categories: Vec<String>,
	pub directions: Vec<String>,
	pub outcomes: Vec<String>,
}

impl Catalog {
	pub fn standard() -> Self {
		Self {
			instruments: INSTRUMENTS
				.iter()
				.map(|(value, label)| CatalogOption { value: value.to_string(), label: label.to_string() })
				.collect(),
			timeframes: TIMEFRAMES.iter().map(|s| s.to_string()).collect(),
			categories: CATEGORIES.iter().map(|s| s.to_string()).collect(),
			directions: Direction::ALL.iter().map(|d| d.as_str().to_string()).collect(),
			outcomes: Outcome::ALL.iter().map(|o| o.as_str().to_string()).collect(),
		}
	}
}
