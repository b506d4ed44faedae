use models::{Confidence, Direction, Outcome, Trade};
use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};

/// The new-trade entry form, with the same defaults the admin page starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeForm {
    pub instrument: String,
    pub timeframe: String,
    pub category: String,
    pub direction: String,
    pub rr: String,
    pub outcome: String,
    pub confidence: String,
    pub notes: String,
}

impl Default for TradeForm {
    fn default() -> Self {
        Self {
            instrument: "XAUUSD".to_string(),
            timeframe: "M15".to_string(),
            category: "Order Blocks".to_string(),
            direction: Direction::Buy.as_str().to_string(),
            rr: String::new(),
            outcome: Outcome::Win.as_str().to_string(),
            confidence: "3".to_string(),
            notes: String::new(),
        }
    }
}

impl TradeForm {
    /// Sets a field by its form name. Unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "instrument" => &mut self.instrument,
            "timeframe" => &mut self.timeframe,
            "category" => &mut self.category,
            "direction" => &mut self.direction,
            "rr" => &mut self.rr,
            "outcome" => &mut self.outcome,
            "confidence" => &mut self.confidence,
            "notes" => &mut self.notes,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Direction, outcome and confidence must be known values. Instrument,
    /// timeframe and category stay free-form.
    pub fn validate(&self) -> Result<()> {
        if Direction::from_str(&self.direction).is_none() {
            return Err(JournalError::InvalidForm(format!(
                "direction must be Buy or Sell, got '{}'",
                self.direction
            )));
        }
        if Outcome::from_str(&self.outcome).is_none() {
            return Err(JournalError::InvalidForm(format!(
                "outcome must be one of Win, Loss, BE, Pending, got '{}'",
                self.outcome
            )));
        }
        if Confidence::from(self.confidence.as_str()).level().is_none() {
            return Err(JournalError::InvalidForm(format!(
                "confidence must be between {} and {}, got '{}'",
                Confidence::MIN,
                Confidence::MAX,
                self.confidence
            )));
        }
        Ok(())
    }

    pub fn into_trade(
        self,
        id: String,
        date: String,
        image_before: Option<String>,
        image_after: Option<String>,
    ) -> Trade {
        Trade {
            id,
            instrument: Some(self.instrument),
            timeframe: Some(self.timeframe),
            category: Some(self.category),
            direction: Some(self.direction),
            rr: Some(self.rr),
            outcome: Some(self.outcome),
            confidence: Some(Confidence(self.confidence.trim().to_string())),
            notes: Some(self.notes),
            date: Some(date),
            // written as null when there is no image
            image_before: Some(image_before),
            image_after: Some(image_after),
            ..Default::default()
        }
    }
}
