//! Trade library filtering.
//!
//! Three independent equality predicates (category, outcome, instrument)
//! combined with AND. Each one defaults to "all", which matches everything.
//! Output keeps input order.

use models::Trade;

/// One filter dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selector {
    #[default]
    All,
    Only(String),
}

impl Selector {
    /// `"all"` or an empty value means no constraint; anything else is an
    /// exact, case-sensitive match. Surrounding whitespace is significant.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") | Some("all") => Selector::All,
            Some(value) => Selector::Only(value.to_string()),
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(expected) => expected == value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeFilter {
    pub category: Selector,
    pub outcome: Selector,
    pub instrument: Selector,
}

impl TradeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_params(category: Option<&str>, outcome: Option<&str>, instrument: Option<&str>) -> Self {
        Self {
            category: Selector::parse(category),
            outcome: Selector::parse(outcome),
            instrument: Selector::parse(instrument),
        }
    }

    pub fn category(mut self, value: &str) -> Self {
        self.category = Selector::parse(Some(value));
        self
    }

    pub fn outcome(mut self, value: &str) -> Self {
        self.outcome = Selector::parse(Some(value));
        self
    }

    pub fn instrument(mut self, value: &str) -> Self {
        self.instrument = Selector::parse(Some(value));
        self
    }

    pub fn is_unfiltered(&self) -> bool {
        *self == Self::all()
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        self.outcome.matches(trade.outcome())
            && self.instrument.matches(trade.instrument())
            && self.category.matches(trade.category())
    }

    pub fn apply_owned(&self, trades: Vec<Trade>) -> Vec<Trade> {
        trades.into_iter().filter(|t| self.matches(t)).collect()
    }
}
