use crate::{
    catalog::PrizeEntry,
    store::{
        HISTORY_KEY,
        KeyValueStore,
    },
};
use chrono::{
    DateTime,
    TimeDelta,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Settled result of one spin.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpinOutcome {
    pub prize: PrizeEntry,
    pub is_loss: bool,
}

impl SpinOutcome {
    pub fn new(prize: PrizeEntry) -> Self {
        let is_loss = prize.is_loss();
        Self { prize, is_loss }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub prize: PrizeEntry,
    #[serde(rename = "wonAt", alias = "timestamp")]
    pub won_at: DateTime<Utc>,
}

pub fn encode_history(items: &[HistoryItem]) -> serde_json::Result<String> {
    serde_json::to_string(items)
}

pub fn decode_history(json: &str) -> serde_json::Result<Vec<HistoryItem>> {
    serde_json::from_str(json)
}

/// Newest-first record of won prizes, written through to the store after
/// every append.
#[derive(Debug)]
pub struct HistoryLog<S> {
    items: Vec<HistoryItem>,
    store: S,
}

impl<S: KeyValueStore> HistoryLog<S> {
    /// Missing or malformed stored history yields an empty log.
    pub fn load(store: S) -> Self {
        let items = match store.get(HISTORY_KEY) {
            Ok(Some(raw)) => decode_history(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "stored win history is malformed; starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read win history; starting empty");
                Vec::new()
            }
        };
        Self { items, store }
    }

    /// Losses are ignored. Wins are prepended and the whole list persisted.
    pub fn record(&mut self, outcome: &SpinOutcome, now: DateTime<Utc>) -> Option<&HistoryItem> {
        if outcome.is_loss {
            return None;
        }
        // keep strictly newest-first even if the wall clock steps backwards
        let won_at = match self.items.first() {
            Some(newest) if now <= newest.won_at => newest.won_at + TimeDelta::milliseconds(1),
            _ => now,
        };
        self.items.insert(
            0,
            HistoryItem {
                prize: outcome.prize.clone(),
                won_at,
            },
        );
        self.persist();
        self.items.first()
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn persist(&mut self) {
        let json = match encode_history(&self.items) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode win history");
                return;
            }
        };
        if let Err(e) = self.store.set(HISTORY_KEY, &json) {
            tracing::error!(error = %e, entries = self.items.len(), "failed to persist win history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::PrizeCatalog,
        store::MemoryStore,
    };
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn win() -> SpinOutcome {
        SpinOutcome::new(PrizeCatalog::default().entries()[0].clone())
    }

    fn loss() -> SpinOutcome {
        SpinOutcome::new(PrizeCatalog::default().entries()[3].clone())
    }

    #[test]
    fn losses_are_not_recorded() {
        let store = MemoryStore::new();
        let mut log = HistoryLog::load(store.clone());
        assert!(log.record(&loss(), at(10)).is_none());
        assert!(log.is_empty());
        assert_eq!(store.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn wins_are_prepended_and_persisted() {
        let store = MemoryStore::new();
        let mut log = HistoryLog::load(store.clone());
        let second = SpinOutcome::new(PrizeCatalog::default().entries()[4].clone());

        log.record(&win(), at(10));
        log.record(&second, at(20));

        assert_eq!(log.items()[0].prize.label, "1 SOL");
        assert_eq!(log.items()[1].prize.label, "0.2 SOL");

        let reloaded = HistoryLog::load(store);
        assert_eq!(reloaded.items(), log.items());
    }

    #[test]
    fn backwards_clock_still_orders_newest_first() {
        let mut log = HistoryLog::load(MemoryStore::new());
        log.record(&win(), at(100));
        log.record(&win(), at(50));
        assert!(log.items()[0].won_at > log.items()[1].won_at);
    }

    #[test]
    fn malformed_history_loads_empty() {
        let store = MemoryStore::with_entries([(HISTORY_KEY, "{not json")]);
        assert!(HistoryLog::load(store).is_empty());
    }

    #[test]
    fn wire_format_uses_camel_case_fields() {
        let item = HistoryItem {
            prize: PrizeCatalog::default().entries()[1].clone(),
            won_at: at(0),
        };
        let json = encode_history(&[item]).unwrap();
        assert_eq!(
            json,
            r##"[{"prize":{"id":"2","label":"50 USDC","color":"#0f3460","textColor":"#ffffff"},"wonAt":"1970-01-01T00:00:00Z"}]"##
        );
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let json = r##"[{"prize":{"id":"5","text":"1 SOL","color":"#f5a623","textColor":"#000000"},"timestamp":"2024-05-01T12:30:00.000Z"}]"##;
        let items = decode_history(json).unwrap();
        assert_eq!(items[0].prize.label, "1 SOL");
        assert_eq!(items[0].won_at, Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap());
    }
}
