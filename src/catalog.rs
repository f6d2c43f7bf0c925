use crate::error::CatalogError;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::HashSet,
    fs,
    path::Path,
};

pub const GRID_SIZE: usize = 9;

const LOSS_MARKERS: [&str; 2] = ["empty", "try again"];

const PALETTE: [&str; 6] = [
    "#e94560", // pink
    "#0f3460", // dark blue
    "#533483", // purple
    "#16213e", // navy
    "#f5a623", // orange
    "#22c55e", // green
];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PrizeKind {
    Win,
    Loss,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PrizeEntry {
    pub id: String,
    #[serde(alias = "text")]
    pub label: String,
    #[serde(rename = "color")]
    pub win_color: String,
    #[serde(rename = "textColor")]
    pub win_text_color: String,
}

impl PrizeEntry {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        win_color: impl Into<String>,
        win_text_color: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            win_color: win_color.into(),
            win_text_color: win_text_color.into(),
        }
    }

    /// Derived from the label on every call: a label mentioning "empty" or
    /// "try again" (any case) is a loss.
    pub fn kind(&self) -> PrizeKind {
        let label = self.label.to_lowercase();
        if LOSS_MARKERS.iter().any(|marker| label.contains(marker)) {
            PrizeKind::Loss
        } else {
            PrizeKind::Win
        }
    }

    pub fn is_loss(&self) -> bool {
        self.kind() == PrizeKind::Loss
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PrizeCatalog {
    entries: Vec<PrizeEntry>,
}

impl PrizeCatalog {
    /// Rejects an empty list and duplicate ids. A catalog missing one of the
    /// two kinds is accepted here and only fails when a spin needs that kind.
    pub fn new(entries: Vec<PrizeEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(CatalogError::DuplicateId(entry.id.clone()));
            }
        }
        let catalog = Self { entries };
        if catalog.win_indices().is_empty() || catalog.loss_indices().is_empty() {
            tracing::warn!(
                wins = catalog.win_indices().len(),
                losses = catalog.loss_indices().len(),
                "prize catalog lacks a win or loss entry; some spins will fail"
            );
        }
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<PrizeEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let data = fs::read_to_string(path.as_ref())?;
        Self::from_json(&data)
    }

    pub fn entries(&self) -> &[PrizeEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&PrizeEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn win_indices(&self) -> Vec<usize> {
        self.indices_of(PrizeKind::Win)
    }

    pub fn loss_indices(&self) -> Vec<usize> {
        self.indices_of(PrizeKind::Loss)
    }

    fn indices_of(&self, kind: PrizeKind) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.kind() == kind)
            .map(|(idx, _)| idx)
            .collect()
    }
}

impl Default for PrizeCatalog {
    fn default() -> Self {
        let entry = |id: &str, label: &str, color: usize, text: &str| {
            PrizeEntry::new(id, label, PALETTE[color], text)
        };
        Self {
            entries: vec![
                entry("1", "0.2 SOL", 0, "#ffffff"),
                entry("2", "50 USDC", 1, "#ffffff"),
                entry("3", "0.5 BNB", 2, "#ffffff"),
                entry("4", "Empty :(", 3, "#ffffff"),
                entry("5", "1 SOL", 4, "#000000"),
                entry("6", "150 WCT", 5, "#ffffff"),
                entry("7", "1 BNB", 0, "#ffffff"),
                entry("8", "0.03 ETH", 2, "#ffffff"),
                entry("9", "Try Again", 3, "#ffffff"),
            ],
        }
    }
}
