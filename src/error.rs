use thiserror::Error;

/// The catalog cannot satisfy the partition a decision needs.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum ConfigurationError {
    #[error("prize catalog has no win entries; cannot force a win")]
    MissingWinEntries,
    #[error("prize catalog has no loss entries; cannot force a loss")]
    MissingLossEntries,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("prize catalog is empty")]
    Empty,
    #[error("duplicate prize id '{0}'")]
    DuplicateId(String),
    #[error("failed to read prize catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse prize catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure reported by an external collaborator (wallet, payment, message generation).
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ServiceError {
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store contents are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("no tickets left; purchase more to spin")]
    InsufficientTickets,
    #[error("a spin is already in progress")]
    SpinInProgress,
    #[error("no wallet connected")]
    WalletNotConnected,
    #[error("cannot buy {quantity} tickets; choose between 1 and {max}")]
    InvalidQuantity { quantity: u32, max: u32 },
    #[error("payment failed: {0}")]
    Payment(ServiceError),
    #[error("wallet connection failed: {0}")]
    Wallet(ServiceError),
}

impl GameError {
    /// Whether the player should be sent to the ticket purchase flow.
    pub fn needs_purchase(&self) -> bool {
        matches!(self, GameError::InsufficientTickets)
    }
}

pub type Result<T, E = GameError> = std::result::Result<T, E>;
