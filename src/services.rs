//! External collaborators consumed by the game core, plus offline adapters
//! the terminal front-end uses when no real wallet or generator is wired in.

use crate::error::ServiceError;
use std::sync::{
    Arc,
    Mutex,
    PoisonError,
};

/// Token decimals of the stable coin tickets are priced in.
pub const PRICE_UNIT_DECIMALS: u32 = 6;

pub trait WalletConnector {
    /// Requests the active account address.
    fn connect(&mut self) -> impl Future<Output = Result<String, ServiceError>>;

    fn disconnect(&mut self);
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PurchaseRequest {
    pub account: String,
    pub quantity: u32,
    /// Total price in price-units.
    pub amount: u64,
}

impl PurchaseRequest {
    pub fn base_units(&self) -> u128 {
        u128::from(self.amount) * 10u128.pow(PRICE_UNIT_DECIMALS)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaymentReceipt {
    pub reference: String,
}

pub trait PaymentService {
    /// Moves `request.amount` from the player to the treasury. All or nothing.
    fn purchase(
        &self,
        request: &PurchaseRequest,
    ) -> impl Future<Output = Result<PaymentReceipt, ServiceError>>;
}

pub trait MessageService: Send + Sync + 'static {
    /// Produces a short celebratory line for a won prize.
    fn generate(
        &self,
        prize_label: &str,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;
}

/// Wallet with a fixed account, or none at all.
#[derive(Clone, Debug, Default)]
pub struct LocalWallet {
    address: Option<String>,
}

impl LocalWallet {
    pub fn new(address: Option<String>) -> Self {
        Self { address }
    }
}

impl WalletConnector for LocalWallet {
    async fn connect(&mut self) -> Result<String, ServiceError> {
        self.address
            .clone()
            .ok_or_else(|| ServiceError::NotFound("No accounts found.".to_string()))
    }

    fn disconnect(&mut self) {}
}

/// Pays for tickets out of a fixed local balance. Clones share the balance.
#[derive(Clone, Debug)]
pub struct PrepaidPayment {
    balances: Arc<Mutex<PrepaidBalances>>,
}

#[derive(Debug)]
struct PrepaidBalances {
    player: u64,
    treasury: u64,
    transfers: u64,
}

impl PrepaidPayment {
    pub fn new(funds: u64) -> Self {
        Self {
            balances: Arc::new(Mutex::new(PrepaidBalances {
                player: funds,
                treasury: 0,
                transfers: 0,
            })),
        }
    }

    pub fn player_funds(&self) -> u64 {
        self.balances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .player
    }

    pub fn treasury_funds(&self) -> u64 {
        self.balances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .treasury
    }
}

impl PaymentService for PrepaidPayment {
    async fn purchase(&self, request: &PurchaseRequest) -> Result<PaymentReceipt, ServiceError> {
        let mut balances = self.balances.lock().unwrap_or_else(PoisonError::into_inner);
        if balances.player < request.amount {
            return Err(ServiceError::Rejected(format!(
                "insufficient funds: {} available, {} required",
                balances.player, request.amount
            )));
        }
        balances.player -= request.amount;
        balances.treasury += request.amount;
        balances.transfers += 1;
        Ok(PaymentReceipt {
            reference: format!("local-{}", balances.transfers),
        })
    }
}

/// Fixed template used when no generator is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateMessages;

impl MessageService for TemplateMessages {
    async fn generate(&self, prize_label: &str) -> Result<String, ServiceError> {
        Ok(format!("You won {prize_label}!"))
    }
}
