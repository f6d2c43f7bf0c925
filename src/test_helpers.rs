use crate::{
    animator::Highlight,
    catalog::PrizeCatalog,
    config::{
        ConfigError,
        GameConfig,
    },
    controller::{
        GameController,
        GameEvent,
        Settlement,
        SpinStarted,
    },
    error::ServiceError,
    services::{
        MessageService,
        PaymentReceipt,
        PaymentService,
        PurchaseRequest,
        WalletConnector,
    },
    store::MemoryStore,
};
use rand::{
    SeedableRng,
    rngs::StdRng,
};
use std::{
    collections::VecDeque,
    sync::{
        Arc,
        Mutex,
    },
    time::Duration,
};

pub const ALICE: &str = "0xa11ce";

pub type TestController =
    GameController<ScriptedWallet, ScriptedPayment, ScriptedMessages, MemoryStore>;

/// Wallet that answers `connect` from a script, then with `ALICE` once the
/// script runs out.
#[derive(Clone, Debug, Default)]
pub struct ScriptedWallet {
    script: Arc<Mutex<VecDeque<Result<String, ServiceError>>>>,
    disconnects: Arc<Mutex<u32>>,
}

impl ScriptedWallet {
    pub fn push(&self, response: Result<String, ServiceError>) {
        self.script.lock().unwrap().push_back(response);
    }

    pub fn disconnects(&self) -> u32 {
        *self.disconnects.lock().unwrap()
    }
}

impl WalletConnector for ScriptedWallet {
    async fn connect(&mut self) -> Result<String, ServiceError> {
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(ALICE.to_string()))
    }

    fn disconnect(&mut self) {
        *self.disconnects.lock().unwrap() += 1;
    }
}

/// Payment that succeeds unless a failure has been queued. Every request is
/// recorded.
#[derive(Clone, Debug, Default)]
pub struct ScriptedPayment {
    failures: Arc<Mutex<VecDeque<ServiceError>>>,
    requests: Arc<Mutex<Vec<PurchaseRequest>>>,
}

impl ScriptedPayment {
    pub fn fail_next(&self, error: ServiceError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn requests(&self) -> Vec<PurchaseRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl PaymentService for ScriptedPayment {
    async fn purchase(&self, request: &PurchaseRequest) -> Result<PaymentReceipt, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(PaymentReceipt {
            reference: format!("test-{}", self.requests.lock().unwrap().len()),
        })
    }
}

#[derive(Clone, Debug)]
pub struct ScriptedMessages {
    response: Result<String, ServiceError>,
    delay: Duration,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedMessages {
    pub fn replying(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            delay: Duration::ZERO,
            prompts: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Err(ServiceError::Failed("generator unavailable".to_string())),
            delay: Duration::ZERO,
            prompts: Arc::default(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for ScriptedMessages {
    fn default() -> Self {
        Self::replying("Jackpot!")
    }
}

impl MessageService for ScriptedMessages {
    async fn generate(&self, prize_label: &str) -> Result<String, ServiceError> {
        self.prompts.lock().unwrap().push(prize_label.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response.clone()
    }
}

#[derive(Default)]
pub struct TestContextBuilder {
    config: Option<GameConfig>,
    catalog: Option<PrizeCatalog>,
    store: Option<MemoryStore>,
    messages: Option<ScriptedMessages>,
    seed: u64,
}

impl TestContextBuilder {
    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn catalog(mut self, catalog: PrizeCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn store(mut self, store: MemoryStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn messages(mut self, messages: ScriptedMessages) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> TestContext {
        self.try_build().unwrap()
    }

    pub fn try_build(self) -> Result<TestContext, ConfigError> {
        let store = self.store.unwrap_or_default();
        let wallet = ScriptedWallet::default();
        let payment = ScriptedPayment::default();
        let messages = self.messages.unwrap_or_default();
        let controller = GameController::new(
            self.config.unwrap_or_default(),
            self.catalog.unwrap_or_default(),
            store.clone(),
            wallet.clone(),
            payment.clone(),
            messages.clone(),
        )?
        .with_rng(StdRng::seed_from_u64(self.seed));
        Ok(TestContext {
            controller,
            store,
            wallet,
            payment,
            messages,
        })
    }
}

/// A controller wired to scripted collaborators, with handles kept for
/// inspection. Controller tests run on paused tokio time.
pub struct TestContext {
    pub controller: TestController,
    pub store: MemoryStore,
    pub wallet: ScriptedWallet,
    pub payment: ScriptedPayment,
    pub messages: ScriptedMessages,
}

#[derive(Debug)]
pub struct SpinRun {
    pub started: SpinStarted,
    pub highlights: Vec<Highlight>,
    pub settlement: Settlement,
}

impl TestContext {
    pub fn builder() -> TestContextBuilder {
        TestContextBuilder::default()
    }

    pub async fn connect_and_buy(&mut self, quantity: u32) {
        self.controller.connect_wallet().await.unwrap();
        if quantity > 0 {
            self.controller.purchase_tickets(quantity).await.unwrap();
        }
    }

    /// Buys tickets in the largest allowed batches.
    pub async fn buy(&mut self, mut tickets: u32) {
        let max = self.controller.config().max_purchase;
        while tickets > 0 {
            let batch = tickets.min(max);
            self.controller.purchase_tickets(batch).await.unwrap();
            tickets -= batch;
        }
    }

    pub async fn spin_to_settlement(&mut self) -> SpinRun {
        let started = self.controller.request_spin().unwrap();
        let mut highlights = Vec::new();
        loop {
            match self.controller.next_event().await {
                GameEvent::Highlight { spin_id, highlight } => {
                    assert_eq!(spin_id, started.spin_id);
                    highlights.push(highlight);
                }
                GameEvent::Settled(settlement) => {
                    assert_eq!(settlement.spin_id, started.spin_id);
                    return SpinRun {
                        started,
                        highlights,
                        settlement,
                    };
                }
                GameEvent::Message { .. } => {}
            }
        }
    }

    pub async fn next_message(&mut self) -> (u64, String) {
        loop {
            if let GameEvent::Message { spin_id, text } = self.controller.next_event().await {
                return (spin_id, text);
            }
        }
    }
}
