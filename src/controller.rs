use crate::{
    animator::{
        AnimationEvent,
        Highlight,
        SpinAnimator,
        SpinTask,
        TokioClock,
    },
    catalog::{
        PrizeCatalog,
        PrizeEntry,
    },
    config::{
        ConfigError,
        GameConfig,
    },
    economy::{
        Economy,
        EconomyState,
    },
    error::{
        GameError,
        Result,
    },
    history::{
        HistoryItem,
        HistoryLog,
        SpinOutcome,
    },
    outcome,
    services::{
        MessageService,
        PaymentService,
        PurchaseRequest,
        WalletConnector,
    },
    store::{
        self,
        KeyValueStore,
    },
};
use chrono::Utc;
use rand::{
    SeedableRng,
    rngs::StdRng,
};
use std::sync::Arc;
use tokio::{
    sync::mpsc::{
        self,
        UnboundedReceiver,
        UnboundedSender,
    },
    task::JoinHandle,
};
use tracing::{
    debug,
    error,
    info,
    warn,
};

pub type SpinId = u64;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpinStarted {
    pub spin_id: SpinId,
    pub winning_index: usize,
    pub forced_win: bool,
    pub economy: EconomyState,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MessageState {
    Ready(String),
    /// A celebratory message was requested; it arrives as `GameEvent::Message`.
    Pending,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settlement {
    pub spin_id: SpinId,
    pub outcome: SpinOutcome,
    pub message: MessageState,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GameEvent {
    Highlight { spin_id: SpinId, highlight: Highlight },
    Settled(Settlement),
    Message { spin_id: SpinId, text: String },
}

#[derive(Clone, Debug)]
pub struct GameSnapshot {
    pub account: Option<String>,
    pub economy: EconomyState,
    pub spinning: bool,
    pub prizes: Vec<PrizeEntry>,
    pub history: Vec<HistoryItem>,
}

#[derive(Debug)]
enum Signal {
    Animation(AnimationEvent),
    Message(String),
}

#[derive(Debug)]
struct Envelope {
    spin_id: SpinId,
    signal: Signal,
}

struct ActiveSpin {
    id: SpinId,
    prize: PrizeEntry,
    task: SpinTask,
}

/// Owns the game state and runs one spin at a time.
///
/// `request_spin` decides and accounts for a spin synchronously, then hands
/// the animation to a spawned task; everything that follows is delivered
/// through `next_event`. Must be used from within a tokio runtime.
pub struct GameController<W, P, M, S> {
    config: GameConfig,
    catalog: PrizeCatalog,
    economy: Economy,
    history: HistoryLog<S>,
    store: S,
    wallet: W,
    payment: P,
    messages: Arc<M>,
    account: Option<String>,
    active: Option<ActiveSpin>,
    message_task: Option<(SpinId, JoinHandle<()>)>,
    next_spin_id: SpinId,
    rng: StdRng,
    tx: UnboundedSender<Envelope>,
    rx: UnboundedReceiver<Envelope>,
}

impl<W, P, M, S> GameController<W, P, M, S>
where
    W: WalletConnector,
    P: PaymentService,
    M: MessageService,
    S: KeyValueStore + Clone,
{
    pub fn new(
        config: GameConfig,
        catalog: PrizeCatalog,
        store: S,
        wallet: W,
        payment: P,
        messages: M,
    ) -> Result<Self, ConfigError> {
        config
            .validate()
            .inspect_err(|e| error!(error = %e, "rejecting game config"))?;
        let spend = store::load_spend(&store);
        let history = HistoryLog::load(store.clone());
        let (tx, rx) = mpsc::unbounded_channel();
        info!(
            spend,
            wins = history.len(),
            prizes = catalog.len(),
            "game state restored"
        );
        Ok(Self {
            economy: Economy::restore(config.ticket_price, spend),
            config,
            catalog,
            history,
            store,
            wallet,
            payment,
            messages: Arc::new(messages),
            account: None,
            active: None,
            message_task: None,
            next_spin_id: 1,
            rng: StdRng::from_os_rng(),
            tx,
            rx,
        })
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &PrizeCatalog {
        &self.catalog
    }

    pub fn economy(&self) -> EconomyState {
        self.economy.state()
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn history(&self) -> &[HistoryItem] {
        self.history.items()
    }

    pub fn is_spinning(&self) -> bool {
        self.active.is_some()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            account: self.account.clone(),
            economy: self.economy.state(),
            spinning: self.is_spinning(),
            prizes: self.catalog.entries().to_vec(),
            history: self.history.items().to_vec(),
        }
    }

    /// Any successful connect is a new wallet session, so the balance resets
    /// even when the address is unchanged.
    pub async fn connect_wallet(&mut self) -> Result<String> {
        match self.wallet.connect().await {
            Ok(address) => {
                info!(%address, "wallet connected");
                self.account = Some(address.clone());
                self.economy.on_identity_change();
                Ok(address)
            }
            Err(e) => {
                warn!(error = %e, "wallet connection failed");
                Err(GameError::Wallet(e))
            }
        }
    }

    pub fn disconnect_wallet(&mut self) {
        self.wallet.disconnect();
        if let Some(address) = self.account.take() {
            info!(%address, "wallet disconnected");
        }
        self.economy.on_identity_change();
    }

    /// Tickets are credited only after the payment collaborator succeeds.
    pub async fn purchase_tickets(&mut self, quantity: u32) -> Result<EconomyState> {
        let account = self.account.clone().ok_or(GameError::WalletNotConnected)?;
        let max = self.config.max_purchase;
        if quantity == 0 || quantity > max {
            return Err(GameError::InvalidQuantity { quantity, max });
        }
        let request = PurchaseRequest {
            account,
            quantity,
            amount: self.config.ticket_price.saturating_mul(u64::from(quantity)),
        };
        match self.payment.purchase(&request).await {
            Ok(receipt) => {
                self.economy.credit_tickets(quantity);
                info!(
                    quantity,
                    amount = request.amount,
                    reference = %receipt.reference,
                    balance = self.economy.ticket_balance(),
                    "tickets purchased"
                );
                Ok(self.economy.state())
            }
            Err(e) => {
                warn!(quantity, amount = request.amount, error = %e, "ticket purchase failed");
                Err(GameError::Payment(e))
            }
        }
    }

    /// Validates, decides and pays for a spin, then starts its animation.
    /// Nothing is mutated unless a decision was made.
    pub fn request_spin(&mut self) -> Result<SpinStarted> {
        if self.active.is_some() {
            return Err(GameError::SpinInProgress);
        }
        if self.account.is_none() {
            return Err(GameError::WalletNotConnected);
        }
        if self.economy.ticket_balance() == 0 {
            debug!("spin requested without tickets");
            return Err(GameError::InsufficientTickets);
        }

        let decision = outcome::select(
            &self.catalog,
            self.economy.cumulative_spend(),
            self.config.ticket_price,
            self.config.win_threshold,
            &mut self.rng,
        )
        .inspect_err(|e| error!(error = %e, "prize catalog cannot satisfy spin"))?;

        self.economy.consume_ticket()?;
        // a message still pending for an earlier win belongs to a superseded spin
        if let Some((previous, handle)) = self.message_task.take() {
            handle.abort();
            debug!(spin_id = previous, "dropping pending message for an earlier spin");
        }
        if decision.forced_win {
            self.economy.apply_pity_reset();
            info!(winning_index = decision.winning_index, "spend threshold reached; forcing a win");
        }
        debug_assert_eq!(self.economy.cumulative_spend(), decision.updated_spend);
        store::save_spend(&mut self.store, self.economy.cumulative_spend());

        let spin_id = self.next_spin_id;
        self.next_spin_id += 1;
        let animation = self.config.animation();
        let tx = self.tx.clone();
        let task = SpinTask::spawn(
            SpinAnimator::new(animation, self.catalog.len(), decision.winning_index),
            TokioClock::new(animation.tick_period),
            StdRng::from_rng(&mut self.rng),
            move |event| {
                let _ = tx.send(Envelope {
                    spin_id,
                    signal: Signal::Animation(event),
                });
            },
        );
        self.active = Some(ActiveSpin {
            id: spin_id,
            prize: self.catalog.entries()[decision.winning_index].clone(),
            task,
        });

        Ok(SpinStarted {
            spin_id,
            winning_index: decision.winning_index,
            forced_win: decision.forced_win,
            economy: self.economy.state(),
        })
    }

    /// Waits for the next event of the current spin. Events from cancelled
    /// spins are dropped.
    pub async fn next_event(&mut self) -> GameEvent {
        loop {
            // self holds a sender, so the channel never closes
            let Some(Envelope { spin_id, signal }) = self.rx.recv().await else {
                return std::future::pending().await;
            };
            match signal {
                Signal::Animation(AnimationEvent::Highlight(highlight)) => {
                    if self.is_active(spin_id) {
                        return GameEvent::Highlight { spin_id, highlight };
                    }
                }
                Signal::Animation(AnimationEvent::Resolved(_)) => {
                    if let Some(active) = self.active.take_if(|a| a.id == spin_id) {
                        return GameEvent::Settled(self.settle(active));
                    }
                }
                Signal::Message(text) => {
                    if self.message_task.as_ref().is_some_and(|(id, _)| *id == spin_id) {
                        self.message_task = None;
                        return GameEvent::Message { spin_id, text };
                    }
                }
            }
            debug!(spin_id, "dropping event from an inactive spin");
        }
    }

    fn is_active(&self, spin_id: SpinId) -> bool {
        self.active.as_ref().is_some_and(|a| a.id == spin_id)
    }

    fn settle(&mut self, active: ActiveSpin) -> Settlement {
        let ActiveSpin { id, prize, .. } = active;
        let outcome = SpinOutcome::new(prize);
        self.history.record(&outcome, Utc::now());

        let message = if outcome.is_loss {
            info!(spin_id = id, prize = %outcome.prize.label, "spin settled on a loss");
            MessageState::Ready(self.config.loss_message.clone())
        } else {
            info!(spin_id = id, prize = %outcome.prize.label, "spin settled on a win");
            self.request_message(id, outcome.prize.label.clone());
            MessageState::Pending
        };

        Settlement {
            spin_id: id,
            outcome,
            message,
        }
    }

    fn request_message(&mut self, spin_id: SpinId, label: String) {
        if let Some((_, previous)) = self.message_task.take() {
            previous.abort();
        }
        let messages = Arc::clone(&self.messages);
        let fallback = self.config.fallback_message.clone();
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let text = match messages.generate(&label).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => {
                    warn!(prize = %label, "message generator returned nothing; using fallback");
                    fallback
                }
                Err(e) => {
                    warn!(prize = %label, error = %e, "message generation failed; using fallback");
                    fallback
                }
            };
            let _ = tx.send(Envelope {
                spin_id,
                signal: Signal::Message(text),
            });
        });
        self.message_task = Some((spin_id, handle));
    }
}

impl<W, P, M, S> GameController<W, P, M, S> {
    /// Stops the running animation and any pending message request. No
    /// further events are produced for them and no state changes.
    pub fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            active.task.cancel();
            info!(spin_id = active.id, "spin cancelled");
        }
        if let Some((_, handle)) = self.message_task.take() {
            handle.abort();
        }
    }
}

impl<W, P, M, S> Drop for GameController<W, P, M, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
