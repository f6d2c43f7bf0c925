use crate::ui;
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use lucky_grid::{
    GameController,
    GameError,
    GameEvent,
    GameSnapshot,
    MessageState,
    PrizeCatalog,
    PrizeEntry,
    animator::Highlight,
    config::GameConfig,
    controller::SpinId,
    services::{
        LocalWallet,
        PrepaidPayment,
        TemplateMessages,
    },
    store::FileStore,
};
use std::path::PathBuf;

pub const DEFAULT_FUNDS: u64 = 500;

const MAX_ERRORS: usize = 50;

pub struct AppConfig {
    pub data_dir: PathBuf,
    pub config_path: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub wallet: Option<String>,
    pub funds: u64,
}

type Controller = GameController<LocalWallet, PrepaidPayment, TemplateMessages, FileStore>;

#[derive(Clone, Debug)]
pub struct ResultBanner {
    pub spin_id: SpinId,
    pub prize: PrizeEntry,
    pub is_loss: bool,
    /// `None` while the win message is still being generated.
    pub message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub game: GameSnapshot,
    pub highlight: Option<Highlight>,
    pub ticket_price: u64,
    pub max_purchase: u32,
    pub funds: u64,
    pub status: String,
    pub result: Option<ResultBanner>,
    pub errors: Vec<String>,
}

pub struct AppController {
    game: Controller,
    payment: PrepaidPayment,
    highlight: Option<Highlight>,
    status: String,
    result: Option<ResultBanner>,
    errors: Vec<String>,
}

impl AppController {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let game_config = match &config.config_path {
            Some(path) => GameConfig::load(path)
                .wrap_err_with(|| format!("loading game config from {}", path.display()))?,
            None => GameConfig::default(),
        };
        let catalog = match &config.catalog_path {
            Some(path) => PrizeCatalog::load(path)
                .wrap_err_with(|| format!("loading prize catalog from {}", path.display()))?,
            None => PrizeCatalog::default(),
        };
        let store = FileStore::open(&config.data_dir).wrap_err_with(|| {
            format!("opening data directory {}", config.data_dir.display())
        })?;
        let payment = PrepaidPayment::new(config.funds);
        let game = GameController::new(
            game_config,
            catalog,
            store,
            LocalWallet::new(config.wallet.clone()),
            payment.clone(),
            TemplateMessages,
        )
        .wrap_err("invalid game config")?;
        Ok(Self {
            game,
            payment,
            highlight: None,
            status: "Connect a wallet with 'c' to start".to_string(),
            result: None,
            errors: Vec::new(),
        })
    }

    pub fn snapshot(&self) -> AppSnapshot {
        let config = self.game.config();
        AppSnapshot {
            game: self.game.snapshot(),
            highlight: self.highlight,
            ticket_price: config.ticket_price,
            max_purchase: config.max_purchase,
            funds: self.payment.player_funds(),
            status: self.status.clone(),
            result: self.result.clone(),
            errors: self.errors.clone(),
        }
    }

    pub async fn connect(&mut self) {
        match self.game.connect_wallet().await {
            Ok(address) => self.status = format!("Connected {address}"),
            Err(e) => self.push_error(wallet_failure(&e)),
        }
    }

    pub fn disconnect(&mut self) {
        self.game.disconnect_wallet();
        self.status = "Wallet disconnected".to_string();
    }

    pub async fn purchase(&mut self, quantity: u32) {
        match self.game.purchase_tickets(quantity).await {
            Ok(state) => {
                self.status = format!(
                    "Bought {quantity} ticket(s); {} available",
                    state.ticket_balance
                )
            }
            Err(e) => self.push_error(e.to_string()),
        }
    }

    /// Returns true when the player has to buy tickets first.
    pub fn spin(&mut self) -> bool {
        match self.game.request_spin() {
            Ok(started) => {
                self.result = None;
                self.status = format!(
                    "Spinning... {} ticket(s) left",
                    started.economy.ticket_balance
                );
                false
            }
            Err(e) if e.needs_purchase() => {
                self.status = "Out of tickets".to_string();
                true
            }
            Err(GameError::SpinInProgress) => false,
            Err(e) => {
                self.push_error(format!("Spin failed: {e}"));
                false
            }
        }
    }

    pub fn dismiss_result(&mut self) {
        self.result = None;
    }

    pub fn apply(&mut self, event: GameEvent) {
        match event {
            GameEvent::Highlight { highlight, .. } => self.highlight = Some(highlight),
            GameEvent::Settled(settlement) => {
                let outcome = settlement.outcome;
                let message = match settlement.message {
                    MessageState::Ready(text) => Some(text),
                    MessageState::Pending => None,
                };
                self.status = if outcome.is_loss {
                    format!("Landed on {}", outcome.prize.label)
                } else {
                    format!("Won {}!", outcome.prize.label)
                };
                self.result = Some(ResultBanner {
                    spin_id: settlement.spin_id,
                    prize: outcome.prize,
                    is_loss: outcome.is_loss,
                    message,
                });
            }
            GameEvent::Message { spin_id, text } => {
                if let Some(result) = self.result.as_mut().filter(|r| r.spin_id == spin_id) {
                    result.message = Some(text);
                }
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.game.teardown();
    }

    fn push_error(&mut self, message: String) {
        tracing::error!("{}", message);
        self.errors.push(message);
        if self.errors.len() > MAX_ERRORS {
            let drain = self.errors.len() - MAX_ERRORS;
            self.errors.drain(0..drain);
        }
    }
}

fn wallet_failure(error: &GameError) -> String {
    match error {
        GameError::Wallet(lucky_grid::error::ServiceError::Rejected(_)) => {
            "You rejected the connection.".to_string()
        }
        GameError::Wallet(lucky_grid::error::ServiceError::NotFound(_)) => {
            "No accounts found.".to_string()
        }
        other => other.to_string(),
    }
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let controller = AppController::new(&config)?;
    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    ui::terminal_enter(&mut ui_state)?;
    tracing::info!("UI ready");
    let res = run_loop(controller, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

async fn run_loop(
    mut controller: AppController,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEvents,
) -> Result<()> {
    ui::draw(ui_state, &controller.snapshot())?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => { break; }
            event = controller.game.next_event() => controller.apply(event),
            ev = ui::next_event(ui_state, input_events) => {
                match ev? {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Spin => {
                        if controller.spin() {
                            ui::open_purchase(ui_state);
                        }
                    }
                    ui::UserEvent::Connect => controller.connect().await,
                    ui::UserEvent::Disconnect => controller.disconnect(),
                    ui::UserEvent::ConfirmPurchase(quantity) => controller.purchase(quantity).await,
                    ui::UserEvent::DismissResult => controller.dismiss_result(),
                    ui::UserEvent::Redraw => {}
                }
            }
        }
        ui::draw(ui_state, &controller.snapshot()).wrap_err("draw failed")?;
    }
    controller.shutdown();
    Ok(())
}
