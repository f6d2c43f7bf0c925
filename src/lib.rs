pub mod animator;

pub mod catalog;

pub mod config;

pub mod controller;

pub mod economy;

pub mod error;

pub mod history;

pub mod outcome;

pub mod services;

pub mod store;

pub mod test_helpers;

pub use catalog::{
    PrizeCatalog,
    PrizeEntry,
};
pub use config::GameConfig;
pub use controller::{
    GameController,
    GameEvent,
    GameSnapshot,
    MessageState,
    Settlement,
    SpinStarted,
};
pub use error::{
    GameError,
    Result,
};
