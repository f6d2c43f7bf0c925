use crate::{
    catalog::PrizeCatalog,
    error::ConfigurationError,
};
use rand::Rng;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SpinDecision {
    pub winning_index: usize,
    pub updated_spend: u64,
    /// Spend crossed the threshold: the spin wins and the spend resets.
    pub forced_win: bool,
}

/// Decides the spin before any animation runs. Below the threshold a loss
/// entry is drawn; at or above it a win entry is drawn and the spend resets.
pub fn select<R: Rng>(
    catalog: &PrizeCatalog,
    prior_spend: u64,
    ticket_price: u64,
    win_threshold: u64,
    rng: &mut R,
) -> Result<SpinDecision, ConfigurationError> {
    let current_spend = prior_spend.saturating_add(ticket_price);
    let forced_win = current_spend >= win_threshold;

    let (candidates, missing) = if forced_win {
        (catalog.win_indices(), ConfigurationError::MissingWinEntries)
    } else {
        (catalog.loss_indices(), ConfigurationError::MissingLossEntries)
    };
    if candidates.is_empty() {
        return Err(missing);
    }

    let winning_index = candidates[rng.random_range(0..candidates.len())];
    let updated_spend = if forced_win { 0 } else { current_spend };

    tracing::debug!(
        prior_spend,
        current_spend,
        winning_index,
        forced_win,
        "spin decided"
    );

    Ok(SpinDecision {
        winning_index,
        updated_spend,
        forced_win,
    })
}
