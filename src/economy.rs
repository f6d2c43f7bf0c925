use crate::error::GameError;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EconomyState {
    pub ticket_balance: u32,
    pub cumulative_spend: u64,
}

/// Ticket balance and pity-timer spend. Only the spend is durable; the
/// balance belongs to the current wallet session.
#[derive(Clone, Debug)]
pub struct Economy {
    state: EconomyState,
    ticket_price: u64,
}

impl Economy {
    pub fn new(ticket_price: u64) -> Self {
        Self::restore(ticket_price, 0)
    }

    pub fn restore(ticket_price: u64, cumulative_spend: u64) -> Self {
        Self {
            state: EconomyState {
                ticket_balance: 0,
                cumulative_spend,
            },
            ticket_price,
        }
    }

    pub fn state(&self) -> EconomyState {
        self.state
    }

    pub fn ticket_balance(&self) -> u32 {
        self.state.ticket_balance
    }

    pub fn cumulative_spend(&self) -> u64 {
        self.state.cumulative_spend
    }

    pub fn ticket_price(&self) -> u64 {
        self.ticket_price
    }

    pub fn consume_ticket(&mut self) -> Result<EconomyState, GameError> {
        if self.state.ticket_balance == 0 {
            return Err(GameError::InsufficientTickets);
        }
        self.state.ticket_balance -= 1;
        self.state.cumulative_spend =
            self.state.cumulative_spend.saturating_add(self.ticket_price);
        Ok(self.state)
    }

    pub fn apply_pity_reset(&mut self) {
        self.state.cumulative_spend = 0;
    }

    pub fn credit_tickets(&mut self, quantity: u32) {
        self.state.ticket_balance = self.state.ticket_balance.saturating_add(quantity);
    }

    pub fn on_identity_change(&mut self) {
        self.state.ticket_balance = 0;
    }
}
