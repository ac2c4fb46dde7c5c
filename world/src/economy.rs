//! Player currency ledger.

/// Single-balance ledger whose balance never drops below zero.
#[derive(Clone, Debug)]
pub(crate) struct Economy {
    balance: u32,
    starting_capital: u32,
    infinite: bool,
}

impl Economy {
    /// Creates a ledger holding the starting capital.
    pub(crate) fn new(starting_capital: u32, infinite: bool) -> Self {
        Self {
            balance: starting_capital,
            starting_capital,
            infinite,
        }
    }

    /// Restores the balance to the starting capital.
    pub(crate) fn reset(&mut self) {
        self.balance = self.starting_capital;
    }

    /// Current balance.
    pub(crate) fn balance(&self) -> u32 {
        self.balance
    }

    /// Reports whether the balance covers the provided amount.
    pub(crate) fn can_afford(&self, amount: u32) -> bool {
        self.infinite || amount <= self.balance
    }

    /// Credits the provided amount.
    pub(crate) fn earn(&mut self, amount: u32) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Debits the provided amount, returning `false` without touching the
    /// balance when it does not cover the request.
    pub(crate) fn spend(&mut self, amount: u32) -> bool {
        if self.infinite {
            return true;
        }

        match self.balance.checked_sub(amount) {
            Some(remaining) => {
                self.balance = remaining;
                true
            }
            None => false,
        }
    }
}
