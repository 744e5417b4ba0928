use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single recorded monetary movement. Positive amounts are income,
/// negative amounts are expenses; zero is rejected before construction.
/// The persisted form is `{"id": number, "description": string, "amount": number}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u32,
    pub description: String,
    pub amount: Decimal,
}

impl Transaction {
    pub fn new(id: u32, description: String, amount: Decimal) -> Self {
        Self {
            id,
            description,
            amount,
        }
    }

    pub fn is_income(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}
