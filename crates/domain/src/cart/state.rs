//! Lifecycle of a cart order.

use serde::{Deserialize, Serialize};

/// Where a market's order stands inside a cart.
///
/// ```text
/// Absent ──(first product added)──► Created ──► Populated
///    ▲                                              │
///    └──────────(last product removed)──────────────┘
/// ```
///
/// `Created` only exists between opening an order and inserting its first
/// product within the same change, so a stored cart never holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderState {
    /// The cart has no order for the market.
    Absent,
    /// The order exists but holds no products.
    Created,
    /// The order holds at least one product.
    Populated,
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderState::Absent => write!(f, "Absent"),
            OrderState::Created => write!(f, "Created"),
            OrderState::Populated => write!(f, "Populated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(OrderState::Populated.to_string(), "Populated");
    }
}
