use serde::{Deserialize, Serialize};

/// Decides whether BarterPay is offered as a payment method for a particular cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayAvailability {
    /// Shipping rate ids (`method:instance`) or bare method ids for which the gateway is offered. Empty means "any".
    pub enable_for_methods: Vec<String>,
    /// Whether the gateway is offered for carts that need no shipping at all.
    pub enable_for_virtual: bool,
}

/// The parts of a cart that affect gateway availability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartContext {
    pub needs_shipping: bool,
    #[serde(default)]
    pub chosen_rate_ids: Vec<String>,
}

impl GatewayAvailability {
    pub fn new(enable_for_methods: Vec<String>, enable_for_virtual: bool) -> Self {
        Self { enable_for_methods, enable_for_virtual }
    }

    pub fn is_available(&self, cart: &CartContext) -> bool {
        if !cart.needs_shipping {
            return self.enable_for_virtual;
        }
        if self.enable_for_methods.is_empty() {
            return true;
        }
        cart.chosen_rate_ids.iter().map(|r| r.trim()).any(|rate_id| {
            let method = rate_id.split(':').next().unwrap_or(rate_id);
            self.enable_for_methods.iter().any(|m| m == rate_id || m == method)
        })
    }
}
