//! Order and cart totals.
//!
//! Totals are always rebuilt from the line totals below them. Nothing keeps
//! a running sum, so a partial update can never leave a stale total behind.

use crate::money::Money;

use super::value_objects::{CartOrder, ProductInstance};

/// Sum of the product instance totals.
pub fn order_total(products: &[ProductInstance]) -> Money {
    products.iter().map(|p| p.total).sum()
}

/// Sum of the order totals.
pub fn cart_total(orders: &[CartOrder]) -> Money {
    orders.iter().map(|o| o.total).sum()
}

/// Recomputes an order's subtotal and total from its products.
pub(crate) fn refresh_order(order: &mut CartOrder) {
    order.subtotal = order_total(&order.products);
    order.total = order.subtotal + order.delivery;
}

#[cfg(test)]
mod tests {
    use common::{MarketId, ProductId};

    use super::*;

    fn instance(id: &str, total: i64) -> ProductInstance {
        ProductInstance {
            product_id: ProductId::new(id),
            external_id: None,
            name: id.to_string(),
            market: MarketId::new("m1"),
            base_price: Money::from_cents(total),
            unit_price: Money::from_cents(total),
            quantity: 1,
            total: Money::from_cents(total),
            options: vec![],
        }
    }

    #[test]
    fn test_order_total_sums_products() {
        let products = vec![instance("a", 998), instance("b", 250)];
        assert_eq!(order_total(&products).cents(), 1248);
        assert!(order_total(&[]).is_zero());
    }

    #[test]
    fn test_refresh_order_overwrites_stale_totals() {
        let mut order = CartOrder::new(MarketId::new("m1"));
        order.subtotal = Money::from_cents(12345);
        order.total = Money::from_cents(12345);
        order.products = vec![instance("a", 250)];

        refresh_order(&mut order);

        assert_eq!(order.subtotal.cents(), 250);
        assert_eq!(order.total, order.subtotal);
    }

    #[test]
    fn test_cart_total_sums_orders() {
        let mut first = CartOrder::new(MarketId::new("m1"));
        first.products = vec![instance("a", 998)];
        refresh_order(&mut first);

        let mut second = CartOrder::new(MarketId::new("m2"));
        second.products = vec![instance("b", 1)];
        refresh_order(&mut second);

        assert_eq!(cart_total(&[first, second]).cents(), 999);
        assert!(cart_total(&[]).is_zero());
    }
}
