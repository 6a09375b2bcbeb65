//! Line pricing for a product instance.

use crate::money::Money;

use super::CartError;
use super::value_objects::ResolvedOptionGroup;

/// Computes `(base + priced option surcharges) * quantity`.
///
/// Only groups with `uses_price` contribute. Each selected element adds its
/// price times its selected quantity. A selected element that is not among
/// the group's elements means the stored option data is inconsistent and
/// fails with `UnresolvedOptionElement`. A result that doesn't fit in
/// `Money` fails with `PriceOutOfRange`.
pub fn price(
    base: Money,
    quantity: u32,
    groups: &[ResolvedOptionGroup],
) -> Result<Money, CartError> {
    let mut unit = base;

    for resolved in groups.iter().filter(|g| g.group.uses_price) {
        for selected in &resolved.selected {
            let element = resolved.group.element(&selected.element_id).ok_or_else(|| {
                CartError::UnresolvedOptionElement {
                    group_id: resolved.group.id.clone(),
                    element_id: selected.element_id.clone(),
                }
            })?;
            unit = element
                .price
                .checked_multiply(selected.quantity)
                .and_then(|surcharge| unit.checked_add(surcharge))
                .ok_or(CartError::PriceOutOfRange)?;
        }
    }

    unit.checked_multiply(quantity)
        .ok_or(CartError::PriceOutOfRange)
}
