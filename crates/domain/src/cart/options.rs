//! Option selection: validates a user's picks against a product's groups.

use crate::catalog::OptionGroup;

use super::CartError;
use super::value_objects::{OptionSelection, ResolvedOptionGroup};

/// Resolves the requested selections against the product's option groups.
///
/// Every defined group appears in the output, in definition order, with
/// `selected` empty when it was skipped. Requests for groups the product
/// doesn't define are ignored; when a group is requested twice the first
/// request wins.
///
/// A non-required group is skipped when it has no request or when its
/// request selects nothing. Otherwise the summed quantity must lie within
/// `min..=max` and every element must belong to the group.
pub fn resolve_selections(
    groups: &[OptionGroup],
    requested: &[OptionSelection],
) -> Result<Vec<ResolvedOptionGroup>, CartError> {
    groups
        .iter()
        .map(|group| resolve_group(group, requested))
        .collect()
}

fn resolve_group(
    group: &OptionGroup,
    requested: &[OptionSelection],
) -> Result<ResolvedOptionGroup, CartError> {
    let Some(selection) = requested.iter().find(|s| s.group_id == group.id) else {
        if group.required {
            return Err(CartError::MissingRequiredOption {
                group_id: group.id.clone(),
                label: group.label.clone(),
            });
        }
        return Ok(ResolvedOptionGroup::skipped(group.clone()));
    };

    let total = selection.total_quantity();

    if total == 0 && !group.required {
        return Ok(ResolvedOptionGroup::skipped(group.clone()));
    }

    if total < group.min || total > group.max {
        return Err(CartError::OptionQuantityOutOfBounds {
            group_id: group.id.clone(),
            label: group.label.clone(),
            min: group.min,
            max: group.max,
            actual: total,
        });
    }

    if let Some(unknown) = selection
        .selected
        .iter()
        .find(|s| group.element(&s.element_id).is_none())
    {
        return Err(CartError::UnknownOptionElement {
            group_id: group.id.clone(),
            element_id: unknown.element_id.clone(),
        });
    }

    Ok(ResolvedOptionGroup {
        group: group.clone(),
        selected: selection.selected.clone(),
    })
}
