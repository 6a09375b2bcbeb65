//! Wire representations of requests and responses.
//!
//! Requests are loosely typed on purpose: every field is checked here and
//! all problems are reported together before a domain command is built.
//! Money goes out as a decimal number (e.g. `9.98`).

use std::collections::HashSet;

use common::{CategoryId, MarketId, OptionGroupId, ProductId, UserId};
use domain::{
    Address, Cart, CartOrder, Category, Coordinates, Market, OptionElement, OptionGroup,
    OptionSelection, PickProduct, Product, ProductInstance, ProductRecord, ResolvedOptionGroup,
    SelectedElement,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, FieldError};

// -- Request types --

/// Body of `POST /cart/products`.
#[derive(Debug, Clone, Deserialize)]
pub struct PickProductRequest {
    #[serde(rename = "productID", default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub options: Vec<OptionRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionRequest {
    #[serde(rename = "groupID", default)]
    pub group_id: String,
    #[serde(default)]
    pub selected: Vec<SelectedRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedRequest {
    #[serde(rename = "elementID", default)]
    pub element_id: String,
    #[serde(default)]
    pub quantity: i64,
}

impl PickProductRequest {
    /// Validates every field and builds the command.
    pub fn into_command(self) -> Result<PickProduct, ApiError> {
        let mut errors = Vec::new();

        if self.product_id.trim().is_empty() {
            errors.push(FieldError::new("productID", "must not be empty"));
        }
        let quantity = positive_quantity("quantity", self.quantity, &mut errors);

        let mut seen = HashSet::new();
        let mut options = Vec::with_capacity(self.options.len());
        for (i, option) in self.options.into_iter().enumerate() {
            let group_field = format!("options[{i}].groupID");
            if option.group_id.trim().is_empty() {
                errors.push(FieldError::new(&group_field, "must not be empty"));
            } else if !seen.insert(option.group_id.clone()) {
                errors.push(FieldError::new(&group_field, "group selected more than once"));
            }

            let mut selected = Vec::with_capacity(option.selected.len());
            for (j, pick) in option.selected.into_iter().enumerate() {
                if pick.element_id.trim().is_empty() {
                    errors.push(FieldError::new(
                        format!("options[{i}].selected[{j}].elementID"),
                        "must not be empty",
                    ));
                }
                let qty = non_negative_quantity(
                    &format!("options[{i}].selected[{j}].quantity"),
                    pick.quantity,
                    &mut errors,
                );
                selected.push(SelectedElement::new(pick.element_id, qty));
            }

            options.push(OptionSelection::new(option.group_id, selected));
        }

        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        Ok(PickProduct {
            product_id: ProductId::new(self.product_id),
            quantity,
            options,
        })
    }
}

fn positive_quantity(field: &str, value: i64, errors: &mut Vec<FieldError>) -> u32 {
    if value <= 0 {
        errors.push(FieldError::new(field, "must be greater than 0"));
        return 0;
    }
    u32::try_from(value).unwrap_or_else(|_| {
        errors.push(FieldError::new(field, "is too large"));
        0
    })
}

fn non_negative_quantity(field: &str, value: i64, errors: &mut Vec<FieldError>) -> u32 {
    if value < 0 {
        errors.push(FieldError::new(field, "must not be negative"));
        return 0;
    }
    u32::try_from(value).unwrap_or_else(|_| {
        errors.push(FieldError::new(field, "is too large"));
        0
    })
}

/// Body of `PUT /cart/address`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    #[serde(default)]
    pub name: String,
    pub coordinates: CoordinatesDto,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub person_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address_reference: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoordinatesDto {
    pub lat: f64,
    pub lng: f64,
}

impl AddressRequest {
    /// Validates every field and builds the address.
    pub fn into_address(self) -> Result<Address, ApiError> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("name", &self.name),
            ("phoneNumber", &self.phone_number),
            ("personName", &self.person_name),
        ] {
            if value.trim().is_empty() {
                errors.push(FieldError::new(field, "must not be empty"));
            }
        }
        if !(-90.0..=90.0).contains(&self.coordinates.lat) {
            errors.push(FieldError::new("coordinates.lat", "must be between -90 and 90"));
        }
        if !(-180.0..=180.0).contains(&self.coordinates.lng) {
            errors.push(FieldError::new(
                "coordinates.lng",
                "must be between -180 and 180",
            ));
        }

        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        Ok(Address {
            name: self.name,
            coordinates: Coordinates {
                lat: self.coordinates.lat,
                lng: self.coordinates.lng,
            },
            phone_number: self.phone_number,
            person_name: self.person_name,
            description: self.description,
            address_reference: self.address_reference,
        })
    }
}

/// Query of `GET /markets/{id}/products`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
    #[serde(default)]
    pub subproducts: bool,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub user: Option<UserId>,
    pub address: Option<AddressResponse>,
    pub total: f64,
    pub orders: Vec<CartOrderResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    pub name: String,
    pub coordinates: CoordinatesDto,
    pub phone_number: String,
    pub person_name: String,
    pub description: Option<String>,
    pub address_reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CartOrderResponse {
    pub market: MarketId,
    pub subtotal: f64,
    pub delivery: f64,
    pub total: f64,
    pub products: Vec<ProductInstanceResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInstanceResponse {
    #[serde(rename = "productID")]
    pub product_id: ProductId,
    #[serde(rename = "externalID")]
    pub external_id: Option<String>,
    pub name: String,
    pub market: MarketId,
    pub price: f64,
    pub unit_price: f64,
    pub quantity: u32,
    pub total: f64,
    pub options: Vec<OptionGroupResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionGroupResponse {
    pub id: OptionGroupId,
    #[serde(rename = "type")]
    pub control_type: String,
    pub label: String,
    pub iterable: bool,
    pub min: u32,
    pub max: u32,
    pub uses_price: bool,
    pub required: bool,
    pub elements: Vec<OptionElementResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<Vec<SelectedResponse>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionElementResponse {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub is_available: bool,
}

#[derive(Debug, Serialize)]
pub struct SelectedResponse {
    #[serde(rename = "elementID")]
    pub element_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: ProductId,
    #[serde(rename = "externalID")]
    pub external_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: u32,
    pub is_available: bool,
    pub is_subproduct: bool,
    pub market: MarketId,
    pub categories: Vec<CategoryId>,
    pub options: Vec<OptionGroupResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummaryResponse {
    pub id: ProductId,
    #[serde(rename = "externalID")]
    pub external_id: Option<String>,
    pub name: String,
    pub price: f64,
    pub is_available: bool,
    pub is_subproduct: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketResponse {
    pub id: MarketId,
    pub name: String,
    pub logo: Option<String>,
    pub address: Option<String>,
    pub has_free_delivery: bool,
    pub estimated_time: Option<u32>,
    pub categories: Vec<CategoryId>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub market: Option<MarketId>,
    pub parent: Option<CategoryId>,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            user: cart.user().cloned(),
            address: cart.address().map(AddressResponse::from),
            total: cart.total().as_major(),
            orders: cart.orders().iter().map(CartOrderResponse::from).collect(),
        }
    }
}

impl From<&Address> for AddressResponse {
    fn from(address: &Address) -> Self {
        Self {
            name: address.name.clone(),
            coordinates: CoordinatesDto {
                lat: address.coordinates.lat,
                lng: address.coordinates.lng,
            },
            phone_number: address.phone_number.clone(),
            person_name: address.person_name.clone(),
            description: address.description.clone(),
            address_reference: address.address_reference.clone(),
        }
    }
}

impl From<&CartOrder> for CartOrderResponse {
    fn from(order: &CartOrder) -> Self {
        Self {
            market: order.market.clone(),
            subtotal: order.subtotal.as_major(),
            delivery: order.delivery.as_major(),
            total: order.total.as_major(),
            products: order
                .products
                .iter()
                .map(ProductInstanceResponse::from)
                .collect(),
        }
    }
}

impl From<&ProductInstance> for ProductInstanceResponse {
    fn from(instance: &ProductInstance) -> Self {
        Self {
            product_id: instance.product_id.clone(),
            external_id: instance.external_id.clone(),
            name: instance.name.clone(),
            market: instance.market.clone(),
            price: instance.base_price.as_major(),
            unit_price: instance.unit_price.as_major(),
            quantity: instance.quantity,
            total: instance.total.as_major(),
            options: instance
                .options
                .iter()
                .map(OptionGroupResponse::from)
                .collect(),
        }
    }
}

impl From<&OptionGroup> for OptionGroupResponse {
    fn from(group: &OptionGroup) -> Self {
        Self {
            id: group.id.clone(),
            control_type: group.control_type.clone(),
            label: group.label.clone(),
            iterable: group.iterable,
            min: group.min,
            max: group.max,
            uses_price: group.uses_price,
            required: group.required,
            elements: group
                .elements
                .iter()
                .map(OptionElementResponse::from)
                .collect(),
            selected: None,
        }
    }
}

impl From<&ResolvedOptionGroup> for OptionGroupResponse {
    fn from(resolved: &ResolvedOptionGroup) -> Self {
        Self {
            selected: Some(
                resolved
                    .selected
                    .iter()
                    .map(|s| SelectedResponse {
                        element_id: s.element_id.clone(),
                        quantity: s.quantity,
                    })
                    .collect(),
            ),
            ..OptionGroupResponse::from(&resolved.group)
        }
    }
}

impl From<&OptionElement> for OptionElementResponse {
    fn from(element: &OptionElement) -> Self {
        Self {
            id: element.id.clone(),
            name: element.name.clone(),
            price: element.price.as_major(),
            is_available: element.is_available,
        }
    }
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            options: product.options.iter().map(OptionGroupResponse::from).collect(),
            id: product.id,
            external_id: product.external_id,
            name: product.name,
            description: product.description,
            price: product.price.as_major(),
            stock: product.stock,
            is_available: product.is_available,
            is_subproduct: product.is_subproduct,
            market: product.market,
            categories: product.categories,
        }
    }
}

impl From<ProductRecord> for ProductSummaryResponse {
    fn from(record: ProductRecord) -> Self {
        Self {
            id: record.id,
            external_id: record.external_id,
            name: record.name,
            price: record.price.as_major(),
            is_available: record.is_available,
            is_subproduct: record.is_subproduct,
        }
    }
}

impl From<Market> for MarketResponse {
    fn from(market: Market) -> Self {
        Self {
            id: market.id,
            name: market.name,
            logo: market.logo,
            address: market.address,
            has_free_delivery: market.has_free_delivery,
            estimated_time: market.estimated_time,
            categories: market.categories,
        }
    }
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            market: category.market,
            parent: category.parent,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> PickProductRequest {
        serde_json::from_value(value).unwrap()
    }

    fn validation_fields(err: ApiError) -> Vec<String> {
        match err {
            ApiError::Validation(fields) => fields.into_iter().map(|f| f.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_request_becomes_command() {
        let request = parse(json!({
            "productID": "pizza",
            "quantity": 2,
            "options": [{ "groupID": "toppings", "selected": [{ "elementID": "olive", "quantity": 2 }] }]
        }));

        let cmd = request.into_command().unwrap();

        assert_eq!(cmd.product_id, ProductId::new("pizza"));
        assert_eq!(cmd.quantity, 2);
        assert_eq!(cmd.options[0].group_id, OptionGroupId::new("toppings"));
        assert_eq!(cmd.options[0].selected[0], SelectedElement::new("olive", 2));
    }

    #[test]
    fn test_options_are_optional() {
        let cmd = parse(json!({ "productID": "soda", "quantity": 1 }))
            .into_command()
            .unwrap();
        assert!(cmd.options.is_empty());
    }

    #[test]
    fn test_all_field_errors_are_collected() {
        let request = parse(json!({
            "productID": " ",
            "quantity": 0,
            "options": [
                { "groupID": "g1", "selected": [{ "elementID": "", "quantity": -1 }] },
                { "groupID": "g1", "selected": [] },
                { "groupID": "", "selected": [] }
            ]
        }));

        let fields = validation_fields(request.into_command().unwrap_err());

        assert_eq!(
            fields,
            vec![
                "productID",
                "quantity",
                "options[0].selected[0].elementID",
                "options[0].selected[0].quantity",
                "options[1].groupID",
                "options[2].groupID",
            ]
        );
    }

    #[test]
    fn test_missing_quantity_is_rejected() {
        let fields = validation_fields(
            parse(json!({ "productID": "soda" }))
                .into_command()
                .unwrap_err(),
        );
        assert_eq!(fields, vec!["quantity"]);
    }

    #[test]
    fn test_oversized_quantity_is_rejected() {
        let fields = validation_fields(
            parse(json!({ "productID": "soda", "quantity": 5_000_000_000_i64 }))
                .into_command()
                .unwrap_err(),
        );
        assert_eq!(fields, vec!["quantity"]);
    }

    #[test]
    fn test_address_validation() {
        let request: AddressRequest = serde_json::from_value(json!({
            "name": "",
            "coordinates": { "lat": 95.0, "lng": 10.0 },
            "phoneNumber": "555",
            "personName": "Sam"
        }))
        .unwrap();

        let fields = validation_fields(request.into_address().unwrap_err());
        assert_eq!(fields, vec!["name", "coordinates.lat"]);
    }

    #[test]
    fn test_address_request_becomes_address() {
        let request: AddressRequest = serde_json::from_value(json!({
            "name": "Office",
            "coordinates": { "lat": 10.49, "lng": -66.87 },
            "phoneNumber": "555-0101",
            "personName": "Alex",
            "addressReference": "Third floor"
        }))
        .unwrap();

        let address = request.into_address().unwrap();
        assert_eq!(address.address_reference.as_deref(), Some("Third floor"));
        assert!(address.description.is_none());
    }
}
