use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pricing::price_per_unit;
use super::wire;

/// Unit of measure for a product's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    #[serde(rename = "kg")]
    Kg,
    Bag,
    Pac,
    Lit,
}

impl Unit {
    pub const ALL: [Unit; 4] = [Unit::Kg, Unit::Bag, Unit::Pac, Unit::Lit];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Bag => "Bag",
            Unit::Pac => "Pac",
            Unit::Lit => "Lit",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::ALL
            .into_iter()
            .find(|unit| unit.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown unit {:?} (expected one of kg, Bag, Pac, Lit)", s))
    }
}

/// Represents a product in the catalog, as held by the catalog store.
///
/// `price_per_unit` is derived from `cost_price` and `quantity`. Whatever value the
/// service sends for it is ignored; call [`Product::refresh_derived`] after any change
/// to the two source fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProductRecord")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    #[serde(rename = "costprice")]
    pub cost_price: f64,
    #[serde(rename = "sellprice", skip_serializing_if = "Option::is_none")]
    pub sell_price: Option<f64>,
    #[serde(rename = "shopname")]
    pub shop_name: String,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "pricePerQuantity")]
    pub price_per_unit: f64,
}

/// A product exactly as the service stores it. Documents may carry `_id`, `id`,
/// or both (when virtuals are serialized); `_id` wins.
#[derive(Deserialize)]
struct ProductRecord {
    #[serde(rename = "_id", default)]
    document_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default, deserialize_with = "wire::text")]
    name: String,
    #[serde(deserialize_with = "wire::number")]
    quantity: f64,
    #[serde(default, deserialize_with = "wire::unit")]
    unit: Unit,
    #[serde(rename = "costprice", deserialize_with = "wire::number")]
    cost_price: f64,
    #[serde(rename = "sellprice", default, deserialize_with = "wire::optional_number")]
    sell_price: Option<f64>,
    #[serde(rename = "shopname", default, deserialize_with = "wire::text")]
    shop_name: String,
    #[serde(rename = "createdAt", default, deserialize_with = "wire::optional_timestamp")]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProductRecord> for Product {
    type Error = String;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        let id = record
            .document_id
            .or(record.id)
            .ok_or_else(|| format!("product {:?} has no id", record.name))?;
        let fields = ProductFields {
            name: record.name,
            quantity: record.quantity,
            unit: record.unit,
            cost_price: record.cost_price,
            sell_price: record.sell_price,
            shop_name: record.shop_name,
            price_per_unit: 0.0,
        };
        Ok(Product::from_fields(id, fields, record.created_at))
    }
}

impl Product {
    /// Builds a product from a service-assigned id and a field set.
    pub fn from_fields(id: impl Into<String>, fields: ProductFields, created_at: Option<DateTime<Utc>>) -> Self {
        let mut product = Self {
            id: id.into(),
            name: fields.name,
            quantity: fields.quantity,
            unit: fields.unit,
            cost_price: fields.cost_price,
            sell_price: fields.sell_price,
            shop_name: fields.shop_name,
            created_at,
            price_per_unit: 0.0,
        };
        product.refresh_derived();
        product
    }

    /// Recomputes the derived unit price from the current cost and quantity.
    pub fn refresh_derived(&mut self) {
        self.price_per_unit = price_per_unit(self.cost_price, self.quantity);
    }

    /// The editable field set of this product, without its id or timestamp.
    pub fn fields(&self) -> ProductFields {
        ProductFields {
            name: self.name.clone(),
            quantity: self.quantity,
            unit: self.unit,
            cost_price: self.cost_price,
            sell_price: self.sell_price,
            shop_name: self.shop_name.clone(),
            price_per_unit: self.price_per_unit,
        }
    }

    /// Merges every field present in `patch` over this record and refreshes the
    /// derived price. The id is never touched.
    pub fn apply(&mut self, patch: &ProductPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(unit) = patch.unit {
            self.unit = unit;
        }
        if let Some(cost_price) = patch.cost_price {
            self.cost_price = cost_price;
        }
        if let Some(sell_price) = patch.sell_price {
            self.sell_price = Some(sell_price);
        }
        if let Some(shop_name) = &patch.shop_name {
            self.shop_name = shop_name.clone();
        }
        if let Some(created_at) = patch.created_at {
            self.created_at = Some(created_at);
        }
        self.refresh_derived();
    }
}

/// User input for a new product. The service assigns the id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductCreate {
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub cost_price: f64,
    pub sell_price: Option<f64>,
    pub shop_name: String,
}

impl ProductCreate {
    pub fn new(
        name: impl Into<String>,
        quantity: f64,
        unit: Unit,
        cost_price: f64,
        shop_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit,
            cost_price,
            sell_price: None,
            shop_name: shop_name.into(),
        }
    }

    pub fn into_fields(self) -> ProductFields {
        ProductFields {
            price_per_unit: price_per_unit(self.cost_price, self.quantity),
            name: self.name,
            quantity: self.quantity,
            unit: self.unit,
            cost_price: self.cost_price,
            sell_price: self.sell_price,
            shop_name: self.shop_name,
        }
    }
}

/// Partial change set for a product.
///
/// Used both for user edits and for decoding whatever the service echoes back
/// from an update, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "wire::optional_number")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "wire::optional_unit")]
    pub unit: Option<Unit>,
    #[serde(rename = "costprice", default, deserialize_with = "wire::optional_number")]
    pub cost_price: Option<f64>,
    #[serde(rename = "sellprice", default, deserialize_with = "wire::optional_number")]
    pub sell_price: Option<f64>,
    #[serde(rename = "shopname", default)]
    pub shop_name: Option<String>,
    #[serde(rename = "createdAt", default, deserialize_with = "wire::optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        *self == ProductPatch::default()
    }
}

/// The complete field set sent to the service on create and update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductFields {
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    #[serde(rename = "costprice")]
    pub cost_price: f64,
    #[serde(rename = "sellprice", skip_serializing_if = "Option::is_none")]
    pub sell_price: Option<f64>,
    #[serde(rename = "shopname")]
    pub shop_name: String,
    #[serde(rename = "pricePerQuantity")]
    pub price_per_unit: f64,
}

impl ProductFields {
    /// Returns this field set with `patch` applied and the derived price refreshed.
    pub fn patched(mut self, patch: &ProductPatch) -> Self {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(unit) = patch.unit {
            self.unit = unit;
        }
        if let Some(cost_price) = patch.cost_price {
            self.cost_price = cost_price;
        }
        if let Some(sell_price) = patch.sell_price {
            self.sell_price = Some(sell_price);
        }
        if let Some(shop_name) = &patch.shop_name {
            self.shop_name = shop_name.clone();
        }
        self.price_per_unit = price_per_unit(self.cost_price, self.quantity);
        self
    }

    /// Checks the local preconditions every persisted product must satisfy.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Product name is required".to_string());
        }
        if self.shop_name.trim().is_empty() {
            return Err("Shop name is required".to_string());
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(format!("Quantity must be greater than zero, got {}", self.quantity));
        }
        if !self.cost_price.is_finite() || self.cost_price < 0.0 {
            return Err(format!("Cost price must not be negative, got {}", self.cost_price));
        }
        if let Some(sell_price) = self.sell_price {
            if !sell_price.is_finite() || sell_price < 0.0 {
                return Err(format!("Sell price must not be negative, got {}", sell_price));
            }
        }
        Ok(())
    }

    /// The field set as a patch, used to merge an acknowledged update.
    pub fn as_patch(&self) -> ProductPatch {
        ProductPatch {
            name: Some(self.name.clone()),
            quantity: Some(self.quantity),
            unit: Some(self.unit),
            cost_price: Some(self.cost_price),
            sell_price: self.sell_price,
            shop_name: Some(self.shop_name.clone()),
            created_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_service_record_and_ignores_stored_unit_price() {
        let json = r#"{
            "_id": "65f1",
            "name": "Rice",
            "quantity": "10",
            "unit": "Bag",
            "costprice": 250,
            "sellprice": "",
            "shopname": "Anand Stores",
            "createdAt": "2024-03-01T10:00:00.000Z",
            "pricePerQuantity": "99.99"
        }"#;
        let mut product: Product = serde_json::from_str(json).unwrap();
        product.refresh_derived();

        assert_eq!(product.id, "65f1");
        assert_eq!(product.quantity, 10.0);
        assert_eq!(product.unit, Unit::Bag);
        assert_eq!(product.sell_price, None);
        assert_eq!(product.price_per_unit, 25.0);
        assert!(product.created_at.is_some());
    }

    #[test]
    fn missing_optional_fields_fall_back_to_defaults() {
        let json = r#"{"id": "a1", "name": "Salt", "quantity": 1, "costprice": 20}"#;
        let product: Product = serde_json::from_str(json).unwrap();

        assert_eq!(product.id, "a1");
        assert_eq!(product.unit, Unit::Kg);
        assert_eq!(product.shop_name, "");
        assert_eq!(product.created_at, None);
    }

    #[test]
    fn document_id_wins_when_both_id_keys_are_present() {
        let json = r#"{"_id": "65f1", "id": "65f1-virtual", "name": "Tea", "quantity": 1, "costprice": 10}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, "65f1");
    }

    #[test]
    fn record_without_any_id_is_rejected() {
        let json = r#"{"name": "Tea", "quantity": 1, "costprice": 10}"#;
        let err = serde_json::from_str::<Product>(json).unwrap_err();
        assert!(err.to_string().contains("has no id"));
    }

    #[test]
    fn unit_decodes_in_any_case_and_falls_back_to_kg() {
        let decode = |unit: &str| {
            let json = format!(r#"{{"_id": "1", "name": "Tea", "quantity": 1, "costprice": 10, "unit": {}}}"#, unit);
            serde_json::from_str::<Product>(&json).unwrap().unit
        };
        assert_eq!(decode(r#""Kg""#), Unit::Kg);
        assert_eq!(decode(r#""lit""#), Unit::Lit);
        assert_eq!(decode(r#""BAG""#), Unit::Bag);
        assert_eq!(decode(r#""box""#), Unit::Kg);
        assert_eq!(decode("null"), Unit::Kg);
    }

    #[test]
    fn null_text_fields_read_as_empty() {
        let json = r#"{"_id": "1", "name": "Tea", "quantity": 2, "costprice": 10, "shopname": null}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.shop_name, "");
        assert_eq!(product.price_per_unit, 5.0);
    }

    #[test]
    fn patch_ignores_an_unknown_unit() {
        let patch: ProductPatch = serde_json::from_str(r#"{"unit": "Crate", "name": "Tea"}"#).unwrap();
        assert_eq!(patch.unit, None);
        assert_eq!(patch.name.as_deref(), Some("Tea"));
    }

    #[test]
    fn fields_serialize_with_service_names() {
        let fields = ProductCreate::new("Oil", 5.0, Unit::Lit, 25.0, "X").into_fields();
        let value = serde_json::to_value(&fields).unwrap();

        assert_eq!(value["name"], "Oil");
        assert_eq!(value["unit"], "Lit");
        assert_eq!(value["costprice"], 25.0);
        assert_eq!(value["shopname"], "X");
        assert_eq!(value["pricePerQuantity"], 5.0);
        assert!(value.get("sellprice").is_none());
        assert!(value.get("_id").is_none());
    }

    #[test]
    fn validation_rejects_bad_quantities_and_prices() {
        let base = ProductCreate::new("Oil", 5.0, Unit::Lit, 25.0, "X");
        assert!(base.clone().into_fields().validate().is_ok());

        let zero_quantity = ProductCreate { quantity: 0.0, ..base.clone() };
        assert!(zero_quantity.into_fields().validate().is_err());

        let negative_cost = ProductCreate { cost_price: -1.0, ..base.clone() };
        assert!(negative_cost.into_fields().validate().is_err());

        let free = ProductCreate { cost_price: 0.0, ..base.clone() };
        assert!(free.into_fields().validate().is_ok());

        let unnamed = ProductCreate { name: "  ".to_string(), ..base };
        assert!(unnamed.into_fields().validate().is_err());
    }

    #[test]
    fn apply_merges_present_fields_and_keeps_the_rest() {
        let fields = ProductCreate::new("Sugar", 4.0, Unit::Kg, 200.0, "A").into_fields();
        let mut product = Product::from_fields("p1", fields, None);
        assert_eq!(product.price_per_unit, 50.0);

        product.apply(&ProductPatch {
            cost_price: Some(100.0),
            quantity: Some(10.0),
            ..Default::default()
        });

        assert_eq!(product.id, "p1");
        assert_eq!(product.name, "Sugar");
        assert_eq!(product.shop_name, "A");
        assert_eq!(product.price_per_unit, 10.0);
    }

    #[test]
    fn unit_parses_case_insensitively() {
        assert_eq!("KG".parse::<Unit>(), Ok(Unit::Kg));
        assert_eq!("lit".parse::<Unit>(), Ok(Unit::Lit));
        assert!("box".parse::<Unit>().is_err());
    }
}
