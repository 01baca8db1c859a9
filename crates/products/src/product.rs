use serde::{Deserialize, Serialize};

use stockroom_core::{AggregateId, DomainError, DomainResult, Entity, ValueObject, validate_name};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Product price in whole currency units. Never negative.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Price(i64);

impl Price {
    pub fn new(amount: i64) -> DomainResult<Self> {
        if amount < 0 {
            return Err(DomainError::validation(format!(
                "price cannot be negative (got {amount})"
            )));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> i64 {
        self.0
    }
}

impl ValueObject for Price {}

impl TryFrom<i64> for Price {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for i64 {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Catalog product. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    price: Price,
}

impl Product {
    /// Create a new product with a freshly generated id.
    pub fn new(name: &str, price: Price) -> DomainResult<Self> {
        Self::restore(ProductId::new(AggregateId::new()), name, price)
    }

    /// Rebuild a product from persisted fields.
    pub fn restore(id: ProductId, name: &str, price: Price) -> DomainResult<Self> {
        let name = validate_name("product", name)?;
        Ok(Self { id, name, price })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn price(&self) -> Price {
        self.price
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl core::fmt::Display for Product {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} (price {})", self.name, self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(amount: i64) -> Price {
        Price::new(amount).unwrap()
    }

    #[test]
    fn new_product_keeps_name_and_price() {
        let product = Product::new("milk", price(80)).unwrap();
        assert_eq!(product.name(), "milk");
        assert_eq!(product.price().amount(), 80);
    }

    #[test]
    fn new_products_get_distinct_ids() {
        let a = Product::new("milk", price(80)).unwrap();
        let b = Product::new("milk", price(80)).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn zero_price_is_allowed() {
        assert_eq!(price(0).amount(), 0);
    }

    #[test]
    fn negative_price_is_rejected() {
        assert!(matches!(Price::new(-1), Err(DomainError::Validation(_))));
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(Product::new("", price(10)).is_err());
    }

    #[test]
    fn restore_keeps_the_given_id() {
        let id = ProductId::new(AggregateId::new());
        let product = Product::restore(id, "bread", price(40)).unwrap();
        assert_eq!(product.id_typed(), id);
    }

    #[test]
    fn negative_price_fails_to_deserialize() {
        let json = format!(
            r#"{{"id":"{}","name":"bread","price":-5}}"#,
            AggregateId::new()
        );
        assert!(serde_json::from_str::<Product>(&json).is_err());
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: every non-negative amount is a valid price and round-trips through i64.
            #[test]
            fn non_negative_amounts_are_prices(amount in 0i64..=i64::MAX) {
                let p = Price::new(amount).unwrap();
                prop_assert_eq!(i64::from(p), amount);
            }

            /// Property: ordering of prices follows ordering of amounts.
            #[test]
            fn price_order_matches_amount_order(a in 0i64..1_000_000, b in 0i64..1_000_000) {
                prop_assert_eq!(price(a).cmp(&price(b)), a.cmp(&b));
            }
        }
    }
}
