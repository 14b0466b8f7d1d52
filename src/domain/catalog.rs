//! The price catalog: product identifier -> unit price, fixed at startup.

use crate::error::CatalogError;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;

pub const DEFAULT_CATALOG: &str = "shoe=100,purse=200,bag=300,watch=300";

#[derive(Debug, Clone)]
pub struct PriceCatalog {
    prices: BTreeMap<String, Decimal>,
}

impl PriceCatalog {
    /// Builds a catalog. Rejects an empty mapping and negative prices.
    pub fn new<I, K>(prices: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (product, price) in prices {
            let product = product.into();
            if price < Decimal::ZERO {
                return Err(CatalogError::NegativePrice(product));
            }
            map.insert(product, price);
        }
        if map.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { prices: map })
    }

    /// Parses `product=price` pairs separated by commas, e.g. `bag=300,shoe=99.50`.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let mut entries = Vec::new();
        for raw in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (product, price) = raw
                .split_once('=')
                .ok_or_else(|| CatalogError::InvalidEntry(raw.to_string()))?;
            let product = product.trim();
            if product.is_empty() {
                return Err(CatalogError::InvalidEntry(raw.to_string()));
            }
            let price = Decimal::from_str(price.trim())
                .map_err(|_| CatalogError::InvalidEntry(raw.to_string()))?;
            entries.push((product.to_string(), price));
        }
        Self::new(entries)
    }

    /// Unit price of `product`; identifiers are case-sensitive.
    pub fn price_of(&self, product: &str) -> Option<Decimal> {
        self.prices.get(product).copied()
    }

    /// Products in name order.
    pub fn products(&self) -> impl Iterator<Item = (&str, Decimal)> + '_ {
        self.prices.iter().map(|(name, price)| (name.as_str(), *price))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
