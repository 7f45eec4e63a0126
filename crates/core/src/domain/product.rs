use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductCode(pub String);

impl ProductCode {
    /// Codes are compared case-insensitively, so they are always stored lowercased.
    pub fn normalized(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub code: ProductCode,
    pub name: String,
    pub price: Decimal,
    /// Category-specific descriptors such as `cor` or `tamanho`.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Product {
    pub fn new(code: &str, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            code: ProductCode::normalized(code),
            name: name.into(),
            price,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
