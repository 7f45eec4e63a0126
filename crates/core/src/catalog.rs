use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::cart::{Cart, CartChange};
use crate::domain::product::{Product, ProductCode};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    /// Lowercase lookup key, e.g. `camisetas`.
    pub key: String,
    /// Display label used in menus and listing headers, e.g. `Camisetas`.
    pub label: String,
    pub products: Vec<Product>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("category key must not be empty")]
    EmptyCategoryKey,
    #[error("category `{0}` is defined more than once")]
    DuplicateCategory(String),
    #[error("product code `{code}` appears in both `{first}` and `{second}`")]
    DuplicateCode { code: String, first: String, second: String },
    #[error("product `{code}` has a negative price")]
    NegativePrice { code: String },
    #[error("product `{code}` costs more than the {limit} ceiling")]
    PriceTooHigh { code: String, limit: Decimal },
}

/// Highest unit price a catalog may list. Keeps cart totals far from `Decimal` overflow.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 2);

/// Read-only product catalog, built once at startup and shared by every session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    categories: Vec<Category>,
}

pub enum AddItemOutcome<'a> {
    Added { product: &'a Product, change: CartChange },
    NotFound { code: String },
}

impl Catalog {
    pub fn new(categories: Vec<Category>) -> Result<Self, CatalogError> {
        let mut seen_categories = Vec::with_capacity(categories.len());
        let mut seen_codes: HashMap<ProductCode, String> = HashMap::new();
        let mut normalized = Vec::with_capacity(categories.len());

        for mut category in categories {
            category.key = category.key.trim().to_lowercase();
            if category.key.is_empty() {
                return Err(CatalogError::EmptyCategoryKey);
            }
            if seen_categories.contains(&category.key) {
                return Err(CatalogError::DuplicateCategory(category.key));
            }
            seen_categories.push(category.key.clone());

            for product in &mut category.products {
                product.code = ProductCode::normalized(&product.code.0);
                if product.price.is_sign_negative() {
                    return Err(CatalogError::NegativePrice { code: product.code.0.clone() });
                }
                if product.price > MAX_UNIT_PRICE {
                    return Err(CatalogError::PriceTooHigh {
                        code: product.code.0.clone(),
                        limit: MAX_UNIT_PRICE,
                    });
                }
                if let Some(first) = seen_codes.get(&product.code) {
                    return Err(CatalogError::DuplicateCode {
                        code: product.code.0.clone(),
                        first: first.clone(),
                        second: category.key.clone(),
                    });
                }
                seen_codes.insert(product.code.clone(), category.key.clone());
            }

            normalized.push(category);
        }

        Ok(Self { categories: normalized })
    }

    /// The store's default stock.
    pub fn builtin() -> Self {
        Self {
            categories: vec![
                Category {
                    key: "camisetas".to_owned(),
                    label: "Camisetas".to_owned(),
                    products: vec![
                        Product::new("cam001", "Camiseta Branca Básica", Decimal::new(5_000, 2))
                            .with_attribute("cor", "branca"),
                        Product::new("cam002", "Camiseta Preta Estampada", Decimal::new(6_500, 2))
                            .with_attribute("cor", "preta"),
                    ],
                },
                Category {
                    key: "calcas".to_owned(),
                    label: "Calças".to_owned(),
                    products: vec![
                        Product::new("cal001", "Calça Jeans Reta", Decimal::new(12_000, 2))
                            .with_attribute("tamanho", "M"),
                        Product::new("cal002", "Calça Moletom Cinza", Decimal::new(9_000, 2))
                            .with_attribute("tamanho", "G"),
                    ],
                },
            ],
        }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        let file = toml::from_str::<CatalogFile>(&raw)
            .map_err(|source| CatalogError::ParseFile { path: path.to_path_buf(), source })?;
        Self::new(file.into_categories())
    }

    /// Loads `path` when one is configured, otherwise the built-in stock.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        let key = key.trim().to_lowercase();
        self.categories.iter().find(|category| category.key == key)
    }

    pub fn category_by_label(&self, label: &str) -> Option<&Category> {
        let label = label.trim().to_lowercase();
        self.categories.iter().find(|category| category.label.to_lowercase() == label)
    }

    pub fn find(&self, code: &ProductCode) -> Option<&Product> {
        self.categories
            .iter()
            .flat_map(|category| category.products.iter())
            .find(|product| &product.code == code)
    }

    /// Looks `code` up across every category and adds it to `cart`.
    /// Unknown codes leave the cart untouched.
    pub fn add_item(&self, cart: &mut Cart, code: &str) -> AddItemOutcome<'_> {
        let normalized = ProductCode::normalized(code);
        match self.find(&normalized) {
            Some(product) => AddItemOutcome::Added { product, change: cart.add(product) },
            None => AddItemOutcome::NotFound { code: normalized.0 },
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    category: Vec<CategoryEntry>,
}

#[derive(Debug, Deserialize)]
struct CategoryEntry {
    key: String,
    label: Option<String>,
    #[serde(default)]
    product: Vec<ProductEntry>,
}

#[derive(Debug, Deserialize)]
struct ProductEntry {
    code: String,
    name: String,
    price: Decimal,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

impl CatalogFile {
    fn into_categories(self) -> Vec<Category> {
        self.category
            .into_iter()
            .map(|entry| Category {
                label: entry.label.unwrap_or_else(|| entry.key.clone()),
                key: entry.key,
                products: entry
                    .product
                    .into_iter()
                    .map(|product| Product {
                        code: ProductCode(product.code),
                        name: product.name,
                        price: product.price,
                        attributes: product.attributes,
                    })
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{AddItemOutcome, Catalog, CatalogError, Category, MAX_UNIT_PRICE};
    use crate::domain::cart::{Cart, CartChange};
    use crate::domain::product::{Product, ProductCode};

    #[test]
    fn builtin_catalog_satisfies_invariants() {
        let builtin = Catalog::builtin();
        let validated = Catalog::new(builtin.categories().to_vec()).expect("builtin is valid");
        assert_eq!(validated, builtin);
    }

    #[test]
    fn lookup_is_case_insensitive_across_categories() {
        let catalog = Catalog::builtin();

        let product = catalog.find(&ProductCode::normalized("CAL002")).expect("cal002 exists");
        assert_eq!(product.name, "Calça Moletom Cinza");
        assert!(catalog.category("CAMISETAS").is_some());
        assert_eq!(catalog.category_by_label("calças").map(|c| c.key.as_str()), Some("calcas"));
    }

    #[test]
    fn rejects_duplicate_codes_across_categories() {
        let error = Catalog::new(vec![
            Category {
                key: "a".to_owned(),
                label: "A".to_owned(),
                products: vec![Product::new("x1", "One", Decimal::ONE)],
            },
            Category {
                key: "b".to_owned(),
                label: "B".to_owned(),
                products: vec![Product::new("X1", "Other", Decimal::ONE)],
            },
        ])
        .expect_err("duplicate code must be rejected");

        assert!(matches!(error, CatalogError::DuplicateCode { ref code, .. } if code == "x1"));
    }

    #[test]
    fn rejects_negative_prices() {
        let error = Catalog::new(vec![Category {
            key: "a".to_owned(),
            label: "A".to_owned(),
            products: vec![Product::new("x1", "One", Decimal::new(-1, 0))],
        }])
        .expect_err("negative price must be rejected");

        assert!(matches!(error, CatalogError::NegativePrice { .. }));
    }

    #[test]
    fn rejects_prices_above_ceiling() {
        let at_ceiling = Catalog::new(vec![Category {
            key: "a".to_owned(),
            label: "A".to_owned(),
            products: vec![Product::new("x1", "One", MAX_UNIT_PRICE)],
        }]);
        assert!(at_ceiling.is_ok());

        let huge = Decimal::from_scientific("5e28").expect("decimal");
        let error = Catalog::new(vec![Category {
            key: "a".to_owned(),
            label: "A".to_owned(),
            products: vec![Product::new("big1", "Big", huge)],
        }])
        .expect_err("huge price must be rejected");

        assert!(matches!(error, CatalogError::PriceTooHigh { ref code, .. } if code == "big1"));
    }

    #[test]
    fn add_item_with_unknown_code_leaves_cart_untouched() {
        let catalog = Catalog::builtin();
        let mut cart = Cart::new();

        let outcome = catalog.add_item(&mut cart, "zzz999");

        assert!(matches!(outcome, AddItemOutcome::NotFound { ref code } if code == "zzz999"));
        assert!(cart.is_empty());
    }

    #[test]
    fn add_item_normalizes_code_before_lookup() {
        let catalog = Catalog::builtin();
        let mut cart = Cart::new();

        let outcome = catalog.add_item(&mut cart, " Cam001 ");

        let AddItemOutcome::Added { product, change } = outcome else {
            panic!("cam001 should be found");
        };
        assert_eq!(product.code.as_str(), "cam001");
        assert_eq!(change, CartChange::Inserted);
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn loads_catalog_from_toml_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("catalog.toml");
        fs::write(
            &path,
            r#"
[[category]]
key = "Bones"
label = "Bonés"

[[category.product]]
code = "BON001"
name = "Boné Azul"
price = "35.50"
attributes = { cor = "azul" }

[[category.product]]
code = "bon002"
name = "Boné Verde"
price = "29.90"
"#,
        )
        .expect("write catalog");

        let catalog = Catalog::load(&path).expect("catalog loads");
        let category = catalog.category("bones").expect("category normalized");

        assert_eq!(category.label, "Bonés");
        let codes: Vec<&str> = category.products.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["bon001", "bon002"]);
        assert_eq!(category.products[0].price, Decimal::new(3_550, 2));
    }

    #[test]
    fn missing_catalog_file_is_reported() {
        let dir = TempDir::new().expect("temp dir");
        let error = Catalog::load(&dir.path().join("absent.toml")).expect_err("missing file");
        assert!(matches!(error, CatalogError::ReadFile { .. }));
    }

    #[test]
    fn no_configured_path_means_builtin_stock() {
        let catalog = Catalog::load_or_builtin(None).expect("builtin");
        assert_eq!(catalog, Catalog::builtin());
    }
}
