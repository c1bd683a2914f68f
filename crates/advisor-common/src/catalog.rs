use std::collections::HashSet;
use std::path::Path;

use tracing::info;

use crate::error::CatalogError;
use crate::model::Product;

/// Categories a catalog entry may belong to.
pub const CATEGORIES: &[&str] = &[
    "Laptops",
    "Smartphones",
    "Headphones",
    "Smart Home",
    "Cameras",
    "Wearables",
];

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// Static, read-only product catalog.
///
/// The pretty-printed JSON form embedded into prompts is computed once here so prompt
/// construction stays infallible.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    serialized: String,
}

impl Catalog {
    /// Validate and wrap a list of products. Order is preserved.
    pub fn from_products(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for (index, product) in products.iter().enumerate() {
            validate_product(product).map_err(|message| CatalogError::InvalidEntry {
                index,
                message,
            })?;
            let key = (
                product.brand.as_str(),
                product.product_name.as_str(),
                product.price.to_bits(),
            );
            if !seen.insert(key) {
                return Err(CatalogError::InvalidEntry {
                    index,
                    message: format!(
                        "duplicate product {} {} at {}",
                        product.brand, product.product_name, product.price
                    ),
                });
            }
        }

        let serialized = serde_json::to_string_pretty(&products)?;
        Ok(Self {
            products,
            serialized,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::from_products(products)
    }

    /// The catalog compiled into the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json_str(&json)?;
        info!(path = %path.display(), products = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn serialized(&self) -> &str {
        &self.serialized
    }

    /// Exact identity lookup: case-sensitive strings, exact price.
    pub fn find(&self, brand: &str, product_name: &str, price: f64) -> Option<&Product> {
        self.products
            .iter()
            .find(|p| p.same_identity(brand, product_name, price))
    }

    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> + 'a {
        self.products.iter().filter(move |p| p.category == category)
    }
}

fn validate_product(product: &Product) -> Result<(), String> {
    if product.brand.trim().is_empty() {
        return Err("brand must not be empty".to_string());
    }
    if product.product_name.trim().is_empty() {
        return Err("product_name must not be empty".to_string());
    }
    if !product.price.is_finite() || product.price < 0.0 {
        return Err(format!("price must be a non-negative number, got {}", product.price));
    }
    if !CATEGORIES.contains(&product.category.as_str()) {
        return Err(format!("unknown category: {}", product.category));
    }
    Ok(())
}
