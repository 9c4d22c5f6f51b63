use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub daily_rate: f64,
    pub volatility: f64,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read product catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid product catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("product catalog is empty")]
    Empty,

    #[error("duplicate product id `{0}`")]
    DuplicateId(String),

    #[error("product `{id}`: {reason}")]
    InvalidProduct { id: String, reason: String },
}

/// Named investment products and their growth constants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCatalog {
    products: Vec<Product>,
}

impl Default for ProductCatalog {
    fn default() -> Self {
        Self {
            products: vec![
                builtin("conservative", "DigiSave", "Low Risk", 0.0002, 0.001),
                builtin("balanced", "EuroBond", "Medium Risk", 0.0004, 0.002),
                builtin("aggressive", "Global Tech", "High Risk", 0.0007, 0.004),
            ],
        }
    }
}

impl ProductCatalog {
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        if products.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for product in &products {
            let id = product.id.trim().to_ascii_lowercase();
            if id.is_empty() {
                return Err(CatalogError::InvalidProduct {
                    id: product.id.clone(),
                    reason: "id must not be empty".to_string(),
                });
            }
            if !seen.insert(id) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
            if !product.daily_rate.is_finite() {
                return Err(CatalogError::InvalidProduct {
                    id: product.id.clone(),
                    reason: "dailyRate must be finite".to_string(),
                });
            }
            if !product.volatility.is_finite() || product.volatility < 0.0 {
                return Err(CatalogError::InvalidProduct {
                    id: product.id.clone(),
                    reason: "volatility must be finite and >= 0".to_string(),
                });
            }
        }

        Ok(Self { products })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products = serde_json::from_str::<Vec<Product>>(json)?;
        Self::new(products)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            products = catalog.products.len(),
            "loaded product catalog"
        );
        Ok(catalog)
    }

    /// Built-in catalog unless a configuration file is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        let id = id.trim();
        self.products
            .iter()
            .find(|product| product.id.trim().eq_ignore_ascii_case(id))
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }
}

fn builtin(id: &str, label: &str, description: &str, daily_rate: f64, volatility: f64) -> Product {
    Product {
        id: id.to_string(),
        label: label.to_string(),
        description: description.to_string(),
        daily_rate,
        volatility,
    }
}
