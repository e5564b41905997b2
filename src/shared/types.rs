//! Common types used across the application

use serde::{Deserialize, Serialize};

/// A tracked product
///
/// Identity is the SKU id; the name is display-only and may collide
/// across distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub id: String,
}

impl Product {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}
