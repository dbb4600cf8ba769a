//! Transform Registry
//!
//! Central metadata for the available analytics transforms. Lets the CLI
//! and callers look transforms up by name without hardcoding the list.

use marlow_core::TransformCategory;
use marlow_core::schema::{
    CUSTOMER_ID, DESCRIPTION, FREQUENCY, INVOICE, INVOICE_DATE, MONETARY, PRICE, QUANTITY, RECENCY,
};
use std::collections::HashMap;

/// Transform metadata
#[derive(Debug, Clone)]
pub struct TransformInfo {
    /// Transform name (unique identifier)
    pub name: &'static str,
    /// Transform category
    pub category: TransformCategory,
    /// Brief description of what the transform produces
    pub description: &'static str,
    /// Required column names in input data
    pub required_columns: &'static [&'static str],
}

/// Get all available transform info
pub fn available_transforms() -> Vec<TransformInfo> {
    vec![
        // Customer transforms
        TransformInfo {
            name: "rfm_metrics",
            category: TransformCategory::Customer,
            description: "Recency, frequency and monetary value per customer",
            required_columns: &[CUSTOMER_ID, INVOICE, INVOICE_DATE],
        },
        TransformInfo {
            name: "cluster_prep",
            category: TransformCategory::Customer,
            description: "log1p + standardization of RFM metrics for clustering",
            required_columns: &[RECENCY, FREQUENCY, MONETARY],
        },
        TransformInfo {
            name: "cancellation_profile",
            category: TransformCategory::Customer,
            description: "Cancellation event counts merged onto customer rows",
            required_columns: &[CUSTOMER_ID],
        },
        // Inventory transforms
        TransformInfo {
            name: "abc_analysis",
            category: TransformCategory::Inventory,
            description: "Pareto revenue tiers (A/B/C) per product",
            required_columns: &[DESCRIPTION, QUANTITY, PRICE],
        },
        // Pricing transforms
        TransformInfo {
            name: "price_elasticity",
            category: TransformCategory::Pricing,
            description: "Quantity/price percent-change ratios per product",
            required_columns: &[DESCRIPTION, PRICE, QUANTITY],
        },
        // Temporal transforms
        TransformInfo {
            name: "time_features",
            category: TransformCategory::Temporal,
            description: "Calendar and shift features from the invoice timestamp",
            required_columns: &[INVOICE_DATE],
        },
    ]
}

/// Get transforms by category
pub fn transforms_by_category(category: TransformCategory) -> Vec<TransformInfo> {
    available_transforms()
        .into_iter()
        .filter(|t| t.category == category)
        .collect()
}

/// Get transform info by name
pub fn get_transform_info(name: &str) -> Option<TransformInfo> {
    available_transforms().into_iter().find(|t| t.name == name)
}

/// Get a map of all transforms indexed by name
pub fn transform_map() -> HashMap<&'static str, TransformInfo> {
    available_transforms()
        .into_iter()
        .map(|t| (t.name, t))
        .collect()
}

/// List all transform names
pub fn list_transform_names() -> Vec<&'static str> {
    available_transforms().into_iter().map(|t| t.name).collect()
}
