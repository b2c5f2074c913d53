//! Catalog file validation and metal option edits.
//!
//! Catalog files are YAML lists of product documents, the same format the
//! storefront loads as its local catalog seed. Edits go through the core
//! list helpers so the one-default invariant holds after every change.

use std::path::Path;

use thiserror::Error;
use tracing::{error, info, warn};

use aurum_core::catalog::{remove_metal_option, set_default_metal_option};
use aurum_core::{CatalogError, ProductId, VariantCatalogEntry};

/// Errors from reading, checking or editing a catalog file.
#[derive(Debug, Error)]
pub enum CatalogFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("product not found: {0}")]
    ProductNotFound(String),

    #[error("product {id}: {source}")]
    Invalid {
        id: ProductId,
        #[source]
        source: CatalogError,
    },

    #[error("{0} product(s) failed validation")]
    ValidationFailed(usize),
}

/// An edit to one product's metal options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetalEdit {
    SetDefault(usize),
    Remove(usize),
}

/// Parse a catalog file's contents.
pub fn parse_catalog(yaml: &str) -> Result<Vec<VariantCatalogEntry>, CatalogFileError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Every invariant violation in `entries`, one per product at most.
pub fn find_problems(entries: &[VariantCatalogEntry]) -> Vec<(ProductId, CatalogError)> {
    let mut problems: Vec<(ProductId, CatalogError)> = entries
        .iter()
        .filter_map(|entry| entry.validate().err().map(|e| (entry.id.clone(), e)))
        .collect();

    let mut seen = std::collections::HashSet::new();
    for entry in entries {
        if !seen.insert(&entry.id) {
            warn!(product_id = %entry.id, "Product ID appears more than once");
        }
    }

    problems.sort_by(|a, b| a.0.cmp(&b.0));
    problems
}

/// Apply `edit` to the named product in place.
pub fn apply_metal_edit(
    entries: &mut [VariantCatalogEntry],
    product: &str,
    edit: MetalEdit,
) -> Result<(), CatalogFileError> {
    let entry = entries
        .iter_mut()
        .find(|e| e.id.as_str() == product)
        .ok_or_else(|| CatalogFileError::ProductNotFound(product.to_string()))?;

    let options = std::mem::take(&mut entry.metal_options);
    let result = match edit {
        MetalEdit::SetDefault(index) => set_default_metal_option(options.clone(), index),
        MetalEdit::Remove(index) => remove_metal_option(options.clone(), index),
    };

    match result {
        Ok(updated) => {
            entry.metal_options = updated;
            Ok(())
        }
        Err(source) => {
            entry.metal_options = options;
            Err(CatalogFileError::Invalid {
                id: entry.id.clone(),
                source,
            })
        }
    }
}

/// Validate a catalog file and report every problem.
///
/// # Errors
///
/// Returns an error if the file cannot be read or any product is invalid.
pub async fn validate(path: &Path) -> Result<(), CatalogFileError> {
    let content = tokio::fs::read_to_string(path).await?;
    let entries = parse_catalog(&content)?;
    info!(path = %path.display(), products = entries.len(), "Parsed catalog");

    let problems = find_problems(&entries);
    if !problems.is_empty() {
        error!("Catalog validation failed:");
        for (id, problem) in &problems {
            error!("  - {id}: {problem}");
        }
        return Err(CatalogFileError::ValidationFailed(problems.len()));
    }

    info!("Catalog validated successfully");
    Ok(())
}

/// Edit one product's metal options and write the file back.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written, the product is
/// missing, or the index is out of range.
pub async fn edit_metal(path: &Path, product: &str, edit: MetalEdit) -> Result<(), CatalogFileError> {
    let content = tokio::fs::read_to_string(path).await?;
    let mut entries = parse_catalog(&content)?;

    apply_metal_edit(&mut entries, product, edit)?;
    tokio::fs::write(path, serde_yaml::to_string(&entries)?).await?;

    if let Some(entry) = entries.iter().find(|e| e.id.as_str() == product) {
        let default = entry
            .default_metal()
            .map_or_else(|| "none".to_string(), |m| format!("{} {}", m.karat, m.color));
        info!(
            product_id = %entry.id,
            options = entry.metal_options.len(),
            default = %default,
            ?edit,
            "Metal options updated"
        );
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
- id: ring-1
  name: Classic Solitaire
  category: ring
  basePrice: "500"
  metalOptions:
    - { karat: 14K, color: White Gold, price: "550", isDefault: true }
    - { karat: 18K, color: Yellow Gold, price: "700", isDefault: false }
    - { karat: PT, color: Platinum, price: "900", isDefault: false }
- id: band-1
  name: Comfort Band
  category: mens_ring
  basePrice: "300"
  metalOptions:
    - { karat: 14K, color: Yellow Gold, price: "300", isDefault: true }
    - { karat: 14K, color: Yellow Gold, price: "320", isDefault: false }
"#;

    #[test]
    fn test_find_problems_reports_duplicate_metal() {
        let entries = parse_catalog(CATALOG).unwrap();
        let problems = find_problems(&entries);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].0.as_str(), "band-1");
        assert!(matches!(
            problems[0].1,
            CatalogError::DuplicateMetalOption { .. }
        ));
    }

    #[test]
    fn test_set_default_metal_edit() {
        let mut entries = parse_catalog(CATALOG).unwrap();
        apply_metal_edit(&mut entries, "ring-1", MetalEdit::SetDefault(2)).unwrap();
        let defaults: Vec<bool> = entries[0].metal_options.iter().map(|m| m.is_default).collect();
        assert_eq!(defaults, vec![false, false, true]);
    }

    #[test]
    fn test_remove_default_metal_promotes_first() {
        let mut entries = parse_catalog(CATALOG).unwrap();
        apply_metal_edit(&mut entries, "ring-1", MetalEdit::Remove(0)).unwrap();
        let ring = &entries[0];
        assert_eq!(ring.metal_options.len(), 2);
        assert_eq!(ring.default_metal().unwrap().karat, "18K");
    }

    #[test]
    fn test_out_of_range_edit_leaves_options_untouched() {
        let mut entries = parse_catalog(CATALOG).unwrap();
        let err = apply_metal_edit(&mut entries, "ring-1", MetalEdit::Remove(7)).unwrap_err();
        assert!(matches!(
            err,
            CatalogFileError::Invalid {
                source: CatalogError::IndexOutOfRange { index: 7, len: 3 },
                ..
            }
        ));
        assert_eq!(entries[0].metal_options.len(), 3);
    }

    #[test]
    fn test_unknown_product() {
        let mut entries = parse_catalog(CATALOG).unwrap();
        assert!(matches!(
            apply_metal_edit(&mut entries, "nope", MetalEdit::SetDefault(0)),
            Err(CatalogFileError::ProductNotFound(_))
        ));
    }
}
