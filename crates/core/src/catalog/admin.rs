//! List transforms behind the back-office variant editor.
//!
//! Each helper takes the current list by value and returns the edited list,
//! so an admin form can apply an edit and validate the result before saving.
//! After any metal helper, a non-empty metal list has exactly one default.

use rust_decimal::Decimal;

use super::{MetalOption, RingSize, SizeOption};
use crate::error::CatalogError;

fn check_index(index: usize, len: usize) -> Result<(), CatalogError> {
    if index < len {
        Ok(())
    } else {
        Err(CatalogError::IndexOutOfRange { index, len })
    }
}

/// Make the option at `index` the only default.
///
/// # Errors
///
/// Returns [`CatalogError::IndexOutOfRange`] if `index` is past the end.
pub fn set_default_metal_option(
    mut options: Vec<MetalOption>,
    index: usize,
) -> Result<Vec<MetalOption>, CatalogError> {
    check_index(index, options.len())?;
    for (i, option) in options.iter_mut().enumerate() {
        option.is_default = i == index;
    }
    Ok(options)
}

/// Remove the option at `index`.
///
/// If the removed option was the default, the first remaining option takes
/// over as default.
///
/// # Errors
///
/// Returns [`CatalogError::IndexOutOfRange`] if `index` is past the end.
pub fn remove_metal_option(
    mut options: Vec<MetalOption>,
    index: usize,
) -> Result<Vec<MetalOption>, CatalogError> {
    check_index(index, options.len())?;
    let removed = options.remove(index);
    if removed.is_default
        && let Some(first) = options.first_mut()
    {
        first.is_default = true;
    }
    Ok(options)
}

/// Append a metal option.
///
/// The first option added to an empty list becomes the default; an option
/// added with `is_default` set takes the default from the others.
///
/// # Errors
///
/// Returns [`CatalogError::DuplicateMetalOption`] if the karat and color
/// pair is already listed.
pub fn add_metal_option(
    mut options: Vec<MetalOption>,
    mut option: MetalOption,
) -> Result<Vec<MetalOption>, CatalogError> {
    if options.iter().any(|m| m.matches(&option.karat, &option.color)) {
        return Err(CatalogError::DuplicateMetalOption {
            karat: option.karat,
            color: option.color,
        });
    }
    if options.is_empty() {
        option.is_default = true;
    } else if option.is_default {
        for existing in &mut options {
            existing.is_default = false;
        }
    }
    options.push(option);
    Ok(options)
}

/// Append a size option.
///
/// # Errors
///
/// Returns [`CatalogError::DuplicateSize`] if the size is already listed, or
/// [`CatalogError::NegativePrice`] for a negative adder.
pub fn add_size_option(
    mut sizes: Vec<SizeOption>,
    option: SizeOption,
) -> Result<Vec<SizeOption>, CatalogError> {
    if option.additional_price < Decimal::ZERO {
        return Err(CatalogError::NegativePrice("size additional price"));
    }
    if sizes.iter().any(|s| s.size == option.size) {
        return Err(CatalogError::DuplicateSize(option.size));
    }
    sizes.push(option);
    Ok(sizes)
}

/// Remove the size option at `index`.
///
/// # Errors
///
/// Returns [`CatalogError::IndexOutOfRange`] if `index` is past the end.
pub fn remove_size_option(
    mut sizes: Vec<SizeOption>,
    index: usize,
) -> Result<Vec<SizeOption>, CatalogError> {
    check_index(index, sizes.len())?;
    sizes.remove(index);
    Ok(sizes)
}

/// Toggle availability of `size` without touching its price.
///
/// # Errors
///
/// Returns [`CatalogError::IndexOutOfRange`] with `index == len` when the
/// size is not listed.
pub fn set_size_availability(
    mut sizes: Vec<SizeOption>,
    size: RingSize,
    available: bool,
) -> Result<Vec<SizeOption>, CatalogError> {
    let len = sizes.len();
    let option = sizes
        .iter_mut()
        .find(|s| s.size == size)
        .ok_or(CatalogError::IndexOutOfRange { index: len, len })?;
    option.is_available = available;
    Ok(sizes)
}
