//! Validation utilities
//!
//! Includes Ecuador-specific identity checks for owner records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::Lot;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Cédula must be 10 digits")]
    CedulaLength,
    #[error("Invalid province code in cédula")]
    CedulaProvince,
    #[error("Invalid cédula checksum")]
    CedulaChecksum,
    #[error("Start date {start} is after end date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
    #[error("{0} cannot be negative")]
    Negative(&'static str),
}

// ============================================================================
// Identity Validations
// ============================================================================

/// Validate an Ecuadorian cédula (natural person).
///
/// 10 digits: province code 01-24 (or 30 for citizens registered abroad),
/// third digit below 6, and a modulo-10 check digit.
pub fn validate_cedula(cedula: &str) -> Result<(), ValidationError> {
    let digits: Vec<u32> = cedula.trim().chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 10 || cedula.trim().len() != 10 {
        return Err(ValidationError::CedulaLength);
    }

    let province = digits[0] * 10 + digits[1];
    if !((1..=24).contains(&province) || province == 30) || digits[2] >= 6 {
        return Err(ValidationError::CedulaProvince);
    }

    let sum: u32 = digits
        .iter()
        .take(9)
        .enumerate()
        .map(|(i, &d)| {
            let weighted = if i % 2 == 0 { d * 2 } else { d };
            if weighted > 9 {
                weighted - 9
            } else {
                weighted
            }
        })
        .sum();
    let check = (10 - sum % 10) % 10;
    if check != digits[9] {
        return Err(ValidationError::CedulaChecksum);
    }

    Ok(())
}

/// Owners whose cédula does not validate, as `(lot id, cédula)` pairs.
/// Such owners are still aggregated; the list is only informational.
pub fn invalid_owner_ids(lots: &[Lot]) -> Vec<(i64, String)> {
    lots.iter()
        .flat_map(|lot| lot.owners.iter().map(move |o| (lot.id, &o.national_id)))
        .filter(|(_, id)| validate_cedula(id).is_err())
        .map(|(lot, id)| (lot, id.clone()))
        .collect()
}

// ============================================================================
// General Validations
// ============================================================================

pub fn validate_date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => {
            Err(ValidationError::InvertedDateRange { start, end })
        }
        _ => Ok(()),
    }
}

pub fn validate_non_negative(value: Decimal, field: &'static str) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        Err(ValidationError::Negative(field))
    } else {
        Ok(())
    }
}

/// Quintals and weights of a lot must not be negative
pub fn validate_lot_quantities(lot: &Lot) -> Result<(), ValidationError> {
    validate_non_negative(lot.total_quintals, "total_quintales")?;
    if let Some(initial) = lot.initial_weight {
        validate_non_negative(initial, "peso_inicial")?;
    }
    if let Some(final_weight) = lot.final_weight {
        validate_non_negative(final_weight, "peso_final")?;
    }
    for owner in &lot.owners {
        validate_non_negative(owner.quintals_delivered, "quintales_entregados")?;
    }
    Ok(())
}
