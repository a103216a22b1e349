//! Completeness checks gating the wizard's step transitions.
//!
//! Measurements are checked for presence only. `"abc"` is a valid height as
//! far as these functions are concerned; the backend receives the raw string.

use crate::{
    domain::{FormData, ImageSlot},
    error::ValidationError,
};

pub fn validate_step1(data: &FormData) -> Result<(), ValidationError> {
    for slot in ImageSlot::ALL {
        if data.image(slot).is_none() {
            return Err(ValidationError::MissingImage(slot));
        }
    }
    if data.name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    Ok(())
}

pub fn validate_submission(data: &FormData) -> Result<(), ValidationError> {
    validate_step1(data)?;
    match data.measurements.first_missing() {
        Some(field) => Err(ValidationError::MissingMeasurement(field)),
        None => Ok(()),
    }
}

pub fn can_advance_from_step1(data: &FormData) -> bool {
    validate_step1(data).is_ok()
}

pub fn can_submit(data: &FormData) -> bool {
    validate_submission(data).is_ok()
}
