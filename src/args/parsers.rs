use std::num::NonZeroUsize;
use std::time::Duration;

use crate::config::parse_duration_value;
use crate::error::{AppError, AppResult, ValidationError};

pub(super) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    parse_duration_value(s).map_err(AppError::validation)
}

pub(super) fn parse_positive_usize(s: &str) -> AppResult<NonZeroUsize> {
    let value: usize = s
        .trim()
        .parse()
        .map_err(|err| AppError::validation(ValidationError::InvalidNumber { source: err }))?;
    NonZeroUsize::new(value)
        .ok_or_else(|| AppError::validation(ValidationError::ValueTooSmall { min: 1 }))
}
