use serde::Deserialize;
use sitegate_core::{AppError, AppResult};

/// Integer the site directory serializes either as a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireNumber {
    Number(u64),
    Text(String),
}

impl WireNumber {
    pub(crate) fn to_u64(&self, field: &str) -> AppResult<u64> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Text(value) => value.trim().parse::<u64>().map_err(|error| {
                AppError::Upstream(format!("field '{field}' is not an integer: {error}"))
            }),
        }
    }

    pub(crate) fn to_u32(&self, field: &str) -> AppResult<u32> {
        let value = self.to_u64(field)?;
        u32::try_from(value).map_err(|_| {
            AppError::Upstream(format!("field '{field}' exceeds 32 bits: {value}"))
        })
    }
}
