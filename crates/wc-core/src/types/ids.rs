use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;
use utoipa::ToSchema;

/// Opaque alarm identifier: `alarm_` followed by a ULID.
///
/// Ordering is plain string ordering, which for ULIDs follows creation time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(as = String)]
pub struct AlarmId(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    InvalidPrefix { expected: &'static str, got: String },
    InvalidUlid { value: String },
    InvalidFormat { value: String },
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPrefix { expected, got } => {
                write!(f, "invalid prefix: expected {expected}, got {got}")
            }
            Self::InvalidUlid { value } => write!(f, "invalid ulid: {value}"),
            Self::InvalidFormat { value } => write!(f, "invalid id format: {value}"),
        }
    }
}

impl std::error::Error for IdError {}

impl AlarmId {
    pub const PREFIX: &'static str = "alarm_";

    pub fn generate() -> Self {
        Self(format!("{}{}", Self::PREFIX, Ulid::new()))
    }

    pub fn new(value: String) -> Result<Self, IdError> {
        let Some(rest) = value.strip_prefix(Self::PREFIX) else {
            let got = value.split('_').next().unwrap_or("").to_string();
            return Err(IdError::InvalidPrefix {
                expected: Self::PREFIX,
                got,
            });
        };
        if rest.len() != 26 {
            return Err(IdError::InvalidFormat { value });
        }
        if Ulid::from_str(rest).is_err() {
            return Err(IdError::InvalidUlid { value });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AlarmId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl<'de> Deserialize<'de> for AlarmId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}
