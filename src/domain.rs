use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KiraError;

/// Upper bound on records pulled by a single fetch. Matches beyond this are
/// never retrieved.
pub const MAX_FETCH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxId(String);

impl TaxId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxId {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let digits = match trimmed.get(..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("txid") => &trimmed[4..],
            _ => trimmed,
        };
        let is_valid = !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit());
        if !is_valid {
            return Err(KiraError::InvalidTaxId(value.to_string()));
        }
        Ok(Self(digits.to_string()))
    }
}

/// Inclusive residue-count window applied through the `[SLEN]` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthRange {
    min: u64,
    max: u64,
}

impl LengthRange {
    pub fn new(min: u64, max: u64) -> Result<Self, KiraError> {
        if min > max {
            return Err(KiraError::InvalidLengthRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn parse(min: &str, max: &str) -> Result<Self, KiraError> {
        Self::new(parse_length(min)?, parse_length(max)?)
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }
}

fn parse_length(value: &str) -> Result<u64, KiraError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| KiraError::InvalidLength(value.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub tax_id: TaxId,
    pub range: LengthRange,
}

impl SearchQuery {
    pub fn new(tax_id: TaxId, range: LengthRange) -> Self {
        Self { tax_id, range }
    }

    pub fn term(&self) -> String {
        format!(
            "txid{}[Organism] AND {}:{}[SLEN]",
            self.tax_id,
            self.range.min(),
            self.range.max()
        )
    }
}

/// History handle returned by esearch (`WebEnv` + `query_key`) and the total
/// number of matches behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchSession {
    pub web_env: String,
    pub query_key: String,
    pub count: usize,
}

impl SearchSession {
    pub fn fetch_limit(&self) -> usize {
        self.count.min(MAX_FETCH)
    }

    pub fn is_truncated(&self) -> bool {
        self.count > MAX_FETCH
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub accession: String,
    pub length: usize,
    pub description: String,
}
