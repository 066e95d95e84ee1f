use crate::utils::error::{Result, TaxonomyError};
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Starts checks for the named field.
pub fn field(name: &str) -> Field<'_> {
    Field {
        name,
        record_id: None,
    }
}

/// A named value under validation.
///
/// Settings fields fail with `InvalidConfigValueError`; once bound to a record with
/// [`of_record`](Field::of_record) the same checks fail with `InvalidFieldError`, which a
/// batch reports per record instead of aborting.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    name: &'a str,
    record_id: Option<&'a str>,
}

impl<'a> Field<'a> {
    pub fn of_record(self, record_id: &'a str) -> Self {
        Self {
            record_id: Some(record_id),
            ..self
        }
    }

    pub fn reject(&self, value: impl Display, reason: impl Into<String>) -> TaxonomyError {
        let (field, value, reason) = (self.name.to_string(), value.to_string(), reason.into());
        match self.record_id {
            Some(record_id) => TaxonomyError::InvalidFieldError {
                record_id: record_id.to_string(),
                field,
                value,
                reason,
            },
            None => TaxonomyError::InvalidConfigValueError {
                field,
                value,
                reason,
            },
        }
    }

    pub fn non_empty(&self, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(self.reject(value, "must not be blank"));
        }
        Ok(())
    }

    /// Absolute `http`/`https` URL with a host.
    pub fn http_url(&self, value: &str) -> Result<()> {
        let url = Url::parse(value.trim()).map_err(|e| self.reject(value, e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(self.reject(value, format!("scheme '{}' is not http(s)", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(self.reject(value, "URL has no host"));
        }
        Ok(())
    }

    /// A file path: not blank, no NUL byte, not a bare directory.
    pub fn file_path(&self, value: &str) -> Result<()> {
        self.non_empty(value)?;
        if value.contains('\0') {
            return Err(self.reject(value.escape_default(), "contains a NUL byte"));
        }
        if value.ends_with('/') || Path::new(value).file_name().is_none() {
            return Err(self.reject(value, "must name a file, not a directory"));
        }
        Ok(())
    }

    /// Case-insensitive extension check against `allowed`.
    pub fn extension(&self, value: &str, allowed: &[&str]) -> Result<()> {
        let extension = Path::new(value).extension().and_then(|ext| ext.to_str());
        match extension {
            Some(ext) if allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)) => Ok(()),
            Some(ext) => Err(self.reject(
                value,
                format!("'.{}' is not one of: {}", ext, allowed.join(", ")),
            )),
            None => Err(self.reject(value, format!("expected one of: {}", allowed.join(", ")))),
        }
    }

    pub fn at_least(&self, value: usize, min: usize) -> Result<()> {
        if value < min {
            return Err(self.reject(value, format!("must be at least {}", min)));
        }
        Ok(())
    }

    pub fn within<T: PartialOrd + Display>(&self, value: T, range: RangeInclusive<T>) -> Result<()> {
        if !range.contains(&value) {
            return Err(self.reject(
                &value,
                format!("must be between {} and {}", range.start(), range.end()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_field_errors() {
        let err = field("workers").at_least(0, 1).unwrap_err();
        assert!(matches!(
            err,
            TaxonomyError::InvalidConfigValueError { ref field, ref value, .. }
                if field == "workers" && value == "0"
        ));
    }

    #[test]
    fn test_record_field_errors_carry_record_id() {
        let err = field("year").of_record("spot").within(1890, 1950..=2025).unwrap_err();
        match err {
            TaxonomyError::InvalidFieldError {
                record_id,
                field,
                value,
                ..
            } => {
                assert_eq!(record_id, "spot");
                assert_eq!(field, "year");
                assert_eq!(value, "1890");
            }
            other => panic!("expected record field error, got {:?}", other),
        }
        assert!(!field("year").of_record("spot").within(1890, 1950..=2025).unwrap_err().is_fatal());
    }

    #[test]
    fn test_http_url() {
        let url = field("source_url");
        assert!(url.http_url("https://robots.ieee.org/robots/spot/").is_ok());
        assert!(url.http_url("http://example.com").is_ok());
        assert!(url.http_url("").is_err());
        assert!(url.http_url("spot robot").is_err());
        assert!(url.http_url("ftp://example.com").is_err());
        assert!(url.http_url("mailto:robots@example.com").is_err());
    }

    #[test]
    fn test_file_path_and_extension() {
        let input = field("input");
        assert!(input.file_path("data/robots.ndjson").is_ok());
        assert!(input.file_path("  ").is_err());
        assert!(input.file_path("data/").is_err());

        assert!(input.extension("robots.JSON", &["json", "ndjson"]).is_ok());
        assert!(input.extension("robots.csv", &["json", "ndjson"]).is_err());
        assert!(input.extension("robots", &["json", "ndjson"]).is_err());
    }
}
