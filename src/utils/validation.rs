use crate::utils::error::{ZiplinerError, Result};
use regex::Regex;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ZiplinerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ZiplinerError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ZiplinerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ZiplinerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ZiplinerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(ZiplinerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

/// The csv crate only splits on a single byte.
pub fn validate_delimiter(field_name: &str, delimiter: &str) -> Result<u8> {
    match delimiter.as_bytes() {
        [byte] if byte.is_ascii() && *byte != b'"' && *byte != b'\n' && *byte != b'\r' => {
            Ok(*byte)
        }
        _ => Err(ZiplinerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: delimiter.to_string(),
            reason: "Delimiter must be a single ASCII character other than quote or newline"
                .to_string(),
        }),
    }
}

pub fn validate_country_codes(field_name: &str, codes: &[String]) -> Result<()> {
    if codes.is_empty() {
        return Err(ZiplinerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: String::new(),
            reason: "At least one country code is required".to_string(),
        });
    }

    let pattern = Regex::new(r"^[A-Z]{2}$").map_err(|e| ZiplinerError::ConfigError {
        message: format!("invalid country code pattern: {}", e),
    })?;

    for code in codes {
        let normalized = code.trim().to_uppercase();
        if !pattern.is_match(&normalized) {
            return Err(ZiplinerError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: code.clone(),
                reason: "Country codes must be two-letter ISO 3166-1 alpha-2 codes".to_string(),
            });
        }
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ZiplinerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ZiplinerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("routing.endpoint", "https://router.project-osrm.org").is_ok());
        assert!(validate_url("routing.endpoint", "http://localhost:5000").is_ok());
        assert!(validate_url("routing.endpoint", "").is_err());
        assert!(validate_url("routing.endpoint", "invalid-url").is_err());
        assert!(validate_url("routing.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("routing.max_attempts", 3, 1).is_ok());
        assert!(validate_positive_number("routing.max_attempts", 0, 1).is_err());
    }

    #[test]
    fn test_validate_delimiter() {
        assert_eq!(validate_delimiter("input.delimiter", ";").unwrap(), b';');
        assert_eq!(validate_delimiter("input.delimiter", "\t").unwrap(), b'\t');
        assert!(validate_delimiter("input.delimiter", "").is_err());
        assert!(validate_delimiter("input.delimiter", ";;").is_err());
        assert!(validate_delimiter("input.delimiter", "\"").is_err());
        assert!(validate_delimiter("input.delimiter", "§").is_err());
    }

    #[test]
    fn test_validate_country_codes() {
        let codes = vec!["CH".to_string(), " de ".to_string()];
        assert!(validate_country_codes("postal.countries", &codes).is_ok());

        assert!(validate_country_codes("postal.countries", &[]).is_err());
        assert!(validate_country_codes("postal.countries", &["CHE".to_string()]).is_err());
        assert!(validate_country_codes("postal.countries", &["C1".to_string()]).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("map.zoom", 7u8, 0, 19).is_ok());
        assert!(validate_range("map.zoom", 20u8, 0, 19).is_err());
    }
}
