//! Skillgraph-specific error codes
//!
//! Error codes follow the pattern: SKG-{CATEGORY}-{3-digit number}
//!
//! Categories (2 uppercase letters):
//! - IN: Input errors (malformed identifiers, invalid records)
//! - ST: Store errors (graph or document store failures)
//! - CF: Configuration errors
//!
//! Each error code is stable and should not be reused.

/// Malformed identifier or record rejected at the call boundary
pub const SKG_IN_001_INVALID_INPUT: &str = "SKG-IN-001";

/// Edge endpoint node does not exist
pub const SKG_ST_001_MISSING_ENDPOINT: &str = "SKG-ST-001";

/// Backing store unreachable or failed mid-operation
pub const SKG_ST_002_STORE_UNAVAILABLE: &str = "SKG-ST-002";

/// Configuration could not be parsed or failed validation
pub const SKG_CF_001_INVALID_CONFIG: &str = "SKG-CF-001";

/// Error code documentation
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | SKG-IN-001 | Invalid input | Pass non-empty identifiers; fix the record named in the message |
/// | SKG-ST-001 | Missing endpoint | Insert the Skill/Role node before linking it, or rebuild the graph |
/// | SKG-ST-002 | Store unavailable | Check the database path; retry is the caller's decision |
/// | SKG-CF-001 | Invalid configuration | Fix the TOML key named in the message |
pub const ERROR_CODE_DOCUMENTATION: &str = "Error code documentation available in source";

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CODES: [&str; 4] = [
        SKG_IN_001_INVALID_INPUT,
        SKG_ST_001_MISSING_ENDPOINT,
        SKG_ST_002_STORE_UNAVAILABLE,
        SKG_CF_001_INVALID_CONFIG,
    ];

    #[test]
    fn test_error_codes_are_unique() {
        let mut unique = std::collections::HashSet::new();
        for code in ALL_CODES {
            assert!(unique.insert(code), "Duplicate error code detected: {}", code);
        }
    }

    #[test]
    fn test_error_code_format() {
        for code in ALL_CODES {
            let parts: Vec<&str> = code.split('-').collect();
            assert_eq!(parts.len(), 3, "Error code must have 3 parts: {}", code);
            assert_eq!(parts[0], "SKG");
            assert_eq!(parts[1].len(), 2, "Category must be 2 letters: {}", code);
            assert!(parts[1].chars().all(|c| c.is_ascii_uppercase()));
            assert_eq!(parts[2].len(), 3, "Number must be 3 digits: {}", code);
            assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
        }
    }
}
