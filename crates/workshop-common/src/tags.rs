//! Resource tag constants for the workshop stack
//!
//! Every Azure resource declared by the stack carries these tags so that a
//! deployment's resources can be found again from the portal or the CLI.
//!
//! ## Tag Schema
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `workshop-stack:tool` | Static identifier ("workshop-stack") |
//! | `workshop-stack:deployment-id` | Unique deployment identifier (UUID) |
//! | `workshop-stack:created-at` | RFC 3339 declaration timestamp |

use std::collections::BTreeMap;

/// Tag key for tool identification - all workshop-stack resources have this
pub const TAG_TOOL: &str = "workshop-stack:tool";

/// Tag value for tool identification
pub const TAG_TOOL_VALUE: &str = "workshop-stack";

/// Tag key for the deployment ID
pub const TAG_DEPLOYMENT_ID: &str = "workshop-stack:deployment-id";

/// Tag key for creation timestamp (RFC 3339 format)
pub const TAG_CREATED_AT: &str = "workshop-stack:created-at";

/// Helper to format creation timestamp for tags
pub fn format_created_at(time: chrono::DateTime<chrono::Utc>) -> String {
    time.to_rfc3339()
}

/// Standard tag set for one deployment
pub fn standard_tags(
    deployment_id: &str,
    created_at: chrono::DateTime<chrono::Utc>,
) -> BTreeMap<String, String> {
    BTreeMap::from([
        (TAG_TOOL.to_string(), TAG_TOOL_VALUE.to_string()),
        (TAG_DEPLOYMENT_ID.to_string(), deployment_id.to_string()),
        (TAG_CREATED_AT.to_string(), format_created_at(created_at)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_is_rfc3339() {
        let now = Utc::now();
        let formatted = format_created_at(now);
        assert!(chrono::DateTime::parse_from_rfc3339(&formatted).is_ok());
    }

    #[test]
    fn test_standard_tags() {
        let tags = standard_tags("dep-1", Utc::now());
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[TAG_TOOL], TAG_TOOL_VALUE);
        assert_eq!(tags[TAG_DEPLOYMENT_ID], "dep-1");
        assert!(chrono::DateTime::parse_from_rfc3339(&tags[TAG_CREATED_AT]).is_ok());
    }
}
