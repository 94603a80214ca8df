//! References between declared resources

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output property of a resource that another resource can consume
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Property {
    /// Provider-assigned resource ID
    Id,
    /// Physical (auto-named) resource name
    Name,
    /// Private IP allocated to a network interface
    PrivateIpAddress,
}

/// Pointer to a property of another resource, resolved once that resource
/// has been created.
///
/// Serializes as the interpolation expression `${target.property}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Reference {
    target: String,
    property: Property,
}

impl Reference {
    pub fn new(target: impl Into<String>, property: Property) -> Self {
        Self {
            target: target.into(),
            property,
        }
    }

    /// Logical name of the referenced resource
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn property(&self) -> Property {
        self.property
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}.{}}}", self.target, self.property)
    }
}

impl From<Reference> for String {
    fn from(value: Reference) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Reference {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for Reference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .strip_prefix("${")
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(|| format!("not a reference expression: {s}"))?;
        let (target, property) = inner
            .rsplit_once('.')
            .ok_or_else(|| format!("reference is missing a property: {s}"))?;
        if target.is_empty() {
            return Err(format!("reference is missing a target: {s}"));
        }
        let property = Property::from_str(property)
            .map_err(|_| format!("unknown reference property '{property}' in {s}"))?;
        Ok(Self::new(target, property))
    }
}
