//! Artifact descriptions read from the plugin settings.
//!
//! An [`UploadTarget`] is one entry of the `artifacts` list. Its
//! [`PackageType`] decides which URL family it is published under, whether a
//! version is required, and which extra headers and fields it needs.

mod validation;

pub use validation::{MissingField, ValidationError};

use crate::request::{DEBIAN_ARCHITECTURE_HEADER, DEBIAN_COMPONENT_HEADER, DEBIAN_DISTRIBUTION_HEADER};
use serde::{Deserialize, Deserializer};

/// Package flavours understood by the service.
///
/// The plugin document names them with the `type` key; anything other than
/// `Maven` or `Debian` (case-insensitive) is a generic upload.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum PackageType {
    /// Plain file upload under the `content` API.
    #[default]
    Generic,

    /// Maven artifact under the `maven` API. The version is implied by the
    /// target path, so no version segment is used.
    Maven,

    /// Debian package. Needs distribution, component and architectures.
    Debian,
}

impl PackageType {
    /// Parse a `type` value from the plugin settings.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("maven") {
            PackageType::Maven
        } else if name.eq_ignore_ascii_case("debian") {
            PackageType::Debian
        } else {
            PackageType::Generic
        }
    }

    /// API family the upload URL starts with.
    pub fn content_category(&self) -> &'static str {
        match self {
            PackageType::Maven => "maven",
            PackageType::Generic | PackageType::Debian => "content",
        }
    }

    /// Whether uploads of this type carry a version segment and must
    /// therefore have a version.
    pub fn requires_version(&self) -> bool {
        !matches!(self, PackageType::Maven)
    }

    /// Type-specific required fields that are missing from `target`.
    pub(crate) fn missing_fields(&self, target: &UploadTarget) -> Vec<MissingField> {
        match self {
            PackageType::Debian => {
                let mut missing = Vec::new();
                if target.distribution.is_empty() {
                    missing.push(MissingField::Distribution);
                }
                if target.component.is_empty() {
                    missing.push(MissingField::Component);
                }
                if target.architectures.is_empty() {
                    missing.push(MissingField::Architectures);
                }
                missing
            }
            PackageType::Generic | PackageType::Maven => Vec::new(),
        }
    }

    /// Type-specific request headers for `target`.
    pub(crate) fn headers(&self, target: &UploadTarget) -> Vec<(&'static str, String)> {
        match self {
            PackageType::Debian => vec![
                (DEBIAN_DISTRIBUTION_HEADER, target.distribution.clone()),
                (DEBIAN_COMPONENT_HEADER, target.component.clone()),
                (DEBIAN_ARCHITECTURE_HEADER, target.architectures.join(",")),
            ],
            PackageType::Generic | PackageType::Maven => Vec::new(),
        }
    }
}

impl From<String> for PackageType {
    fn from(name: String) -> Self {
        PackageType::from_name(&name)
    }
}

/// One artifact to upload, as configured in the `artifacts` list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UploadTarget {
    /// File to upload, relative to the workspace root
    pub file: String,
    /// Package flavour (`type` in the settings)
    #[serde(rename = "type")]
    pub package_type: PackageType,
    /// Subject (user or organisation) owning the repository
    pub owner: String,
    /// Repository name
    pub repository: String,
    /// Package name inside the repository
    pub package: String,
    /// Destination path inside the package version
    pub target: String,
    /// Package version, coerced to text when given as a number
    #[serde(deserialize_with = "coerce_version")]
    pub version: String,
    /// Debian distribution (`distr` in the settings)
    #[serde(rename = "distr")]
    pub distribution: String,
    /// Debian component
    pub component: String,
    /// Debian architectures (`arch` in the settings)
    #[serde(rename = "arch")]
    pub architectures: Vec<String>,
    /// Publish the version right after upload
    pub publish: bool,
    /// Replace an already uploaded file
    #[serde(rename = "override")]
    pub override_existing: bool,
}

/// Accept `version: 1.2`, `version: "1.2"` or `version: 3` alike.
fn coerce_version<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(String::new()),
        serde_json::Value::String(version) => Ok(version),
        serde_json::Value::Number(version) => Ok(version.to_string()),
        serde_json::Value::Bool(version) => Ok(version.to_string()),
        other => Err(D::Error::custom(format!(
            "version must be a string or a number, found {}",
            other
        ))),
    }
}
