//! Required-field checks run before any network call.

use super::UploadTarget;
use std::fmt;
use thiserror::Error;

/// A required artifact setting that was left empty.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MissingField {
    /// `package`
    Package,
    /// `file`
    File,
    /// `owner`
    Owner,
    /// `repository`
    Repository,
    /// `version`
    Version,
    /// `target`
    Target,
    /// `distr`
    Distribution,
    /// `component`
    Component,
    /// `arch`
    Architectures,
}

impl MissingField {
    /// Key of this field in the plugin settings.
    pub fn setting_name(&self) -> &'static str {
        match self {
            MissingField::Package => "package",
            MissingField::File => "file",
            MissingField::Owner => "owner",
            MissingField::Repository => "repository",
            MissingField::Version => "version",
            MissingField::Target => "target",
            MissingField::Distribution => "distr",
            MissingField::Component => "component",
            MissingField::Architectures => "arch",
        }
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.setting_name())
    }
}

/// Every missing field of one artifact, in settings order.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub struct ValidationError {
    /// Package name of the rejected artifact (may itself be empty)
    pub package: String,
    /// Missing fields, never empty
    pub missing: Vec<MissingField>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot process package {} - Missing argument(s):",
            self.package
        )?;
        for field in &self.missing {
            write!(f, "\n    {} not defined in yaml config", field)?;
        }
        Ok(())
    }
}

impl UploadTarget {
    /// Check every required field, reporting all of the missing ones at once.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();

        let common = [
            (MissingField::Package, self.package.is_empty()),
            (MissingField::File, self.file.is_empty()),
            (MissingField::Owner, self.owner.is_empty()),
            (MissingField::Repository, self.repository.is_empty()),
            (
                MissingField::Version,
                self.version.is_empty() && self.package_type.requires_version(),
            ),
            (MissingField::Target, self.target.is_empty()),
        ];
        missing.extend(
            common
                .into_iter()
                .filter_map(|(field, absent)| absent.then_some(field)),
        );
        missing.extend(self.package_type.missing_fields(self));

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                package: self.package.clone(),
                missing,
            })
        }
    }
}
