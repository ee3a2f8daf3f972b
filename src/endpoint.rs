//! Upload URL construction.
//!
//! ```text
//! {host}/{content|maven}/{owner}/{repository}/{package}/[{version}/][test/{branch}/]{target}
//! ```

use crate::artifact::UploadTarget;

/// Branch that publishes to the production channel.
pub const DEFAULT_BRANCH: &str = "master";

/// Whether `branch` publishes to the production channel.
///
/// An unset or empty branch counts as the default one.
pub fn is_default_branch(branch: Option<&str>) -> bool {
    match branch {
        None => true,
        Some(name) => name.is_empty() || name == DEFAULT_BRANCH,
    }
}

/// Build the upload URL for a validated artifact.
///
/// `host` must not end with a slash; the config loader guarantees this.
pub fn build_endpoint(target: &UploadTarget, branch: Option<&str>, host: &str) -> String {
    let mut endpoint = format!(
        "{}/{}/{}/{}/{}/",
        host,
        target.package_type.content_category(),
        target.owner,
        target.repository,
        target.package
    );

    if target.package_type.requires_version() && !target.version.is_empty() {
        endpoint.push_str(&target.version);
        endpoint.push('/');
    }

    if let Some(branch) = branch.filter(|_| !is_default_branch(branch)) {
        endpoint.push_str("test/");
        endpoint.push_str(branch);
        endpoint.push('/');
    }

    endpoint.push_str(&target.target);
    endpoint
}
