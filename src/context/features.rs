//! Feature flags that decide which optional hook steps run.

use serde::{Deserialize, Serialize};

/// What a failed hash check means for the rest of `post-upload`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashPolicy {
    /// Log the mismatch and carry on.
    #[default]
    Advisory,
    /// Treat a mismatch or malformed image as fatal and skip packaging.
    Enforce,
}

/// Where the distributable archive is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveDestination {
    /// Next to the build outputs.
    #[default]
    #[serde(alias = "build_dir")]
    Build,
    /// In the project's release directory.
    #[serde(alias = "release_dir")]
    Release,
}

/// Optional behaviour of the lifecycle hooks.
///
/// Provisioning and post-upload packaging are off unless asked for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Features {
    /// Write product/model/hwrev to the device after upload.
    pub enable_provisioning: bool,
    /// Build the release archive at the end of `post-upload`.
    pub enable_post_upload_packaging: bool,
    pub hash_policy: HashPolicy,
    pub archive_destination: ArchiveDestination,
}
