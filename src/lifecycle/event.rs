//! Lifecycle events and custom target declarations.

use crate::context::Platform;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Point in the host build lifecycle a hook is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleEvent {
    /// Before the device is flashed.
    PreUpload,
    /// After the device is flashed.
    PostUpload,
    /// After a clean action.
    PostClean,
    /// The custom `package` target.
    Package,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 4] = [
        LifecycleEvent::PreUpload,
        LifecycleEvent::PostUpload,
        LifecycleEvent::PostClean,
        LifecycleEvent::Package,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleEvent::PreUpload => "pre-upload",
            LifecycleEvent::PostUpload => "post-upload",
            LifecycleEvent::PostClean => "post-clean",
            LifecycleEvent::Package => "package",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LifecycleEvent::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown lifecycle event: {}. Valid events: {}",
                    s,
                    LifecycleEvent::ALL.map(|e| e.as_str()).join(", ")
                )
            })
    }
}

/// A target the build tool should register so users can invoke it by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomTarget {
    pub name: &'static str,
    /// Build output the target depends on, as a `$VAR` template.
    pub dependency: String,
    pub title: &'static str,
    pub description: &'static str,
}

/// The `package` target for `platform`.
///
/// ESP32 builds depend on the linked `.elf`; other platforms on the `.bin`.
pub fn package_target(platform: &Platform) -> CustomTarget {
    CustomTarget {
        name: "package",
        dependency: format!(
            "$BUILD_DIR/${{PROGNAME}}.{}",
            platform.capabilities().package_dependency_ext
        ),
        title: "Package",
        description: "Package firmware for delivery",
    }
}

/// Every custom target this pipeline provides.
pub fn custom_targets(platform: &Platform) -> Vec<CustomTarget> {
    vec![package_target(platform)]
}
