//! Supported target platforms and what each one's toolchain produces.

use std::fmt;
use std::str::FromStr;

/// Target platform of the firmware build.
///
/// Platform conditionals live here instead of being string comparisons
/// scattered through the hooks: every gate (hash footer, boot-app stub,
/// release tooling, provisioning identity) is answered from this one table.
///
/// # Examples
///
/// ```
/// use rnode_build_hooks::context::Platform;
///
/// let platform: Platform = "espressif32".parse().unwrap();
/// assert!(platform.capabilities().has_hash_footer);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    /// ESP32 family (Arduino framework). Embeds a SHA-256 footer.
    Espressif32,
    /// nRF52 family. No footer, no boot-app stub.
    NordicNrf52,
    /// Any platform the pipeline has no table entry for.
    Other(String),
}

/// Per-platform capability flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Toolchain appends a 32-byte SHA-256 of the payload to the image.
    pub has_hash_footer: bool,
    /// Framework ships a `boot_app0.bin` that belongs in the package.
    pub has_boot_app_stub: bool,
    /// Project release directory carries flashing tool + console image.
    pub has_release_tools: bool,
    /// Extension of the build output the package target depends on.
    pub package_dependency_ext: &'static str,
}

/// Product, model and hardware revision codes written during provisioning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProvisionIdentity {
    pub product: &'static str,
    pub model: &'static str,
    pub hwrev: &'static str,
}

const ESPRESSIF32: Capabilities = Capabilities {
    has_hash_footer: true,
    has_boot_app_stub: true,
    has_release_tools: true,
    package_dependency_ext: "elf",
};

const NO_CAPABILITIES: Capabilities = Capabilities {
    has_hash_footer: false,
    has_boot_app_stub: false,
    has_release_tools: false,
    package_dependency_ext: "bin",
};

/// (platform, board) -> identity. Boards missing here are not provisioned.
const PROVISION_TABLE: &[(&str, &str, ProvisionIdentity)] = &[(
    "espressif32",
    "ttgo-t-beam",
    ProvisionIdentity {
        product: "e0",
        model: "e9",
        hwrev: "1",
    },
)];

impl Platform {
    /// Platform for a project-option name. Unknown names become [`Platform::Other`].
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "espressif32" => Platform::Espressif32,
            "nordicnrf52" => Platform::NordicNrf52,
            other => Platform::Other(other.to_string()),
        }
    }

    /// Name as written in the project options.
    pub fn as_str(&self) -> &str {
        match self {
            Platform::Espressif32 => "espressif32",
            Platform::NordicNrf52 => "nordicnrf52",
            Platform::Other(name) => name,
        }
    }

    /// Capability lookup.
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Platform::Espressif32 => ESPRESSIF32,
            Platform::NordicNrf52 | Platform::Other(_) => NO_CAPABILITIES,
        }
    }

    /// Provisioning identity for `board` on this platform, if one is mapped.
    pub fn provision_identity(&self, board: &str) -> Option<ProvisionIdentity> {
        PROVISION_TABLE
            .iter()
            .find(|(platform, b, _)| *platform == self.as_str() && *b == board)
            .map(|(_, _, identity)| *identity)
    }

    /// Relative location of the boot-app stub inside the packages directory.
    pub fn boot_app_stub_source(&self) -> Option<&'static str> {
        match self {
            Platform::Espressif32 => {
                Some("framework-arduinoespressif32/tools/partitions/boot_app0.bin")
            }
            _ => None,
        }
    }

    /// Release tooling as `(path relative to release dir, name inside the package)`.
    pub fn release_tools(&self) -> &'static [(&'static str, &'static str)] {
        if self.capabilities().has_release_tools {
            &[
                ("esptool/esptool.py", "esptool.py"),
                ("console_image.bin", "console_image.bin"),
            ]
        } else {
            &[]
        }
    }
}

impl FromStr for Platform {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Platform::from_name(s))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
