//! Firmware footer hash verification.
//!
//! ESP32 images produced by the Arduino toolchain end with a 32-byte
//! SHA-256 digest of everything before it. A matching footer proves the
//! image is the one that was built; the verified digest is then written to
//! the device so it can check its own firmware at boot.

use super::FOOTER_LEN;
use crate::{
    context::BuildContext,
    error::{ErrorExt, PipelineError, Result},
    invoker::{CommandOutcome, ProcessInvoker, ToolCommand},
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Outcome of comparing an image's footer to its payload digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verification {
    /// Footer equals `sha256(payload)`.
    Verified {
        /// Hex-encoded digest (64 characters)
        hash_hex: String,
    },
    /// Footer is something else, possibly no hash at all.
    Unverified {
        computed_hex: String,
        embedded_hex: String,
    },
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified { .. })
    }
}

/// Result of [`verify_and_propagate`].
#[derive(Clone, Debug, Serialize)]
pub struct HashReport {
    pub image: PathBuf,
    pub verification: Verification,
    /// The provisioning-tool run, if one was issued.
    pub propagation: Option<CommandOutcome>,
}

/// Compare the trailing footer of `image` with the SHA-256 of the rest.
///
/// # Errors
///
/// [`PipelineError::MalformedImage`] if the image is shorter than the footer.
/// The path in the error is empty; [`verify_file`] fills it in.
pub fn verify_image(image: &[u8]) -> Result<Verification> {
    if image.len() < FOOTER_LEN {
        return Err(PipelineError::MalformedImage {
            path: PathBuf::new(),
            len: image.len(),
        });
    }

    let (payload, footer) = image.split_at(image.len() - FOOTER_LEN);
    let computed = Sha256::digest(payload);

    if computed.as_slice() == footer {
        Ok(Verification::Verified {
            hash_hex: hex::encode(footer),
        })
    } else {
        Ok(Verification::Unverified {
            computed_hex: hex::encode(computed),
            embedded_hex: hex::encode(footer),
        })
    }
}

/// Read the image at `path` and run [`verify_image`] on it.
pub async fn verify_file(path: &Path) -> Result<Verification> {
    let image = tokio::fs::read(path)
        .await
        .fs_context("reading firmware image", path)?;

    verify_image(&image).map_err(|e| match e {
        PipelineError::MalformedImage { len, .. } => PipelineError::MalformedImage {
            path: path.to_path_buf(),
            len,
        },
        other => other,
    })
}

/// The provisioning-tool call that stores a verified hash on the device.
pub fn propagation_command(ctx: &BuildContext, hash_hex: &str, port: &str) -> ToolCommand {
    ToolCommand::new(ctx.provisioning_tool())
        .arg("--firmware-hash")
        .arg(hash_hex)
        .arg(port)
}

/// Verify the image and, when the footer matches, write the hash to the device.
///
/// A mismatch is not an error: it is logged and reported as
/// [`Verification::Unverified`], and no command is issued.
pub async fn verify_and_propagate<I: ProcessInvoker>(
    image_path: &Path,
    ctx: &BuildContext,
    invoker: &I,
) -> Result<HashReport> {
    log::info!("Updating firmware hash...");
    log::info!("Image: {}", image_path.display());

    let verification = verify_file(image_path).await?;

    let propagation = match &verification {
        Verification::Verified { hash_hex } => {
            log::info!("Firmware hash verified: {}", hash_hex);
            match ctx.upload_port() {
                Some(port) => {
                    let cmd = propagation_command(ctx, hash_hex, port);
                    Some(invoker.execute(&cmd).await)
                }
                None => {
                    log::warn!("No upload port known, not writing firmware hash to device");
                    None
                }
            }
        }
        Verification::Unverified {
            computed_hex,
            embedded_hex,
        } => {
            log::warn!(
                "Firmware hash footer does not match (computed {}, embedded {}), not updating device",
                computed_hex,
                embedded_hex
            );
            None
        }
    };

    Ok(HashReport {
        image: image_path.to_path_buf(),
        verification,
        propagation,
    })
}
