//! Device identity provisioning.

use crate::{
    context::{BuildContext, ProvisionIdentity},
    invoker::{CommandOutcome, ProcessInvoker, ToolCommand},
};
use serde::Serialize;

/// What [`provision`] did.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProvisionResult {
    /// Board has no identity mapping on this platform.
    Unmapped,
    /// Identity is known but there is no port to talk to.
    NoUploadPort,
    /// The provisioning tool was run.
    Issued { outcome: CommandOutcome },
}

/// Build the identity provisioning command for `identity` on `port`.
pub fn provision_command(ctx: &BuildContext, identity: &ProvisionIdentity, port: &str) -> ToolCommand {
    ToolCommand::new(ctx.provisioning_tool()).args([
        "--product",
        identity.product,
        "--model",
        identity.model,
        "--hwrev",
        identity.hwrev,
        "--rom",
        port,
    ])
}

/// Write product, model and hardware revision to the attached device.
///
/// Only boards present in the platform's identity table are provisioned;
/// anything else is a no-op. The caller decides whether provisioning runs
/// at all (see `Features::enable_provisioning`).
pub async fn provision<I: ProcessInvoker>(ctx: &BuildContext, invoker: &I) -> ProvisionResult {
    let Some(identity) = ctx.platform().provision_identity(ctx.board()) else {
        log::info!(
            "No provisioning identity for {} on {}, skipping",
            ctx.board(),
            ctx.platform()
        );
        return ProvisionResult::Unmapped;
    };

    let Some(port) = ctx.upload_port() else {
        log::warn!("No upload port known, cannot provision {}", ctx.board());
        return ProvisionResult::NoUploadPort;
    };

    log::info!(
        "Provisioning device on {} (product {}, model {}, hwrev {})",
        port,
        identity.product,
        identity.model,
        identity.hwrev
    );

    let outcome = invoker
        .execute(&provision_command(ctx, &identity, port))
        .await;
    ProvisionResult::Issued { outcome }
}
