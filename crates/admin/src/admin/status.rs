//! Status reporting.

use tracing::debug;

use super::IntegrationAdmin;
use crate::context::AdminContext;
use crate::locale::keys;
use crate::log::Severity;

/// Record the status code of an instance.
///
/// Failures are logged at error level against the instance and never
/// reach the caller.
pub async fn update_status(ctx: &AdminContext, admin: &dyn IntegrationAdmin, status: i16) {
    let name = admin.instance().name.as_str();

    let result = match ctx.store().update_status(name, status).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(anyhow::anyhow!("{}: {name}", ctx.text(keys::NO_RECORD))),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => debug!(instance = %name, status, "integration status updated"),
        Err(e) => ctx.raise(Severity::Error, &format!("{e:#}"), name),
    }
}
