//! sw_install and sw_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;
use swkit_core::ServiceWorkerCore;
use swkit_core::lifecycle::LifecycleState;
use swkit_core::worker::{ActivateReport, InstallReport};

use super::json_result;

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize)]
pub struct InstallOutput {
    pub install: InstallReport,
    /// Present when the worker skipped waiting and activated right away.
    pub activate: Option<ActivateReport>,
    pub state: LifecycleState,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateOutput {
    #[serde(flatten)]
    pub report: ActivateReport,
    pub state: LifecycleState,
}

/// Run the install event and, if the worker asks for it, activation.
pub async fn install_impl(core: &ServiceWorkerCore) -> Result<CallToolResult, McpError> {
    let install = core.on_install().await?;
    let activate = if install.skip_waiting { core.skip_waiting().await } else { None };

    json_result(&InstallOutput { install, activate, state: core.state().await })
}

/// Run the activate event on an installed worker.
pub async fn activate_impl(core: &ServiceWorkerCore) -> Result<CallToolResult, McpError> {
    let report = core.on_activate().await?;
    json_result(&ActivateOutput { report, state: core.state().await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{core, result_json};

    #[tokio::test]
    async fn test_install_skips_waiting() {
        let core = core(&[("https://site.test/", "home")]).await;

        let result = install_impl(&core).await.unwrap();
        let output = result_json(&result);

        assert_eq!(output["install"]["store"], "static-v1");
        assert_eq!(output["install"]["precached"], 1);
        assert_eq!(output["activate"]["clients_claimed"], true);
        assert_eq!(output["state"], "activated");
    }

    #[tokio::test]
    async fn test_install_failure_is_an_error() {
        let core = core(&[]).await;
        assert!(install_impl(&core).await.is_err());
        assert_eq!(core.state().await, LifecycleState::Redundant);
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let core = core(&[]).await;
        let err = activate_impl(&core).await.unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode(-32010));
    }
}
