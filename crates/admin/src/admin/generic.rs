//! Integration driven entirely by instance params.
//!
//! Used for software without a dedicated plugin: the user table and the
//! registration policy come from the `user_table` and `allow_registration`
//! params.

use async_trait::async_trait;

use super::{IntegrationAdmin, PluginInstance};
use crate::params::Params;

#[derive(Debug, Clone)]
pub struct GenericAdmin {
    instance: PluginInstance,
    user_table: String,
    registration: bool,
}

impl GenericAdmin {
    pub fn new(instance: PluginInstance, user_table: impl Into<String>, registration: bool) -> Self {
        Self {
            instance,
            user_table: user_table.into(),
            registration,
        }
    }

    /// Build from stored params. Registration defaults to allowed.
    pub fn from_params(instance: PluginInstance, params: &Params) -> Self {
        let user_table = params.get_str("user_table").unwrap_or_default();
        let registration = params
            .get_str("allow_registration")
            .map(|v| !matches!(v.as_str(), "0" | "false" | "no" | ""))
            .unwrap_or(true);

        Self::new(instance, user_table, registration)
    }
}

#[async_trait]
impl IntegrationAdmin for GenericAdmin {
    fn instance(&self) -> &PluginInstance {
        &self.instance
    }

    async fn allow_registration(&self) -> bool {
        self.registration
    }

    fn table_name(&self) -> String {
        self.user_table.clone()
    }
}
