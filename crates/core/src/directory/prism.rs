//! Cluster directory over the v1 management REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::config::ClusterConfig;
use super::error::DirectoryError;
use super::traits::ClusterDirectory;
use super::types::ComputeNode;

/// Lists nodes through the `vms/` endpoint, where coordinator nodes
/// show up as controller VMs.
pub struct PrismDirectory {
    client: Client,
    config: ClusterConfig,
}

impl PrismDirectory {
    pub fn new(config: ClusterConfig) -> Result<Self, DirectoryError> {
        if config.address.trim().is_empty() {
            return Err(DirectoryError::NotConfigured);
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ClusterDirectory for PrismDirectory {
    fn name(&self) -> &str {
        "prism"
    }

    async fn list_compute_nodes(&self) -> Result<Vec<ComputeNode>, DirectoryError> {
        let url = format!("{}/vms/", self.config.base_url());
        debug!(url = %url, "Listing cluster VMs");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(self.config.password.expose()))
            .send()
            .await?;

        let status = response.status();
        if status == 401 {
            return Err(DirectoryError::Unauthorized {
                username: self.config.username.clone(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let listing: VmListing = response.json().await?;
        Ok(listing.into_nodes())
    }
}

#[derive(Debug, Deserialize)]
struct VmListing {
    #[serde(default)]
    entities: Vec<VmEntity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VmEntity {
    #[serde(default)]
    controller_vm: bool,
    #[serde(default)]
    ip_addresses: Vec<String>,
}

impl VmListing {
    /// Entities without an IP address cannot be reached and are dropped.
    fn into_nodes(self) -> Vec<ComputeNode> {
        self.entities
            .into_iter()
            .filter_map(|vm| {
                vm.ip_addresses
                    .into_iter()
                    .next()
                    .map(|address| ComputeNode::new(address, vm.controller_vm))
            })
            .collect()
    }
}
