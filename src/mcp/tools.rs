use std::sync::Arc;

use chrono::Utc;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::schemars;
use rmcp::schemars::JsonSchema;
use rmcp::{ServerHandler, tool, tool_handler, tool_router};
use tokio::sync::Mutex;

use crate::export;
use crate::share;
use crate::store::Workspace;

#[derive(Debug, Clone, serde::Deserialize, JsonSchema)]
pub struct SearchCatalogueParams {
    #[schemars(description = "Text to search for in server ids, names, descriptions and keywords")]
    pub query: Option<String>,
    #[schemars(description = "Optional category to filter by")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize, JsonSchema)]
pub struct ListBundlesParams {
    #[schemars(description = "Optional tag to filter by")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize, JsonSchema)]
pub struct BundleParams {
    #[schemars(description = "Bundle id or name")]
    pub bundle: String,
}

pub struct BundlerMcpServer {
    workspace: Arc<Mutex<Workspace>>,
    tool_router: ToolRouter<Self>,
}

fn error_result(message: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message.into())])
}

#[tool_router]
impl BundlerMcpServer {
    pub fn new(workspace: Arc<Mutex<Workspace>>) -> Self {
        Self {
            workspace,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Search the MCP server catalogue")]
    async fn search_catalogue(
        &self,
        Parameters(params): Parameters<SearchCatalogueParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let mut workspace = self.workspace.lock().await;
        let query = params.query.unwrap_or_default();
        let outcome = match workspace.search_catalogue(&query, params.category.as_deref()) {
            Ok(outcome) => outcome,
            Err(e) => return Ok(error_result(format!("Search failed: {e}"))),
        };

        let lines: Vec<String> = outcome
            .hits
            .iter()
            .map(|hit| {
                let desc = hit
                    .description
                    .as_ref()
                    .map(|d| format!(" - {d}"))
                    .unwrap_or_default();
                format!("{} ({}){desc}", hit.name, hit.id)
            })
            .collect();

        let text = if lines.is_empty() {
            "No servers found.".to_string()
        } else if outcome.from_cache {
            format!("(cached results)\n{}", lines.join("\n"))
        } else {
            lines.join("\n")
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "List saved bundles")]
    async fn list_bundles(
        &self,
        Parameters(params): Parameters<ListBundlesParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let workspace = self.workspace.lock().await;
        let output: Vec<String> = workspace
            .bundles
            .list_tagged(params.tag.as_deref())
            .iter()
            .map(|b| format!("{} ({} servers) {}", b.name, b.servers.len(), b.id))
            .collect();

        let text = if output.is_empty() {
            "No bundles found.".to_string()
        } else {
            output.join("\n")
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "Get the servers, packages and connections of a bundle")]
    async fn get_bundle(
        &self,
        Parameters(params): Parameters<BundleParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let workspace = self.workspace.lock().await;
        let bundle = match workspace.bundles.find(&params.bundle) {
            Ok(bundle) => bundle,
            Err(e) => return Ok(error_result(e.to_string())),
        };
        let catalogue = workspace.catalogue().ok();

        let mut info = format!(
            "Name: {}\nId: {}\nDescription: {}\nServers:",
            bundle.name,
            bundle.id,
            if bundle.description.is_empty() {
                "(none)"
            } else {
                bundle.description.as_str()
            }
        );
        for entry in &bundle.servers {
            let name = catalogue
                .as_ref()
                .and_then(|c| c.get(&entry.server_id))
                .map_or("(not in catalogue)", |s| s.name.as_str());
            let connection = entry
                .connection_id
                .as_deref()
                .and_then(|id| workspace.connections.get(id))
                .map(|c| format!(", connection '{}'", c.name))
                .unwrap_or_default();
            info.push_str(&format!(
                "\n- {} {name} (package {}{connection})",
                entry.server_id, entry.package_index
            ));
        }
        Ok(CallToolResult::success(vec![Content::text(info)]))
    }

    #[tool(description = "Export a bundle as an mcpServers launcher configuration (JSON)")]
    async fn export_bundle(
        &self,
        Parameters(params): Parameters<BundleParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let workspace = self.workspace.lock().await;
        let bundle = match workspace.bundles.find(&params.bundle) {
            Ok(bundle) => bundle,
            Err(e) => return Ok(error_result(e.to_string())),
        };
        let catalogue = match workspace.catalogue() {
            Ok(catalogue) => catalogue,
            Err(e) => return Ok(error_result(e.to_string())),
        };

        let document = export::launcher_document(bundle, &catalogue, &*workspace);
        match serde_json::to_string_pretty(&document) {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Ok(error_result(format!("Failed to serialize export: {e}"))),
        }
    }

    #[tool(description = "Create a share token and link for a bundle")]
    async fn share_bundle(
        &self,
        Parameters(params): Parameters<BundleParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let workspace = self.workspace.lock().await;
        let bundle = match workspace.bundles.find(&params.bundle) {
            Ok(bundle) => bundle,
            Err(e) => return Ok(error_result(e.to_string())),
        };

        match share::encode_bundle(bundle, Utc::now()) {
            Ok(token) => {
                let link = share::share_link(workspace.settings(), &token);
                Ok(CallToolResult::success(vec![Content::text(format!(
                    "Token: {token}\nLink: {link}"
                ))]))
            }
            Err(e) => Ok(error_result(format!("Cannot share bundle: {e}"))),
        }
    }
}

#[tool_handler]
impl ServerHandler for BundlerMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Catalogue and bundle manager for MCP servers. \
                 Use search_catalogue to find servers, list_bundles and get_bundle \
                 to inspect saved bundles, export_bundle for a launcher config, \
                 and share_bundle for a share link."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
