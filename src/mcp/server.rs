//! MCP server over stdio
//!
//! Standard output carries nothing but protocol frames; logging goes to
//! standard error.

use super::tools::EverythingTools;
use anyhow::Result;
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::transport::stdio;
use rmcp::{tool_handler, ServerHandler, ServiceExt};
use tracing::info;

#[tool_handler]
impl ServerHandler for EverythingTools {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Search the Everything file index. Results are JSON arrays of objects keyed by column name."
                    .to_string(),
            ),
            ..Default::default()
        };
        info.server_info.name = "everything-search".to_string();
        info.server_info.version = crate::VERSION.to_string();
        info
    }
}

/// Serve the tools on stdin/stdout until the client disconnects
pub async fn serve_stdio(tools: EverythingTools) -> Result<()> {
    info!("Tool server listening on stdio");
    let service = tools.serve(stdio()).await?;
    service.waiting().await?;
    info!("stdin closed, tool server stopping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::stub::StubRunner;
    use crate::search::EverythingSearch;
    use rmcp::model::{CallToolRequestParam, ProtocolVersion};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn tools(runner: &StubRunner) -> EverythingTools {
        let search =
            EverythingSearch::with_runner(std::env::current_exe().unwrap(), Arc::new(runner.clone()))
                .unwrap();
        EverythingTools::new(search)
    }

    #[tokio::test]
    async fn test_session() {
        let runner = StubRunner::new().stdout("Filename\nC:\\notes.txt").stdout("1.1.0.30");
        let server_tools = tools(&runner);
        let (server_io, client_io) = tokio::io::duplex(64 * 1024);

        tokio::spawn(async move {
            if let Ok(service) = server_tools.serve(server_io).await {
                let _ = service.waiting().await;
            }
        });

        let client = ().serve(client_io).await.unwrap();

        let info = client.peer_info().unwrap();
        assert_eq!(info.server_info.name, "everything-search");
        assert_eq!(info.protocol_version, ProtocolVersion::default());
        assert!(info.capabilities.tools.is_some());

        let listed = client.list_all_tools().await.unwrap();
        assert_eq!(listed.len(), 9);

        let arguments = json!({ "query": "notes" });
        let result = client
            .call_tool(CallToolRequestParam {
                name: "search_files".into(),
                arguments: arguments.as_object().cloned(),
            })
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(false));
        let text = result.content[0].as_text().unwrap().text.clone();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!([{ "Filename": "C:\\notes.txt" }]));
        assert_eq!(runner.last_args().args()[0], "notes");

        let result = client
            .call_tool(CallToolRequestParam {
                name: "get_everything_version".into(),
                arguments: None,
            })
            .await
            .unwrap();
        let text = result.content[0].as_text().unwrap().text.clone();
        assert_eq!(text, r#"{"version":"1.1.0.30"}"#);

        client.cancel().await.unwrap();
    }
}
