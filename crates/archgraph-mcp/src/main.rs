mod server;

use rmcp::ServiceExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use server::ArchgraphServer;

const SERVER_NAME: &str = "archgraph";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle `archgraph-mcp init` subcommand
    if std::env::args().nth(1).as_deref() == Some("init") {
        return init_project();
    }

    // stdout carries the protocol, so logs go to stderr
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("archgraph-mcp v{}", env!("CARGO_PKG_VERSION"));
    let service = ArchgraphServer::new()
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!("MCP server error: {}", e))?;
    service.waiting().await?;
    Ok(())
}

/// Write project-scoped MCP config files in the current directory so that
/// Claude Code and/or Codex discover archgraph-mcp when working in this project.
fn init_project() -> Result<(), Box<dyn std::error::Error>> {
    let binary_path = std::env::current_exe()?
        .canonicalize()?
        .to_string_lossy()
        .to_string();
    let cwd = std::env::current_dir()?;

    init_claude_code(&cwd, &binary_path)?;
    init_codex(&cwd, &binary_path)?;
    eprintln!("\nDone. MCP clients started in this project will find archgraph.");
    Ok(())
}

/// Write .mcp.json, merging with any existing config.
fn init_claude_code(
    cwd: &std::path::Path,
    binary_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mcp_json_path = cwd.join(".mcp.json");
    let existing = if mcp_json_path.exists() {
        Some(std::fs::read_to_string(&mcp_json_path)?)
    } else {
        None
    };
    let root = merge_mcp_json(existing.as_deref(), binary_path);
    std::fs::write(&mcp_json_path, serde_json::to_string_pretty(&root)?)?;
    eprintln!("Wrote {}", mcp_json_path.display());
    Ok(())
}

fn merge_mcp_json(existing: Option<&str>, binary_path: &str) -> serde_json::Value {
    let mut root: serde_json::Value = existing
        .and_then(|contents| serde_json::from_str(contents).ok())
        .filter(serde_json::Value::is_object)
        .unwrap_or_else(|| serde_json::json!({}));

    if !root.get("mcpServers").is_some_and(|v| v.is_object()) {
        root["mcpServers"] = serde_json::json!({});
    }
    root["mcpServers"][SERVER_NAME] = serde_json::json!({
        "type": "stdio",
        "command": binary_path,
        "args": [],
    });
    root
}

/// Write .codex/config.toml, merging with any existing config.
fn init_codex(
    cwd: &std::path::Path,
    binary_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let codex_dir = cwd.join(".codex");
    let config_toml_path = codex_dir.join("config.toml");
    let existing = if config_toml_path.exists() {
        Some(std::fs::read_to_string(&config_toml_path)?)
    } else {
        None
    };
    let doc = merge_codex_toml(existing.as_deref(), binary_path);

    std::fs::create_dir_all(&codex_dir)?;
    std::fs::write(&config_toml_path, doc.to_string())?;
    eprintln!("Wrote {}", config_toml_path.display());
    Ok(())
}

fn merge_codex_toml(existing: Option<&str>, binary_path: &str) -> toml_edit::DocumentMut {
    let mut doc: toml_edit::DocumentMut = existing
        .and_then(|contents| contents.parse().ok())
        .unwrap_or_default();

    if !doc.contains_table("mcp_servers") {
        doc["mcp_servers"] = toml_edit::Item::Table(toml_edit::Table::new());
    }

    let mut server = toml_edit::Table::new();
    server.insert("command", toml_edit::value(binary_path));
    server.insert("args", toml_edit::value(toml_edit::Array::new()));
    doc["mcp_servers"][SERVER_NAME] = toml_edit::Item::Table(server);
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mcp_json_keeps_other_servers() {
        let existing = r#"{"mcpServers": {"other": {"command": "x"}}, "extra": 1}"#;
        let root = merge_mcp_json(Some(existing), "/bin/archgraph-mcp");
        assert_eq!(root["mcpServers"]["other"]["command"], "x");
        assert_eq!(root["mcpServers"]["archgraph"]["command"], "/bin/archgraph-mcp");
        assert_eq!(root["extra"], 1);
    }

    #[test]
    fn mcp_json_replaces_garbage() {
        let root = merge_mcp_json(Some("not json"), "/bin/archgraph-mcp");
        assert_eq!(root["mcpServers"]["archgraph"]["type"], "stdio");
    }

    #[test]
    fn codex_toml_keeps_other_settings() {
        let existing = "model = \"o3\"\n\n[mcp_servers.other]\ncommand = \"x\"\n";
        let doc = merge_codex_toml(Some(existing), "/bin/archgraph-mcp");
        let text = doc.to_string();
        assert!(text.contains("model = \"o3\""));
        assert!(text.contains("[mcp_servers.other]"));
        assert!(text.contains("[mcp_servers.archgraph]"));
        assert!(text.contains("command = \"/bin/archgraph-mcp\""));
    }
}
