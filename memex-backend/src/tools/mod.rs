//! Tool registration layer.
//!
//! Callers (the HTTP surface, a remote tool-invocation client) discover
//! tools by definition and execute them by name; every tool formats its own
//! human-readable result and attaches machine-readable metadata.

pub mod builtin;
pub mod registry;
pub mod types;

use std::sync::Arc;

pub use registry::ToolRegistry;
pub use types::{Tool, ToolContext, ToolDefinition, ToolResult};

/// Registry with the full kb tool set
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(builtin::KbSearchTool::new()));
    registry.register(Arc::new(builtin::KbListTool::new()));
    registry.register(Arc::new(builtin::KbReadTool::new()));
    registry.register(Arc::new(builtin::KbUploadTool::new()));
    registry.register(Arc::new(builtin::KbAddTool::new()));
    registry.register(Arc::new(builtin::KbStatusTool::new()));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_order() {
        let registry = default_registry();
        let names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(
            names,
            vec!["kb_search", "kb_list", "kb_read", "kb_upload", "kb_add", "kb_status"]
        );
    }

    #[test]
    fn test_unknown_tool_lookup() {
        let registry = default_registry();
        assert!(registry.get("kb_nope").is_none());
    }
}
