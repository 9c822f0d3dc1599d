//! The Access Filter: projects the Tool Registry's full surface down to
//! the tools a given caller may see and invoke.

use std::collections::HashMap;

use relay_domain::access::AccessContext;
use relay_domain::tool::{ToolDefinition, ToolSchema};

/// The filtered tool surface handed to the reasoning model, plus the
/// reverse lookup the Tool Invoker uses to resolve a tool call back to its
/// provider.
#[derive(Debug, Clone)]
pub struct ToolSurface {
    pub definitions: Vec<ToolDefinition>,
    tool_to_provider: HashMap<String, String>,
    visible: HashMap<String, ToolSchema>,
}

impl ToolSurface {
    pub fn provider_for(&self, tool_name: &str) -> Option<&str> {
        self.tool_to_provider.get(tool_name).map(|s| s.as_str())
    }

    pub fn schema_for(&self, tool_name: &str) -> Option<&ToolSchema> {
        self.visible.get(tool_name)
    }

    pub fn contains(&self, tool_name: &str) -> bool {
        self.visible.contains_key(tool_name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// A tool is visible to an [`AccessContext`] iff either its `allowed_roles`
/// intersects the context's roles, its `allowed_roles` is empty (no role
/// gate declared), or the context is an admin / dev-mode caller.
pub fn is_visible(schema: &ToolSchema, ctx: &AccessContext) -> bool {
    if ctx.is_admin() {
        return true;
    }
    if schema.allowed_roles.is_empty() {
        return true;
    }
    schema.allowed_roles.iter().any(|r| ctx.roles.contains(r))
}

/// Project `tools` (typically a [`relay_registry::Catalog`]'s contents) to
/// the subset visible to `ctx`, in deterministic alphabetical order.
pub fn filter_surface<'a>(tools: impl IntoIterator<Item = &'a ToolSchema>, ctx: &AccessContext) -> ToolSurface {
    let mut visible: Vec<&ToolSchema> = tools.into_iter().filter(|t| is_visible(t, ctx)).collect();
    visible.sort_by(|a, b| a.name.cmp(&b.name));

    let mut definitions = Vec::with_capacity(visible.len());
    let mut tool_to_provider = HashMap::with_capacity(visible.len());
    let mut by_name = HashMap::with_capacity(visible.len());
    for schema in visible {
        definitions.push(ToolDefinition::from(schema));
        tool_to_provider.insert(schema.name.clone(), schema.provider_id.clone());
        by_name.insert(schema.name.clone(), schema.clone());
    }

    ToolSurface {
        definitions,
        tool_to_provider,
        visible: by_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn schema(name: &str, provider_id: &str, roles: &[&str]) -> ToolSchema {
        ToolSchema {
            name: name.into(),
            provider_id: provider_id.into(),
            description: String::new(),
            parameters: serde_json::json!({"type": "object"}),
            allowed_roles: roles.iter().map(|s| s.to_string()).collect(),
            metadata: None,
        }
    }

    #[test]
    fn role_intersection_grants_visibility() {
        let tool = schema("lookup", "alpha", &["user"]);
        let ctx = AccessContext::new("u1", ["user".to_string()]);
        assert!(is_visible(&tool, &ctx));
    }

    #[test]
    fn missing_role_denies_visibility() {
        let tool = schema("s", "secret", &["admin"]);
        let ctx = AccessContext::new("u1", ["user".to_string()]);
        assert!(!is_visible(&tool, &ctx));
    }

    #[test]
    fn dev_mode_sees_everything() {
        let tool = schema("s", "secret", &["admin"]);
        let ctx = AccessContext::dev_admin("u1");
        assert!(is_visible(&tool, &ctx));
    }

    #[test]
    fn tool_with_no_role_gate_is_visible_to_anyone() {
        let tool = schema("public", "alpha", &[]);
        let ctx = AccessContext::new("u1", HashSet::new());
        assert!(is_visible(&tool, &ctx));
    }

    #[test]
    fn filter_surface_orders_alphabetically() {
        let tools = vec![schema("zeta", "p", &[]), schema("alpha", "p", &[])];
        let ctx = AccessContext::new("u1", HashSet::new());
        let surface = filter_surface(tools.iter(), &ctx);
        assert_eq!(surface.definitions[0].name, "alpha");
        assert_eq!(surface.definitions[1].name, "zeta");
    }

    #[test]
    fn filter_surface_excludes_denied_tool_s6() {
        let tools = vec![schema("s", "secret", &["admin"])];
        let ctx = AccessContext::new("u1", ["user".to_string()]);
        let surface = filter_surface(tools.iter(), &ctx);
        assert!(!surface.contains("s"));
        assert!(surface.is_empty());
    }

    #[test]
    fn provider_for_resolves_visible_tool() {
        let tools = vec![schema("lookup", "alpha", &["user"])];
        let ctx = AccessContext::new("u1", ["user".to_string()]);
        let surface = filter_surface(tools.iter(), &ctx);
        assert_eq!(surface.provider_for("lookup"), Some("alpha"));
        assert_eq!(surface.provider_for("missing"), None);
    }
}
