//! Agent construction: one configured agent per role definition.
//!
//! An agent is a role definition resolved against a specific request
//! context, with the caller's temperature override applied and its declared
//! capability names resolved to instances. Agents are owned by a single
//! pipeline execution and never reused across requests, because the
//! context differs per request.

use crate::capability::{Capability, CapabilityRegistry};
use crate::config::RolesConfig;
use crate::context::Context;
use crate::error::{PlumeError, Result};
use crate::template;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A runtime agent: resolved persona, effective temperature, capability
/// instances.
#[derive(Clone)]
pub struct Agent {
    /// Role name this agent was built from.
    pub name: String,
    /// Resolved identity statement.
    pub role: String,
    /// Resolved objective.
    pub goal: String,
    /// Resolved persona narrative.
    pub backstory: String,
    /// Effective sampling temperature (override or definition default).
    pub temperature: f32,
    /// Reasoning-iteration bound passed to the backend.
    pub max_iter: u32,
    /// Whether the role may delegate. Carried for the backend; the fixed
    /// pipeline never delegates.
    pub allow_delegation: bool,
    /// Resolved capability instances, in declaration order.
    pub capabilities: Vec<Arc<dyn Capability>>,
}

impl Agent {
    /// Names of the resolved capabilities, in order.
    pub fn capability_names(&self) -> Vec<&str> {
        self.capabilities.iter().map(|c| c.name()).collect()
    }

    /// The persona block sent to the completion backend as the system
    /// prompt.
    pub fn system_prompt(&self) -> String {
        format!(
            "# Rôle\n{}\n\n## Objectif\n{}\n\n## Profil\n{}",
            self.role.trim(),
            self.goal.trim(),
            self.backstory.trim()
        )
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("temperature", &self.temperature)
            .field("max_iter", &self.max_iter)
            .field("capabilities", &self.capability_names())
            .finish()
    }
}

/// Build one agent per distinct role name.
///
/// Template fields (`role`, `goal`, `backstory`) are resolved against the
/// context; an unresolvable placeholder aborts construction with no agents
/// returned. Temperature overrides apply per role name, falling back to
/// the definition default. Definitions are folded in declaration order, so
/// a duplicated name keeps its last declaration.
pub fn build_agents(
    config: &RolesConfig,
    context: &Context,
    overrides: &BTreeMap<String, f32>,
    registry: &CapabilityRegistry,
) -> Result<BTreeMap<String, Agent>> {
    let mut agents = BTreeMap::new();

    for def in config.iter() {
        let resolve = |field: &'static str, text: &str| -> Result<String> {
            template::resolve(text, context.vars()).map_err(|source| {
                PlumeError::TemplateResolution {
                    scope: "role",
                    name: def.name.clone(),
                    field,
                    source,
                }
            })
        };

        let agent = Agent {
            name: def.name.clone(),
            role: resolve("role", &def.role)?,
            goal: resolve("goal", &def.goal)?,
            backstory: resolve("backstory", &def.backstory)?,
            temperature: overrides
                .get(&def.name)
                .copied()
                .unwrap_or(def.temperature),
            max_iter: def.max_iter,
            allow_delegation: def.allow_delegation,
            capabilities: registry.resolve(&def.tools),
        };

        agents.insert(def.name.clone(), agent);
    }

    Ok(agents)
}
