//! Agent discovery and capability types

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Primary well-known path of the Agent Card
pub const AGENT_CARD_PATH: &str = "/.well-known/agent-card.json";

/// Legacy well-known path still served by older agents
pub const LEGACY_AGENT_CARD_PATH: &str = "/.well-known/agent.json";

/// Agent Card for agent discovery
///
/// The Agent Card is published at `/.well-known/agent-card.json` and describes
/// the agent's identity, endpoint, supported modalities and skills.
/// It is treated as immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    /// Name of the agent
    pub name: String,

    /// Human-readable description of the agent
    pub description: String,

    /// Public URL of the agent's RPC endpoint
    pub url: String,

    /// Agent version
    pub version: String,

    /// Modalities accepted when a skill does not say otherwise
    #[serde(default)]
    pub default_input_modes: BTreeSet<String>,

    /// Modalities produced when a skill does not say otherwise
    #[serde(default)]
    pub default_output_modes: BTreeSet<String>,

    /// Agent capabilities
    #[serde(default)]
    pub capabilities: AgentCapabilities,

    /// Advertised skills, in order of preference
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    /// Create a new agent card accepting and producing text
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let text = BTreeSet::from(["text".to_string()]);
        Self {
            name: name.into(),
            description: description.into(),
            url: url.into(),
            version: version.into(),
            default_input_modes: text.clone(),
            default_output_modes: text,
            capabilities: AgentCapabilities::default(),
            skills: Vec::new(),
        }
    }

    /// Set the agent capabilities
    pub fn with_capabilities(mut self, capabilities: AgentCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Add a skill to the agent card
    pub fn with_skill(mut self, skill: AgentSkill) -> Self {
        self.skills.push(skill);
        self
    }

    /// Replace the advertised URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

/// Agent capabilities
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    /// Supports streaming responses over `message/stream`
    #[serde(default)]
    pub streaming: bool,
}

impl AgentCapabilities {
    /// Create capabilities with default values (all false)
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable streaming
    pub fn with_streaming(mut self) -> Self {
        self.streaming = true;
        self
    }
}

/// A skill advertised by an agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Example requests, in display order
    #[serde(default)]
    pub examples: Vec<String>,
}

impl AgentSkill {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            tags: BTreeSet::new(),
            examples: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn search_card() -> AgentCard {
        AgentCard::new(
            "Search Agent",
            "Agent that searches for jobs",
            "http://localhost:10001",
            "0.1.0",
        )
        .with_capabilities(AgentCapabilities::new().with_streaming())
        .with_skill(
            AgentSkill::new("search_jobs_skill", "Search Jobs", "Searches for jobs")
                .with_tag("search")
                .with_tag("jobs")
                .with_example("Find jobs at Google"),
        )
    }

    #[test]
    fn test_agent_card_creation() {
        let card = search_card();

        assert_eq!(card.name, "Search Agent");
        assert!(card.capabilities.streaming);
        assert_eq!(card.skills.len(), 1);
        assert!(card.default_input_modes.contains("text"));
        assert_eq!(card.skills[0].tags.len(), 2);
    }

    #[test]
    fn test_agent_card_wire_names() {
        let json = serde_json::to_value(search_card()).unwrap();

        assert_eq!(json["defaultInputModes"], json!(["text"]));
        assert_eq!(json["capabilities"]["streaming"], true);
        assert_eq!(json["skills"][0]["examples"][0], "Find jobs at Google");
        assert!(json.get("default_input_modes").is_none());
    }

    #[test]
    fn test_agent_card_tolerates_extra_fields() {
        let json = json!({
            "name": "Other",
            "description": "An agent from another implementation",
            "url": "http://other",
            "version": "2.0",
            "protocolVersion": "0.3.0",
            "capabilities": {"streaming": false, "pushNotifications": true},
            "skills": []
        });

        let card: AgentCard = serde_json::from_value(json).unwrap();
        assert!(!card.capabilities.streaming);
        assert!(card.default_output_modes.is_empty());
    }
}
