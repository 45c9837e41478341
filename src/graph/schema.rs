//! Graph schema definitions for skillgraph
//!
//! Defines the fixed node/edge vocabulary and the node payloads persisted in
//! the graph store.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GraphError;

/// Node labels. Every label has exactly one unique key property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeLabel {
    Skill,
    Role,
    Tool,
    Field,
    Person,
}

impl NodeLabel {
    pub const ALL: [NodeLabel; 5] = [
        NodeLabel::Skill,
        NodeLabel::Role,
        NodeLabel::Tool,
        NodeLabel::Field,
        NodeLabel::Person,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeLabel::Skill => "Skill",
            NodeLabel::Role => "Role",
            NodeLabel::Tool => "Tool",
            NodeLabel::Field => "Field",
            NodeLabel::Person => "Person",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeLabel {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| GraphError::invalid("node label", format!("unknown label '{}'", s)))
    }
}

/// Directed edge types.
///
/// Endpoint labels are fixed per type, so an edge is addressed by its type
/// plus the two endpoint keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeLabel {
    /// Role -> Skill
    Requires,
    /// Skill -> Skill, left is learned before right
    PrerequisiteOf,
    /// Role -> Tool
    Uses,
    /// Role -> Role, career progression
    LeadsTo,
    /// Skill -> Field, carries a `level`
    RequiredFor,
    /// Person -> Skill
    HasSkill,
}

impl EdgeLabel {
    pub const ALL: [EdgeLabel; 6] = [
        EdgeLabel::Requires,
        EdgeLabel::PrerequisiteOf,
        EdgeLabel::Uses,
        EdgeLabel::LeadsTo,
        EdgeLabel::RequiredFor,
        EdgeLabel::HasSkill,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeLabel::Requires => "REQUIRES",
            EdgeLabel::PrerequisiteOf => "PREREQUISITE_OF",
            EdgeLabel::Uses => "USES",
            EdgeLabel::LeadsTo => "LEADS_TO",
            EdgeLabel::RequiredFor => "REQUIRED_FOR",
            EdgeLabel::HasSkill => "HAS_SKILL",
        }
    }

    pub fn from_label(self) -> NodeLabel {
        match self {
            EdgeLabel::Requires | EdgeLabel::Uses | EdgeLabel::LeadsTo => NodeLabel::Role,
            EdgeLabel::PrerequisiteOf | EdgeLabel::RequiredFor => NodeLabel::Skill,
            EdgeLabel::HasSkill => NodeLabel::Person,
        }
    }

    pub fn to_label(self) -> NodeLabel {
        match self {
            EdgeLabel::Requires | EdgeLabel::PrerequisiteOf | EdgeLabel::HasSkill => {
                NodeLabel::Skill
            }
            EdgeLabel::Uses => NodeLabel::Tool,
            EdgeLabel::LeadsTo => NodeLabel::Role,
            EdgeLabel::RequiredFor => NodeLabel::Field,
        }
    }

    /// A skill cannot be its own prerequisite.
    pub fn allows_self_loop(self) -> bool {
        !matches!(self, EdgeLabel::PrerequisiteOf)
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Skill difficulty, ordered beginner < intermediate < advanced < expert.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    #[serde(alias = "Beginner", alias = "entry", alias = "Entry")]
    Beginner,
    #[serde(alias = "Intermediate")]
    Intermediate,
    #[serde(alias = "Advanced")]
    Advanced,
    #[serde(alias = "Expert")]
    Expert,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
            Difficulty::Expert => "expert",
        }
    }
}

impl FromStr for Difficulty {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" | "entry" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            "expert" => Ok(Difficulty::Expert),
            other => Err(GraphError::invalid(
                "difficulty",
                format!("unknown level '{}'", other),
            )),
        }
    }
}

/// Market demand, ordered low < medium < high < very_high.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DemandLevel {
    #[serde(alias = "Low")]
    Low,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
    #[serde(alias = "Very High", alias = "very high", alias = "VeryHigh")]
    VeryHigh,
}

impl FromStr for DemandLevel {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "low" => Ok(DemandLevel::Low),
            "medium" => Ok(DemandLevel::Medium),
            "high" => Ok(DemandLevel::High),
            "very_high" | "veryhigh" => Ok(DemandLevel::VeryHigh),
            other => Err(GraphError::invalid(
                "demand_level",
                format!("unknown level '{}'", other),
            )),
        }
    }
}

/// Typed payload of a node label.
pub trait NodePayload: Serialize + DeserializeOwned {
    const LABEL: NodeLabel;

    /// Unique key within the label
    fn key(&self) -> &str;
}

/// Skill node payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub demand_level: DemandLevel,
    #[serde(default)]
    pub popularity_score: u8,
}

impl SkillNode {
    /// Placeholder payload for a skill referenced before it was described
    pub fn bare(id: &str) -> Self {
        SkillNode {
            id: id.to_string(),
            name: id.to_string(),
            category: String::new(),
            difficulty: Difficulty::default(),
            demand_level: DemandLevel::default(),
            popularity_score: 0,
        }
    }
}

impl NodePayload for SkillNode {
    const LABEL: NodeLabel = NodeLabel::Skill;

    fn key(&self) -> &str {
        &self.id
    }
}

/// Role node payload. Roles are keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleNode {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub experience_level: String,
}

impl NodePayload for RoleNode {
    const LABEL: NodeLabel = NodeLabel::Role;

    fn key(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolNode {
    pub name: String,
}

impl NodePayload for ToolNode {
    const LABEL: NodeLabel = NodeLabel::Tool;

    fn key(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NodePayload for FieldNode {
    const LABEL: NodeLabel = NodeLabel::Field;

    fn key(&self) -> &str {
        &self.name
    }
}

/// Person node payload, one per analyzed profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonNode {
    pub id: String,
    pub name: String,
}

impl NodePayload for PersonNode {
    const LABEL: NodeLabel = NodeLabel::Person;

    fn key(&self) -> &str {
        &self.id
    }
}

/// REQUIRED_FOR edge payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredForEdge {
    pub level: Difficulty,
}

/// Skill as returned by queries
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkillSummary {
    pub id: String,
    pub name: String,
    pub difficulty: Difficulty,
}

impl From<SkillNode> for SkillSummary {
    fn from(node: SkillNode) -> Self {
        SkillSummary {
            id: node.id,
            name: node.name,
            difficulty: node.difficulty,
        }
    }
}
