//! Typed entity records
//!
//! Records arrive from the document store and are validated here, before the
//! graph builder ever sees them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{require_id, GraphError};
use crate::graph::schema::{DemandLevel, Difficulty, FieldNode, RoleNode, SkillNode};

/// Canonical skill record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub demand_level: DemandLevel,
    #[serde(default)]
    pub popularity_score: u8,
    #[serde(default)]
    pub learning_time_hours: u32,
    /// Ids of skills learned before this one
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

impl SkillRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        SkillRecord {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            description: String::new(),
            difficulty: Difficulty::default(),
            demand_level: DemandLevel::default(),
            popularity_score: 0,
            learning_time_hours: 0,
            prerequisites: Vec::new(),
        }
    }

    pub fn with_prerequisites<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.prerequisites = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn validate(&self) -> Result<(), GraphError> {
        require_id("skill id", &self.id)?;
        require_id("skill name", &self.name)?;
        if self.popularity_score > 100 {
            return Err(GraphError::invalid(
                "popularity_score",
                format!("{} is outside 0..=100 for skill '{}'", self.popularity_score, self.id),
            ));
        }
        for prerequisite in &self.prerequisites {
            require_id("prerequisite id", prerequisite)?;
            if prerequisite == &self.id {
                return Err(GraphError::invalid(
                    "prerequisites",
                    format!("skill '{}' lists itself as a prerequisite", self.id),
                ));
            }
        }
        Ok(())
    }

    pub fn to_node(&self) -> SkillNode {
        SkillNode {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            difficulty: self.difficulty,
            demand_level: self.demand_level,
            popularity_score: self.popularity_score,
        }
    }
}

/// A skill requirement declared by a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredSkill {
    pub skill_id: String,
    #[serde(default)]
    pub skill_name: String,
    #[serde(default)]
    pub proficiency_level: String,
    #[serde(default)]
    pub priority: String,
}

impl RequiredSkill {
    pub fn new(skill_id: impl Into<String>, skill_name: impl Into<String>) -> Self {
        RequiredSkill {
            skill_id: skill_id.into(),
            skill_name: skill_name.into(),
            proficiency_level: String::new(),
            priority: String::new(),
        }
    }
}

/// Canonical role record, keyed by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub required_skills: Vec<RequiredSkill>,
    #[serde(default)]
    pub tools: Vec<String>,
}

impl RoleRecord {
    pub fn new(name: impl Into<String>) -> Self {
        RoleRecord {
            name: name.into(),
            category: String::new(),
            description: String::new(),
            experience_level: String::new(),
            required_skills: Vec::new(),
            tools: Vec::new(),
        }
    }

    /// Require skills by id; the id doubles as display name
    pub fn requiring<I, T>(mut self, skill_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.required_skills = skill_ids
            .into_iter()
            .map(|id| {
                let id = id.into();
                RequiredSkill::new(id.clone(), id)
            })
            .collect();
        self
    }

    pub fn using<I, T>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), GraphError> {
        require_id("role name", &self.name)?;
        for required in &self.required_skills {
            require_id("required skill id", &required.skill_id)?;
        }
        for tool in &self.tools {
            require_id("tool name", tool)?;
        }
        Ok(())
    }

    pub fn to_node(&self) -> RoleNode {
        RoleNode {
            name: self.name.clone(),
            category: self.category.clone(),
            experience_level: self.experience_level.clone(),
        }
    }
}

/// Field taxonomy record: a field and the skills it requires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    #[serde(alias = "field")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub level: Difficulty,
    /// Skill ids required for the field
    #[serde(default)]
    pub skills: Vec<String>,
}

impl FieldRecord {
    pub fn new<I, T>(name: impl Into<String>, skills: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        FieldRecord {
            name: name.into(),
            description: String::new(),
            level: Difficulty::default(),
            skills: skills.into_iter().map(Into::into).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), GraphError> {
        require_id("field name", &self.name)?;
        let mut seen = HashSet::new();
        for skill in &self.skills {
            require_id("field skill id", skill)?;
            if !seen.insert(skill.as_str()) {
                return Err(GraphError::invalid(
                    "field skills",
                    format!("'{}' listed twice for field '{}'", skill, self.name),
                ));
            }
        }
        Ok(())
    }

    pub fn to_node(&self) -> FieldNode {
        FieldNode {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Learning resource attached to a skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningResource {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub url: String,
    /// course, book, video, ...
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub provider: String,
    #[serde(alias = "skill")]
    pub skill_id: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub duration_hours: u32,
    #[serde(default)]
    pub rating: f32,
}

impl LearningResource {
    pub fn validate(&self) -> Result<(), GraphError> {
        require_id("resource id", &self.id)?;
        require_id("resource title", &self.title)?;
        require_id("resource skill id", &self.skill_id)?;
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(GraphError::invalid(
                "rating",
                format!("{} is outside 0..=5 for resource '{}'", self.rating, self.id),
            ));
        }
        Ok(())
    }
}
