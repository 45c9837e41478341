//! Entity store: the document collaborator holding canonical records.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::records::{FieldRecord, LearningResource, RoleRecord, SkillRecord};
use crate::error::GraphError;

/// Document collaborator read by the graph builder once per rebuild.
pub trait EntityStore {
    fn list_all_skills(&self) -> Result<Vec<SkillRecord>, GraphError>;

    fn list_all_roles(&self) -> Result<Vec<RoleRecord>, GraphError>;

    /// Field taxonomy records; stores without one return nothing
    fn list_all_fields(&self) -> Result<Vec<FieldRecord>, GraphError> {
        Ok(Vec::new())
    }

    fn get_skill(&self, id: &str) -> Result<Option<SkillRecord>, GraphError>;

    fn get_role(&self, name: &str) -> Result<Option<RoleRecord>, GraphError>;

    fn skills_by_category(&self, category: &str) -> Result<Vec<SkillRecord>, GraphError>;

    fn resources_for_skill(&self, skill_id: &str) -> Result<Vec<LearningResource>, GraphError>;
}

#[derive(Debug, Default)]
struct Documents {
    skills: BTreeMap<String, SkillRecord>,
    roles: BTreeMap<String, RoleRecord>,
    fields: BTreeMap<String, FieldRecord>,
    resources: BTreeMap<String, LearningResource>,
}

/// In-memory document store. Every `put_*` validates the record first.
///
/// Listings come back ordered by key, so builds fed from this store are
/// repeatable.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    docs: RwLock<Documents>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Documents>, GraphError> {
        self.docs
            .read()
            .map_err(|_| GraphError::StoreUnavailable("entity store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Documents>, GraphError> {
        self.docs
            .write()
            .map_err(|_| GraphError::StoreUnavailable("entity store lock poisoned".to_string()))
    }

    /// Insert or replace a skill by id
    pub fn put_skill(&self, skill: SkillRecord) -> Result<(), GraphError> {
        skill.validate()?;
        self.write()?.skills.insert(skill.id.clone(), skill);
        Ok(())
    }

    /// Insert or replace a role by name
    pub fn put_role(&self, role: RoleRecord) -> Result<(), GraphError> {
        role.validate()?;
        self.write()?.roles.insert(role.name.clone(), role);
        Ok(())
    }

    pub fn put_field(&self, field: FieldRecord) -> Result<(), GraphError> {
        field.validate()?;
        self.write()?.fields.insert(field.name.clone(), field);
        Ok(())
    }

    pub fn put_resource(&self, resource: LearningResource) -> Result<(), GraphError> {
        resource.validate()?;
        self.write()?.resources.insert(resource.id.clone(), resource);
        Ok(())
    }
}

impl EntityStore for MemoryEntityStore {
    fn list_all_skills(&self) -> Result<Vec<SkillRecord>, GraphError> {
        Ok(self.read()?.skills.values().cloned().collect())
    }

    fn list_all_roles(&self) -> Result<Vec<RoleRecord>, GraphError> {
        Ok(self.read()?.roles.values().cloned().collect())
    }

    fn list_all_fields(&self) -> Result<Vec<FieldRecord>, GraphError> {
        Ok(self.read()?.fields.values().cloned().collect())
    }

    fn get_skill(&self, id: &str) -> Result<Option<SkillRecord>, GraphError> {
        Ok(self.read()?.skills.get(id).cloned())
    }

    fn get_role(&self, name: &str) -> Result<Option<RoleRecord>, GraphError> {
        Ok(self.read()?.roles.get(name).cloned())
    }

    fn skills_by_category(&self, category: &str) -> Result<Vec<SkillRecord>, GraphError> {
        Ok(self
            .read()?
            .skills
            .values()
            .filter(|s| s.category == category)
            .cloned()
            .collect())
    }

    fn resources_for_skill(&self, skill_id: &str) -> Result<Vec<LearningResource>, GraphError> {
        Ok(self
            .read()?
            .resources
            .values()
            .filter(|r| r.skill_id == skill_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(id: &str, skill_id: &str) -> LearningResource {
        LearningResource {
            id: id.to_string(),
            title: format!("Learn {}", skill_id),
            url: format!("https://example.org/{}", id),
            kind: "course".to_string(),
            provider: "example".to_string(),
            skill_id: skill_id.to_string(),
            difficulty: Default::default(),
            duration_hours: 10,
            rating: 4.5,
        }
    }

    #[test]
    fn test_put_rejects_invalid_records() {
        let store = MemoryEntityStore::new();
        let err = store.put_skill(SkillRecord::new("", "Nameless")).unwrap_err();
        assert_eq!(err.code(), "SKG-IN-001");
        assert!(store.list_all_skills().unwrap().is_empty());
    }

    #[test]
    fn test_get_by_id_and_by_field() {
        let store = MemoryEntityStore::new();
        let mut sql = SkillRecord::new("sql", "SQL");
        sql.category = "data".to_string();
        let mut rust = SkillRecord::new("rust", "Rust");
        rust.category = "systems".to_string();
        store.put_skill(sql).unwrap();
        store.put_skill(rust).unwrap();

        assert_eq!(store.get_skill("sql").unwrap().unwrap().name, "SQL");
        assert!(store.get_skill("cobol").unwrap().is_none());

        let data = store.skills_by_category("data").unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].id, "sql");
    }

    #[test]
    fn test_put_replaces_by_key() {
        let store = MemoryEntityStore::new();
        store.put_role(RoleRecord::new("Analyst").requiring(["sql"])).unwrap();
        store
            .put_role(RoleRecord::new("Analyst").requiring(["sql", "python"]))
            .unwrap();

        let roles = store.list_all_roles().unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(store.get_role("Analyst").unwrap().unwrap().required_skills.len(), 2);
    }

    #[test]
    fn test_resources_for_skill() {
        let store = MemoryEntityStore::new();
        store.put_resource(resource("r2", "sql")).unwrap();
        store.put_resource(resource("r1", "sql")).unwrap();
        store.put_resource(resource("r3", "rust")).unwrap();

        let ids: Vec<String> = store
            .resources_for_skill("sql")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["r1", "r2"]);

        let mut bad = resource("r4", "sql");
        bad.rating = 7.0;
        assert!(store.put_resource(bad).is_err());
    }
}
