use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

use crate::domain::{CommandTask, ItemId};

pub const ITEM_ID_FIELD: &str = "item_id";
pub const ENGINE_FIELD: &str = "engine";

/// Body of `POST /submit`: the fixed selection fields followed by one
/// field per parameter, in parameter order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub item_id: ItemId,
    pub engine: String,
    values: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRejection {
    ReservedName,
    DuplicateName,
}

impl SubmissionPayload {
    pub fn new(item_id: ItemId, engine: impl Into<String>) -> Self {
        Self {
            item_id,
            engine: engine.into(),
            values: Vec::new(),
        }
    }

    pub fn push_value(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ValueRejection> {
        let name = name.into();
        if name == ITEM_ID_FIELD || name == ENGINE_FIELD {
            return Err(ValueRejection::ReservedName);
        }
        if self.values.iter().any(|(existing, _)| *existing == name) {
            return Err(ValueRejection::DuplicateName);
        }
        self.values.push((name, value.into()));
        Ok(())
    }

    pub fn values(&self) -> &[(String, String)] {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }
}

impl Serialize for SubmissionPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 2))?;
        map.serialize_entry(ITEM_ID_FIELD, &self.item_id)?;
        map.serialize_entry(ENGINE_FIELD, &self.engine)?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Body of `POST /button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub task: CommandTask,
}

impl From<CommandTask> for CommandPayload {
    fn from(task: CommandTask) -> Self {
        Self { task }
    }
}
