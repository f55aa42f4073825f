//! The host's item construction primitive.

use std::collections::{HashSet, VecDeque};

use uuid::Uuid;

use super::ItemFactory;
use crate::error::HostError;
use crate::types::{Item, SpawnTemplate, Upd};

/// Instantiates spawn template candidates with fresh ids.
///
/// Children of the candidate (attachments, ammo in a magazine) are copied
/// along and re-parented onto the new ids.
#[derive(Debug, Clone, Default)]
pub struct HostItemFactory {
    known_templates: HashSet<String>,
}

impl HostItemFactory {
    pub fn new(known_templates: impl IntoIterator<Item = String>) -> Self {
        Self {
            known_templates: known_templates.into_iter().collect(),
        }
    }
}

/// A 24 hex character id, the shape the host uses for item ids.
pub fn new_item_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(24);
    id
}

impl ItemFactory for HostItemFactory {
    fn create_item(&self, item_key: &str, template: &SpawnTemplate) -> Result<Vec<Item>, HostError> {
        let fail = |reason: String| HostError::ItemConstruction {
            item_key: item_key.to_string(),
            reason,
        };

        let root = template
            .items
            .iter()
            .find(|i| i.id == item_key)
            .ok_or_else(|| fail(format!("not present in spawn template `{}`", template.id)))?;
        if !self.known_templates.contains(&root.tpl) {
            return Err(fail(format!("unknown item template `{}`", root.tpl)));
        }

        let mut created = Vec::new();
        let mut copied: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::from([(root, None::<String>)]);
        while let Some((source, new_parent)) = queue.pop_front() {
            if !copied.insert(source.id.as_str()) {
                return Err(fail(format!(
                    "item `{}` is its own ancestor in spawn template `{}`",
                    source.id, template.id
                )));
            }
            let id = new_item_id();
            for child in template
                .items
                .iter()
                .filter(|i| i.parent_id.as_deref() == Some(source.id.as_str()))
            {
                queue.push_back((child, Some(id.clone())));
            }

            let mut item = source.clone();
            item.id = id;
            if new_parent.is_some() {
                item.parent_id = new_parent;
            } else {
                item.parent_id = None;
                item.slot_id = None;
                item.upd
                    .get_or_insert_with(Upd::default)
                    .spawned_in_session = Some(true);
            }
            created.push(item);
        }
        Ok(created)
    }
}
