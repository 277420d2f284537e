//! Lookup and commit of combatant and item records.
//!
//! The host owns the records. The engine only reads snapshots through
//! [`Registry`] and hands back [`CombatantUpdate`]s for the host to commit.

use crate::effects::{EffectId, StatusEffect};
use crate::items::Item;
use crate::update::{CombatantUpdate, UpdateError};
use crate::world::{CharacterId, Combatant, ItemId};
use std::collections::HashMap;
use thiserror::Error;

/// Errors committing to a registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("Combatant not found: {0}")]
    CombatantNotFound(CharacterId),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Rejected update: {0}")]
    Update(#[from] UpdateError),
}

/// Access to the host's records.
pub trait Registry {
    fn combatant(&self, id: CharacterId) -> Option<&Combatant>;

    fn item(&self, id: ItemId) -> Option<&Item>;

    fn item_mut(&mut self, id: ItemId) -> Option<&mut Item>;

    /// Validate and write a partial update. Nothing is written on error.
    fn commit(&mut self, update: &CombatantUpdate) -> Result<(), RegistryError>;

    /// Store `effect` on an item, replacing any effect with the same id.
    fn save_effect(&mut self, item: ItemId, effect: StatusEffect) -> Result<(), RegistryError> {
        let item_record = self.item_mut(item).ok_or(RegistryError::ItemNotFound(item))?;
        item_record.upsert_effect(effect);
        Ok(())
    }

    /// Remove an effect from an item. Returns whether it was present.
    fn delete_effect(&mut self, item: ItemId, effect: EffectId) -> Result<bool, RegistryError> {
        let item_record = self.item_mut(item).ok_or(RegistryError::ItemNotFound(item))?;
        Ok(item_record.remove_effect(effect))
    }
}

/// A registry backed by hash maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    combatants: HashMap<CharacterId, Combatant>,
    items: HashMap<ItemId, Item>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a combatant. Returns its id.
    pub fn insert_combatant(&mut self, combatant: Combatant) -> CharacterId {
        let id = combatant.id;
        self.combatants.insert(id, combatant);
        id
    }

    /// Insert or replace an item. Returns its id.
    pub fn insert_item(&mut self, item: Item) -> ItemId {
        let id = item.id;
        self.items.insert(id, item);
        id
    }

    pub fn remove_combatant(&mut self, id: CharacterId) -> Option<Combatant> {
        self.combatants.remove(&id)
    }

    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.values()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }
}

impl Registry for InMemoryRegistry {
    fn combatant(&self, id: CharacterId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    fn commit(&mut self, update: &CombatantUpdate) -> Result<(), RegistryError> {
        let combatant = self
            .combatants
            .get_mut(&update.target)
            .ok_or(RegistryError::CombatantNotFound(update.target))?;
        update.apply(combatant)?;
        Ok(())
    }
}
