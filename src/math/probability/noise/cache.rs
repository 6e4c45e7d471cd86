// src/math/probability/noise/cache.rs

use super::{config::NoiseFieldConfig, field::NoiseField};
use crate::math::error::MathResult;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::debug;

type Slot<V> = Arc<OnceLock<MathResult<Arc<V>>>>;

/// Schlüsselbasierter Memo-Speicher mit höchstens einer Berechnung pro Schlüssel.
///
/// Die Sperre schützt nur die Slot-Tabelle; berechnet wird außerhalb davon im
/// `OnceLock` des Slots, sodass verschiedene Schlüssel parallel laufen können.
#[derive(Debug)]
pub(crate) struct KeyedCache<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K: Eq + Hash + Clone, V> KeyedCache<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn get_or_compute(
        &self,
        key: K,
        compute: impl FnOnce() -> MathResult<V>,
    ) -> MathResult<Arc<V>> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key).or_default())
        };
        slot.get_or_init(|| compute().map(Arc::new)).clone()
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|slot| slot.get().is_some())
    }
}

/// Teilt Rauschfelder zwischen identischen Konfigurationen.
#[derive(Debug, Default)]
pub struct NoiseFieldCache {
    fields: Mutex<HashMap<NoiseFieldConfig, Arc<NoiseField>>>,
}

impl NoiseFieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Liefert das Feld zu `config`; legt es beim ersten Aufruf an.
    pub fn get_or_create(&self, config: &NoiseFieldConfig) -> MathResult<Arc<NoiseField>> {
        let mut fields = self.fields.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(field) = fields.get(config) {
            return Ok(Arc::clone(field));
        }
        let field = Arc::new(NoiseField::new(config.clone())?);
        debug!("NoiseFieldCache: new field for {:?}", config);
        fields.insert(config.clone(), Arc::clone(&field));
        Ok(field)
    }

    pub fn len(&self) -> usize {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.fields
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
