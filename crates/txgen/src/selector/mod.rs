//! Generator registry and weighted shape selection.
//!
//! Entries keep registration order, and selection walks them in that order:
//!
//! ```text
//! weights:  bank_send=3  create_group=1      total = 4
//! r in [0, 4):  0 1 2 -> bank_send,  3 -> create_group
//! ```
//!
//! so entry `i` is chosen with probability `weight_i / total`.

use crate::workloads::TxGenerator;
use rand::{Rng, RngCore};
use std::sync::Arc;
use tracing::debug;

/// One registered shape.
#[derive(Clone)]
pub struct GeneratorEntry {
    pub name: String,
    pub generator: Arc<dyn TxGenerator>,
    pub weight: u64,
}

impl std::fmt::Debug for GeneratorEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorEntry")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish()
    }
}

/// Named generators with relative selection weights.
#[derive(Debug, Clone, Default)]
pub struct GeneratorRegistry {
    entries: Vec<GeneratorEntry>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `generator` under `name`.
    ///
    /// Re-registering a name replaces its generator and weight but keeps its
    /// position in the selection order.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        generator: Arc<dyn TxGenerator>,
        weight: u64,
    ) {
        let name = name.into();
        debug!(%name, weight, "Registering transaction generator");

        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.generator = generator;
                entry.weight = weight;
            }
            None => self.entries.push(GeneratorEntry {
                name,
                generator,
                weight,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&GeneratorEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entries(&self) -> &[GeneratorEntry] {
        &self.entries
    }

    /// Sum of all weights. Widened so that any set of `u64` weights fits.
    pub fn total_weight(&self) -> u128 {
        self.entries.iter().map(|e| u128::from(e.weight)).sum()
    }

    /// Choose one entry according to the weights.
    ///
    /// Returns `None` only when nothing is registered. A single entry is
    /// returned without drawing. When every weight is zero the first entry
    /// is returned.
    pub fn select(&self, rng: &mut dyn RngCore) -> Option<&GeneratorEntry> {
        match self.entries.as_slice() {
            [] => None,
            [only] => Some(only),
            entries => {
                let total = self.total_weight();
                if total == 0 {
                    return entries.first();
                }

                let r = rng.gen_range(0..total);
                let mut cumulative = 0u128;
                entries
                    .iter()
                    .find(|entry| {
                        cumulative += u128::from(entry.weight);
                        cumulative > r
                    })
                    .or_else(|| entries.last())
            }
        }
    }

    /// Name of the chosen entry.
    pub fn select_shape(&self, rng: &mut dyn RngCore) -> Option<&str> {
        self.select(rng).map(|e| e.name.as_str())
    }
}
