use anyhow::{anyhow, Result};

use crate::detect::ClassId;

/// Egyptian banknote denominations in model class order.
pub const EGP_DENOMINATIONS: [u32; 6] = [5, 10, 20, 50, 100, 200];

/// Fixed mapping from class index to a real-world value (e.g. a banknote denomination).
///
/// Immutable once built; shared by every component of a mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassValueTable {
    values: Vec<u32>,
}

impl ClassValueTable {
    pub fn new(values: Vec<u32>) -> Result<Self> {
        if values.is_empty() {
            return Err(anyhow!("class value table must not be empty"));
        }
        if let Some(idx) = values.iter().position(|v| *v == 0) {
            return Err(anyhow!("class value at index {} must be positive", idx));
        }
        Ok(Self { values })
    }

    pub fn egyptian_pounds() -> Self {
        Self {
            values: EGP_DENOMINATIONS.to_vec(),
        }
    }

    pub fn value(&self, class: ClassId) -> Option<u32> {
        self.values.get(class).copied()
    }

    pub fn contains(&self, class: ClassId) -> bool {
        class < self.values.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }
}

impl Default for ClassValueTable {
    fn default() -> Self {
        Self::egyptian_pounds()
    }
}
