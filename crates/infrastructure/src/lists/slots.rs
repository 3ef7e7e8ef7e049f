use std::sync::Arc;

/// Latest good result of every configured source, by source index.
///
/// A failed reload leaves the previous value of its slot in place.
pub struct SourceSlots<T> {
    slots: Vec<Option<Arc<T>>>,
}

impl<T> SourceSlots<T> {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| None).collect(),
        }
    }

    /// Stores `fresh` in slot `index`. `None` keeps the old value and returns whether one existed.
    pub fn update(&mut self, index: usize, fresh: Option<T>) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        match fresh {
            Some(value) => {
                *slot = Some(Arc::new(value));
                true
            }
            None => slot.is_some(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Arc<T>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.slots.iter().flatten()
    }
}
