//! Layer stack.
//!
//! Ordered collection of the elements of the open design. The underlying
//! vector keeps insertion order; paint order is derived from z-index alone,
//! with ties broken by insertion order.

use atelier_core::{ElementId, LayerError};
use tracing::debug;

use crate::model::{DesignElement, ElementKind, ElementPatch};
use crate::selection_manager::SelectionManager;

/// Row of the layer panel
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInfo {
    pub id: ElementId,
    pub label: String,
    pub kind: ElementKind,
    pub z_index: i32,
    pub visible: bool,
    pub locked: bool,
    pub selected: bool,
}

/// Sort elements into paint order: z-index ascending, stable on insertion order
pub fn paint_order<'a, I>(elements: I) -> Vec<&'a DesignElement>
where
    I: IntoIterator<Item = &'a DesignElement>,
{
    let mut ordered: Vec<&DesignElement> = elements.into_iter().collect();
    ordered.sort_by_key(|e| e.z_index());
    ordered
}

/// The mutable element collection of one editor session
#[derive(Debug, Clone, Default)]
pub struct LayerStack {
    elements: Vec<DesignElement>,
    selection: SelectionManager,
    revision: u64,
}

/// Stacks compare by content: same elements in the same insertion order.
/// Selection and revision are view state and do not take part.
impl PartialEq for LayerStack {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stack from stored elements, keeping their order
    ///
    /// Fails on the first duplicate identifier or invalid attribute.
    pub fn from_elements(elements: Vec<DesignElement>) -> Result<Self, LayerError> {
        let mut stack = Self::new();
        for element in elements {
            stack.insert(element)?;
        }
        stack.selection.deselect_all();
        Ok(stack)
    }

    fn position(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id() == id)
    }

    fn not_found(id: &ElementId) -> LayerError {
        LayerError::NotFound { id: id.to_string() }
    }

    fn insert(&mut self, mut element: DesignElement) -> Result<ElementId, LayerError> {
        if self.position(element.id()).is_some() {
            return Err(LayerError::DuplicateIdentifier {
                id: element.id().to_string(),
            });
        }
        element.normalize()?;
        let id = element.id().clone();
        self.elements.push(element);
        self.revision += 1;
        Ok(id)
    }

    /// Append an element and make it the active selection
    pub fn add(&mut self, element: DesignElement) -> Result<ElementId, LayerError> {
        let id = self.insert(element)?;
        self.selection.set_selected_id(Some(id.clone()));
        debug!("Added element {} ({} total)", id, self.elements.len());
        Ok(id)
    }

    /// Merge `patch` into the element `id`
    ///
    /// Programmatic updates apply to locked elements too.
    pub fn update(&mut self, id: &ElementId, patch: &ElementPatch) -> Result<(), LayerError> {
        let index = self.position(id).ok_or_else(|| Self::not_found(id))?;
        let next = patch.apply_to(&self.elements[index])?;
        if next != self.elements[index] {
            self.elements[index] = next;
            self.revision += 1;
            debug!("Updated element {}", id);
        }
        Ok(())
    }

    /// Delete the element `id`; a missing id is a no-op
    pub fn remove(&mut self, id: &ElementId) -> Option<DesignElement> {
        let index = self.position(id)?;
        let removed = self.elements.remove(index);
        self.selection.forget(id);
        self.revision += 1;
        debug!("Removed element {}", id);
        Some(removed)
    }

    /// Give `id` a z-index above every other element
    ///
    /// # Returns
    ///
    /// The element's z-index after the move.
    pub fn reorder_to_top(&mut self, id: &ElementId) -> Result<i32, LayerError> {
        let index = self.position(id).ok_or_else(|| Self::not_found(id))?;
        let others_max = self
            .elements
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, e)| e.z_index())
            .max();
        if others_max == Some(i32::MAX) {
            self.compact_z();
            return self.reorder_to_top(id);
        }
        self.set_z(index, others_max.map(|z| z + 1))
    }

    /// Give `id` a z-index below every other element
    pub fn reorder_to_bottom(&mut self, id: &ElementId) -> Result<i32, LayerError> {
        let index = self.position(id).ok_or_else(|| Self::not_found(id))?;
        let others_min = self
            .elements
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, e)| e.z_index())
            .min();
        if others_min == Some(i32::MIN) {
            self.compact_z();
            return self.reorder_to_bottom(id);
        }
        self.set_z(index, others_min.map(|z| z - 1))
    }

    /// Z-index for an element added above everything else
    pub fn next_top_z(&mut self) -> i32 {
        if self.top_z() == Some(i32::MAX) {
            self.compact_z();
        }
        self.top_z().map_or(1, |z| z.saturating_add(1))
    }

    /// Renumber z-indices 1..=n in paint order
    ///
    /// Ties are resolved into distinct values, so the paint order is kept
    /// exactly while leaving room at both ends of the `i32` range.
    fn compact_z(&mut self) {
        let mut order: Vec<usize> = (0..self.elements.len()).collect();
        order.sort_by_key(|&i| self.elements[i].z_index());
        for (rank, index) in order.into_iter().enumerate() {
            let z = i32::try_from(rank + 1).unwrap_or(i32::MAX);
            self.elements[index].common_mut().z_index = z;
        }
        self.revision += 1;
        debug!("Renumbered z-indices of {} elements", self.elements.len());
    }

    fn set_z(&mut self, index: usize, target: Option<i32>) -> Result<i32, LayerError> {
        let element = &mut self.elements[index];
        if let Some(z) = target {
            if element.z_index() != z {
                element.common_mut().z_index = z;
                self.revision += 1;
                debug!("Element {} moved to z {}", element.id(), z);
            }
        }
        Ok(self.elements[index].z_index())
    }

    /// Select `id`, or clear the selection
    ///
    /// Selecting an id that is not in the stack clears the selection.
    pub fn set_selection(&mut self, id: Option<&ElementId>) -> Option<&ElementId> {
        let next = id.filter(|id| self.position(id).is_some()).cloned();
        self.selection.set_selected_id(next);
        self.selection.selected_id()
    }

    pub fn selected(&self) -> Option<&DesignElement> {
        self.selection
            .selected_id()
            .and_then(|id| self.get(id))
    }

    pub fn selected_id(&self) -> Option<&ElementId> {
        self.selection.selected_id()
    }

    /// Pointer drag; refused for locked elements
    pub fn move_by(&mut self, id: &ElementId, dx: f64, dy: f64) -> Result<(), LayerError> {
        let index = self.position(id).ok_or_else(|| Self::not_found(id))?;
        let element = &mut self.elements[index];
        if element.is_locked() {
            return Err(LayerError::ElementLocked { id: id.to_string() });
        }
        if !(dx.is_finite() && dy.is_finite()) {
            return Err(LayerError::InvalidAttribute {
                field: "position".to_string(),
                reason: "drag delta must be finite".to_string(),
            });
        }
        let common = element.common_mut();
        common.position = common.position.translated(dx, dy);
        self.revision += 1;
        Ok(())
    }

    /// Flip the visibility flag
    ///
    /// # Returns
    ///
    /// The new visibility.
    pub fn toggle_visibility(&mut self, id: &ElementId) -> Result<bool, LayerError> {
        let index = self.position(id).ok_or_else(|| Self::not_found(id))?;
        let common = self.elements[index].common_mut();
        common.visible = !common.visible;
        let visible = common.visible;
        self.revision += 1;
        Ok(visible)
    }

    /// Flip the lock flag, returning the new value
    pub fn toggle_lock(&mut self, id: &ElementId) -> Result<bool, LayerError> {
        let index = self.position(id).ok_or_else(|| Self::not_found(id))?;
        let common = self.elements[index].common_mut();
        common.locked = !common.locked;
        let locked = common.locked;
        self.revision += 1;
        Ok(locked)
    }

    pub fn get(&self, id: &ElementId) -> Option<&DesignElement> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.position(id).is_some()
    }

    /// Elements in insertion order
    pub fn elements(&self) -> &[DesignElement] {
        &self.elements
    }

    /// All elements in paint order, hidden ones included
    pub fn paint_order(&self) -> Vec<&DesignElement> {
        paint_order(&self.elements)
    }

    /// Layer panel rows, top-most first
    pub fn layers(&self) -> Vec<LayerInfo> {
        self.paint_order()
            .into_iter()
            .rev()
            .map(|e| LayerInfo {
                id: e.id().clone(),
                label: e.label(),
                kind: e.kind(),
                z_index: e.z_index(),
                visible: e.is_visible(),
                locked: e.is_locked(),
                selected: self.selection.is_selected(e.id()),
            })
            .collect()
    }

    /// Highest z-index in the stack, if any
    pub fn top_z(&self) -> Option<i32> {
        self.elements.iter().map(|e| e.z_index()).max()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Counter bumped by every effective mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn clear(&mut self) {
        if !self.elements.is_empty() {
            self.elements.clear();
            self.revision += 1;
        }
        self.selection.deselect_all();
    }
}
