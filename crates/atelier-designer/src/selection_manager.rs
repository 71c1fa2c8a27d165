use atelier_core::ElementId;

/// Tracks the active element of the layer stack.
///
/// Selection is view state only: it never affects paint order or what gets
/// persisted. The manager does not know which elements exist; the layer stack
/// validates ids before handing them over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionManager {
    /// The selected element, if any
    selected_id: Option<ElementId>,
}

impl SelectionManager {
    /// Creates a new `SelectionManager` with no selection.
    ///
    /// # Examples
    ///
    /// ```
    /// use atelier_designer::selection_manager::SelectionManager;
    ///
    /// let manager = SelectionManager::new();
    /// assert_eq!(manager.selected_id(), None);
    /// ```
    pub fn new() -> Self {
        Self { selected_id: None }
    }

    /// Returns the selected element's id.
    ///
    /// # Returns
    ///
    /// `Some(id)` if an element is selected, `None` otherwise.
    pub fn selected_id(&self) -> Option<&ElementId> {
        self.selected_id.as_ref()
    }

    /// Sets the selected element.
    ///
    /// # Arguments
    ///
    /// * `id` - The element to select, or `None` to clear
    pub fn set_selected_id(&mut self, id: Option<ElementId>) {
        self.selected_id = id;
    }

    /// Whether `id` is the selected element.
    pub fn is_selected(&self, id: &ElementId) -> bool {
        self.selected_id.as_ref() == Some(id)
    }

    /// Clears the selection if it points at `id`.
    ///
    /// # Returns
    ///
    /// `true` if the selection was cleared.
    pub fn forget(&mut self, id: &ElementId) -> bool {
        if self.is_selected(id) {
            self.selected_id = None;
            true
        } else {
            false
        }
    }

    /// Clears the selection.
    pub fn deselect_all(&mut self) {
        self.selected_id = None;
    }
}
