#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Source,
    Target,
}

/// Source/target pair with toggle semantics. A token never sits in both slots.
#[derive(Debug, Clone)]
pub struct Selection<T> {
    source: Option<T>,
    target: Option<T>,
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self {
            source: None,
            target: None,
        }
    }
}

impl<T: Clone + PartialEq> Selection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Option<&T> {
        self.source.as_ref()
    }

    pub fn target(&self) -> Option<&T> {
        self.target.as_ref()
    }

    pub fn get(&self, slot: Slot) -> Option<&T> {
        match slot {
            Slot::Source => self.source(),
            Slot::Target => self.target(),
        }
    }

    pub fn slot_of(&self, token: &T) -> Option<Slot> {
        if self.source.as_ref() == Some(token) {
            Some(Slot::Source)
        } else if self.target.as_ref() == Some(token) {
            Some(Slot::Target)
        } else {
            None
        }
    }

    /// Click on `token`: clear its slot if selected, otherwise fill the first empty slot.
    /// Returns the slot that changed, or `None` when both slots were already taken.
    pub fn toggle(&mut self, token: &T) -> Option<Slot> {
        match self.slot_of(token) {
            Some(Slot::Source) => {
                self.source = None;
                Some(Slot::Source)
            }
            Some(Slot::Target) => {
                self.target = None;
                Some(Slot::Target)
            }
            None if self.source.is_none() => {
                self.source = Some(token.clone());
                Some(Slot::Source)
            }
            None if self.target.is_none() => {
                self.target = Some(token.clone());
                Some(Slot::Target)
            }
            None => None,
        }
    }

    pub fn clear(&mut self) {
        self.source = None;
        self.target = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_fills_then_clears_source() {
        let mut selection = Selection::new();
        assert_eq!(selection.toggle(&"A"), Some(Slot::Source));
        assert_eq!(selection.source(), Some(&"A"));
        assert_eq!(selection.toggle(&"A"), Some(Slot::Source));
        assert_eq!(selection.source(), None);
    }

    #[test]
    fn second_token_goes_to_target() {
        let mut selection = Selection::new();
        selection.toggle(&"A");
        assert_eq!(selection.toggle(&"B"), Some(Slot::Target));
        assert_eq!(selection.source(), Some(&"A"));
        assert_eq!(selection.target(), Some(&"B"));
    }

    #[test]
    fn clearing_source_leaves_target() {
        let mut selection = Selection::new();
        selection.toggle(&"A");
        selection.toggle(&"B");
        assert_eq!(selection.toggle(&"A"), Some(Slot::Source));
        assert_eq!(selection.source(), None);
        assert_eq!(selection.target(), Some(&"B"));

        // The freed source slot is filled before anything else.
        assert_eq!(selection.toggle(&"C"), Some(Slot::Source));
        assert_eq!(selection.slot_of(&"C"), Some(Slot::Source));
    }

    #[test]
    fn third_token_is_ignored_when_full() {
        let mut selection = Selection::new();
        selection.toggle(&"A");
        selection.toggle(&"B");
        assert_eq!(selection.toggle(&"C"), None);
        assert_eq!(selection.slot_of(&"C"), None);
        assert_eq!(selection.get(Slot::Target), Some(&"B"));
    }
}
