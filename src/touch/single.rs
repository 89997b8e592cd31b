//! Selection of the contact reported through the legacy single-touch axes.

use std::collections::BTreeSet;

use crate::contact::Contact;

/// What the single-touch pointer does this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pointer<'a> {
    /// Report the selected contact.
    Down(&'a Contact),
    /// Selected contact is unstable, leave the pointer as it is.
    Hold,
    /// Release the pointer.
    Up,
}

/// Keeps the pointer on one contact until that contact goes away.
///
/// When the pointer is released a successor is picked right away, but it is
/// only reported from the next frame on. The same frame never carries a
/// release of one contact and a press of another.
#[derive(Debug, Default)]
pub struct SingleTouch {
    index: usize,
}

impl SingleTouch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracking index currently driving the pointer.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn select<'a>(
        &mut self,
        contacts: &'a [Contact],
        lifted: &BTreeSet<usize>,
        enabled: bool,
    ) -> Pointer<'a> {
        if !lifted.contains(&self.index) {
            let selected = contacts
                .iter()
                .find(|contact| contact.index == Some(self.index));

            if let Some(contact) = selected.filter(|c| enabled && c.is_valid()) {
                if !contact.is_stable() {
                    return Pointer::Hold;
                }

                return Pointer::Down(contact);
            }
        }

        if !enabled {
            return Pointer::Up;
        }

        let successor = contacts.iter().find_map(|contact| {
            contact
                .index
                .filter(|&index| index != self.index && contact.is_valid())
        });

        if let Some(index) = successor {
            log::trace!("[touch] single-touch pointer {} -> {}", self.index, index);
            self.index = index;
        }

        Pointer::Up
    }
}
