//! Frame-to-frame lift detection.

use std::collections::BTreeSet;
use std::mem;

use crate::contact::Contact;

/// Tracking indices of the current and previous frame.
///
/// Liveness is purely a matter of index membership: a contact that turned
/// invalid or unstable is still present.
#[derive(Debug, Default)]
pub struct ContactTracker {
    current: BTreeSet<usize>,
    previous: BTreeSet<usize>,
    lifted: BTreeSet<usize>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one frame.
    pub fn update(&mut self, contacts: &[Contact]) {
        mem::swap(&mut self.current, &mut self.previous);

        self.current.clear();
        self.current
            .extend(contacts.iter().filter_map(|contact| contact.index));

        self.lifted.clear();
        self.lifted
            .extend(self.previous.difference(&self.current).copied());
    }

    pub fn clear(&mut self) {
        self.current.clear();
        self.previous.clear();
        self.lifted.clear();
    }

    pub fn current(&self) -> &BTreeSet<usize> {
        &self.current
    }

    /// Indices present in the previous frame but not in the current one.
    pub fn lifted(&self) -> &BTreeSet<usize> {
        &self.lifted
    }

    /// Every index that may still be down on the output side.
    pub fn tracked(&self) -> impl Iterator<Item = usize> + '_ {
        self.current.union(&self.previous).copied()
    }
}
