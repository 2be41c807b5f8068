//! In-process navigation stack. One mutator context (the event thread),
//! so no locking here; the IPC layer owns the single instance.

use crate::model::Destination;

pub struct Navigator {
    stack: Vec<Destination>,
}

impl Navigator {
    pub fn new(root: Destination) -> Self {
        Self { stack: vec![root] }
    }

    /// Pushes `dest`. When `clear_up_to` names an entry on the stack,
    /// everything above it is removed first, and the entry itself too when
    /// `inclusive`. Post-auth navigation uses this so back-navigation can
    /// never return to welcome/login/signup. A `clear_up_to` that matches
    /// nothing clears nothing.
    pub fn navigate(&mut self, dest: Destination, clear_up_to: Option<&Destination>, inclusive: bool) {
        if let Some(target) = clear_up_to {
            if let Some(pos) = self.stack.iter().rposition(|d| d == target) {
                let keep = if inclusive { pos } else { pos + 1 };
                self.stack.truncate(keep);
            }
        }
        self.stack.push(dest);
    }

    /// Pops the top entry. The root entry is never popped past; returns
    /// whether a pop occurred.
    pub fn pop_back(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        self.stack.pop();
        true
    }

    /// Replaces the whole stack with a single root. Used once session
    /// resolution completes.
    pub fn reset(&mut self, root: Destination) {
        self.stack.clear();
        self.stack.push(root);
    }

    pub fn current(&self) -> &Destination {
        // Invariant: the stack is never empty.
        self.stack.last().unwrap_or(&Destination::Welcome)
    }

    pub fn stack(&self) -> &[Destination] {
        &self.stack
    }
}
