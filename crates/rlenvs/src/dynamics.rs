//! Explicit transition tables for grid-world families.
//!
//! Only the discrete, fully-specified toy-text environments carry a table;
//! every other family rejects dynamics queries.

use serde::Serialize;

/// One `(probability, next_state, reward, terminal)` branch of a
/// state-action transition.
///
/// This is the canonical normalized shape returned by the `dynamics`
/// operation, regardless of family.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransitionEntry {
    pub probability: f64,
    pub next_state: u64,
    pub reward: f64,
    pub terminal: bool,
}

/// Full transition model: `table[state][action]` lists the possible
/// branches for that state-action pair.
#[derive(Clone, Debug, Default)]
pub struct TransitionTable {
    entries: Vec<Vec<Vec<TransitionEntry>>>,
}

impl TransitionTable {
    /// Build a table with `num_states * num_actions` empty branch lists.
    pub fn new(num_states: usize, num_actions: usize) -> Self {
        Self {
            entries: vec![vec![Vec::new(); num_actions]; num_states],
        }
    }

    pub fn num_states(&self) -> usize {
        self.entries.len()
    }

    pub fn num_actions(&self) -> usize {
        self.entries.first().map_or(0, |row| row.len())
    }

    /// Append a branch to a state-action pair.
    pub fn push(&mut self, state: usize, action: usize, entry: TransitionEntry) {
        self.entries[state][action].push(entry);
    }

    /// Branches for a single state-action pair.
    pub fn branches(&self, state: usize, action: usize) -> Option<&[TransitionEntry]> {
        self.entries
            .get(state)
            .and_then(|row| row.get(action))
            .map(|b| b.as_slice())
    }

    /// Per-action branch lists for one state.
    pub fn state_row(&self, state: usize) -> Option<&[Vec<TransitionEntry>]> {
        self.entries.get(state).map(|row| row.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shape() {
        let table = TransitionTable::new(16, 4);
        assert_eq!(table.num_states(), 16);
        assert_eq!(table.num_actions(), 4);
        assert_eq!(table.branches(0, 0).unwrap(), &[]);
        assert!(table.branches(16, 0).is_none());
    }

    #[test]
    fn test_push_and_lookup() {
        let mut table = TransitionTable::new(2, 1);
        table.push(
            0,
            0,
            TransitionEntry {
                probability: 1.0,
                next_state: 1,
                reward: -1.0,
                terminal: true,
            },
        );

        let branches = table.branches(0, 0).unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].next_state, 1);
        assert!(branches[0].terminal);
    }

    #[test]
    fn test_entry_serialization() {
        let entry = TransitionEntry {
            probability: 0.5,
            next_state: 3,
            reward: 0.0,
            terminal: false,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["probability"], 0.5);
        assert_eq!(json["next_state"], 3);
        assert_eq!(json["terminal"], false);
    }
}
