//! Table registry and aggregate counters
//!
//! The registry is owned by the progress worker and is never shared between
//! threads. Tables live in an ordered display sequence keyed by insertion
//! number; tables that can still receive events are also indexed by name.

use std::collections::{BTreeMap, HashMap, HashSet};

/// Lifecycle state of a single table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// The structure check failed; the table never enters the data phase
    FailStructure,
    /// Started, structure check not yet displayed
    PreStart,
    /// Data check in progress
    Comparing,
    /// Data check finished and the table is equal
    Same,
    /// Data check failed
    Different,
}

/// Per-table progress record
#[derive(Debug, Clone)]
pub struct TableProgress {
    pub name: String,
    pub completed: u64,
    pub total: u64,
    pub state: TableState,
    pub stop_auto_close: bool,
}

impl TableProgress {
    /// Share of this table in the aggregate `progress` counter.
    ///
    /// Increments past `total` are kept on the record (the total may still be
    /// revised upwards) but never counted, so aggregate progress stays within
    /// aggregate total.
    pub fn contribution(&self) -> u64 {
        self.completed.min(self.total)
    }
}

/// Which phase a failed table failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Structure,
    Data,
}

/// A table that ended in a failure outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTable {
    pub name: String,
    pub kind: FailureKind,
}

/// Batch-wide running totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Completed units across tables still contributing
    pub progress: u64,
    /// Total units across tables still contributing
    pub total: u64,
    /// Tables that reached a terminal state
    pub finished: u64,
    /// Tables the batch will process
    pub expected: u64,
}

/// A line that is printed once and then becomes permanent history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixedLine {
    StructureEquivalent(String),
    StructureFailed(String),
    DataEquivalent(String),
    DataFailed(String),
}

/// Result of walking the display sequence during a full repaint
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DisplayPass {
    pub fixed: Vec<FixedLine>,
    /// Tables whose data check is still running, oldest first
    pub comparing: Vec<String>,
}

/// Ordered table registry plus aggregate counters
#[derive(Debug)]
pub struct Registry {
    sequence: BTreeMap<u64, TableProgress>,
    active: HashMap<String, u64>,
    /// Structure failures not yet displayed
    structure_failed: HashSet<String>,
    next_seq: u64,
    failed: Vec<FailedTable>,
    counters: Counters,
    processed_units: u64,
    dirty: bool,
}

impl Registry {
    pub fn new(expected_tables: u64) -> Self {
        Self {
            sequence: BTreeMap::new(),
            active: HashMap::new(),
            structure_failed: HashSet::new(),
            next_seq: 0,
            failed: Vec::new(),
            counters: Counters {
                expected: expected_tables,
                ..Counters::default()
            },
            processed_units: 0,
            dirty: false,
        }
    }

    /// Register a table.
    ///
    /// A structure failure is recorded but never becomes active and never
    /// contributes to the aggregate total. Starting a name that is already
    /// active, or whose structure failure has not been displayed yet, is
    /// ignored.
    pub fn start(&mut self, name: &str, total: u64, structure_failure: bool, stop_auto_close: bool) {
        if self.active.contains_key(name) || self.structure_failed.contains(name) {
            log::debug!("Ignoring duplicate start for pending table `{}`", name);
            return;
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        let state = if structure_failure {
            self.structure_failed.insert(name.to_string());
            TableState::FailStructure
        } else {
            self.active.insert(name.to_string(), seq);
            self.counters.total += total;
            TableState::PreStart
        };

        self.sequence.insert(
            seq,
            TableProgress {
                name: name.to_string(),
                completed: 0,
                total,
                state,
                stop_auto_close,
            },
        );
        self.dirty = true;
    }

    /// Record one completed unit for an active table
    pub fn increment(&mut self, name: &str) {
        let Some(seq) = self.active.get(name).copied() else {
            log::debug!("Ignoring increment for inactive table `{}`", name);
            return;
        };
        let Some(table) = self.sequence.get_mut(&seq) else {
            return;
        };

        let before = table.contribution();
        table.completed += 1;
        self.counters.progress += table.contribution() - before;
        self.processed_units += 1;

        if table.completed >= table.total && table.stop_auto_close {
            table.state = TableState::Same;
            self.retire(seq);
        }
    }

    /// Revise the total of an active table
    pub fn update_total(&mut self, name: &str, total: u64, stop_auto_close: bool) {
        let Some(seq) = self.active.get(name).copied() else {
            log::debug!("Ignoring total update for inactive table `{}`", name);
            return;
        };
        let Some(table) = self.sequence.get_mut(&seq) else {
            return;
        };

        let before = table.contribution();
        self.counters.total = self.counters.total - table.total + total;
        table.total = total;
        table.stop_auto_close = stop_auto_close;
        self.counters.progress = self.counters.progress - before + table.contribution();
    }

    /// Force an active table into the data-failure outcome
    pub fn fail(&mut self, name: &str) {
        let Some(seq) = self.active.get(name).copied() else {
            log::debug!("Ignoring failure for inactive table `{}`", name);
            return;
        };
        if let Some(table) = self.sequence.get_mut(&seq) {
            table.state = TableState::Different;
            self.retire(seq);
        }
    }

    /// Remove a table's contribution and drop it from the active index.
    /// The record stays in the display sequence until the next repaint.
    fn retire(&mut self, seq: u64) {
        let Some(table) = self.sequence.get(&seq) else {
            return;
        };
        self.counters.progress -= table.contribution();
        self.counters.total -= table.total;
        self.active.remove(&table.name);
        self.dirty = true;
    }

    /// Walk the display sequence for a full repaint.
    ///
    /// Started tables move to `Comparing`; tables in a terminal state are
    /// emitted once and dropped from the sequence. Only data outcomes count
    /// as finished tables.
    pub fn advance_display(&mut self) -> DisplayPass {
        let mut pass = DisplayPass::default();
        let mut settled = Vec::new();

        for (&seq, table) in self.sequence.iter_mut() {
            match table.state {
                TableState::PreStart => {
                    pass.fixed
                        .push(FixedLine::StructureEquivalent(table.name.clone()));
                    pass.comparing.push(table.name.clone());
                    table.state = TableState::Comparing;
                }
                TableState::FailStructure => {
                    pass.fixed.push(FixedLine::StructureFailed(table.name.clone()));
                    settled.push(seq);
                }
                TableState::Comparing => pass.comparing.push(table.name.clone()),
                TableState::Same => {
                    pass.fixed.push(FixedLine::DataEquivalent(table.name.clone()));
                    settled.push(seq);
                }
                TableState::Different => {
                    pass.fixed.push(FixedLine::DataFailed(table.name.clone()));
                    settled.push(seq);
                }
            }
        }

        for seq in settled {
            let Some(table) = self.sequence.remove(&seq) else {
                continue;
            };
            match table.state {
                TableState::FailStructure => {
                    self.structure_failed.remove(&table.name);
                    self.failed.push(FailedTable {
                        name: table.name,
                        kind: FailureKind::Structure,
                    });
                }
                TableState::Different => {
                    self.failed.push(FailedTable {
                        name: table.name,
                        kind: FailureKind::Data,
                    });
                    self.mark_finished();
                }
                _ => self.mark_finished(),
            }
        }

        self.dirty = false;
        pass
    }

    fn mark_finished(&mut self) {
        if self.counters.finished < self.counters.expected {
            self.counters.finished += 1;
        } else {
            log::warn!(
                "More tables finished than the {} expected; progress stays at 100%",
                self.counters.expected
            );
        }
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Tables that ended in a failure, in the order they were displayed
    pub fn failed(&self) -> &[FailedTable] {
        &self.failed
    }

    /// Units recorded by increments on active tables over the whole run
    pub fn processed_units(&self) -> u64 {
        self.processed_units
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains_key(name)
    }

    /// State of the most recently started record with this name that is
    /// still in the display sequence
    pub fn state_of(&self, name: &str) -> Option<TableState> {
        self.sequence
            .values()
            .rev()
            .find(|table| table.name == name)
            .map(|table| table.state)
    }

    /// Look up an active table
    pub fn get(&self, name: &str) -> Option<&TableProgress> {
        self.active.get(name).and_then(|seq| self.sequence.get(seq))
    }
}
