use num_bigint::BigUint;
use serde::Serialize;
use strum::EnumCount;
use tracing::info;

use crate::opcodes::Opcode;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
struct CycleStats {
    total_cycles: u64,
    count: u64,
}

impl CycleStats {
    fn record(&mut self, cycles: u64) {
        self.total_cycles += cycles;
        self.count += 1;
    }

    fn average_cycles(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_cycles as f64 / self.count as f64
        }
    }
}

/// Per-opcode execution counts and cycles of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionProfile {
    stats: [CycleStats; Opcode::COUNT],
}

impl Default for InstructionProfile {
    fn default() -> Self {
        Self {
            stats: [CycleStats::default(); Opcode::COUNT],
        }
    }
}

impl InstructionProfile {
    pub(crate) fn record(&mut self, opcode: Opcode, cycles: u64) {
        self.stats[opcode as usize].record(cycles);
    }

    /// How many times `opcode` was executed.
    pub fn count(&self, opcode: Opcode) -> u64 {
        self.stats[opcode as usize].count
    }

    /// Cycles charged to `opcode`, callee runs included.
    pub fn cycles(&self, opcode: Opcode) -> u64 {
        self.stats[opcode as usize].total_cycles
    }

    pub fn average_cycles(&self, opcode: Opcode) -> f64 {
        self.stats[opcode as usize].average_cycles()
    }

    pub fn executed(&self) -> u64 {
        self.stats.iter().map(|s| s.count).sum()
    }

    /// Opcodes executed at least once, with their count and total cycles.
    pub fn iter(&self) -> impl Iterator<Item = (Opcode, u64, u64)> + '_ {
        self.stats.iter().enumerate().filter_map(|(index, stats)| {
            let opcode = Opcode::try_from(index as u8).ok()?;
            (stats.count > 0).then_some((opcode, stats.count, stats.total_cycles))
        })
    }

    /// Logs one line per executed opcode.
    pub fn log_summary(&self) {
        for (opcode, count, cycles) in self.iter() {
            info!(
                "Opcode: {opcode}, Count: {count}, Cycles: {cycles}, Average Cycles: {:.2}",
                self.average_cycles(opcode)
            );
        }
    }
}

/// One completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    run: usize,
    level: usize,
    inputs: Vec<BigUint>,
    output: BigUint,
    cycles: u64,
}

impl RunRecord {
    /// 1-based position in the history.
    pub const fn run(&self) -> usize {
        self.run
    }

    pub const fn level(&self) -> usize {
        self.level
    }

    pub fn inputs(&self) -> &[BigUint] {
        &self.inputs
    }

    pub fn output(&self) -> &BigUint {
        &self.output
    }

    pub const fn cycles(&self) -> u64 {
        self.cycles
    }
}

/// Append-only history of completed runs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatisticsRecorder {
    records: Vec<RunRecord>,
}

impl StatisticsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        level: usize,
        inputs: Vec<BigUint>,
        output: BigUint,
        cycles: u64,
    ) -> &RunRecord {
        let run = self.records.len() + 1;
        info!(run, level, %output, cycles, "run recorded");
        self.records.push(RunRecord {
            run,
            level,
            inputs,
            output,
            cycles,
        });
        &self.records[run - 1]
    }

    /// Every recorded run, oldest first.
    pub fn history(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&RunRecord> {
        self.records.last()
    }
}
