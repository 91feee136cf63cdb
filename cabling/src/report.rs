//! Run bookkeeping: the summary row written once per run and the runtime
//! rows written per detection event and per escaping half-iteration.

use serde::Serialize;
use std::io::{self, Write};
use windfarm::Status;

/// Callbacks the canceling driver reports its progress through.
pub trait NccLogger {
    fn detection_run_started(&mut self) {}

    fn edges_relaxed(&mut self, _count: usize) {}

    /// A simple cycle was considered during walk decomposition.
    #[allow(clippy::too_many_arguments)]
    fn cycle_found(
        &mut self,
        _procedure: &str,
        _delta: i32,
        _walk_id: usize,
        _cost_change: f64,
        _cycle_length: usize,
        _elapsed_ms: f64,
        _solution: f64,
        _will_cancel: bool,
    ) {
    }

    fn initialization_finished(&mut self, _elapsed_ms: f64, _cost: f64, _status: Status) {}

    fn run_finished(&mut self, _elapsed_ms: f64, _cost: f64, _status: Status) {}

    /// One half-iteration of the escaping loop finished: either an NCC
    /// sweep or one escaping attempt.
    fn half_iteration(
        &mut self,
        _procedure: &str,
        _elapsed_ms: f64,
        _solution: f64,
        _change: f64,
        _status: Status,
    ) {
    }
}

/// Logger that swallows everything; used by the free-cables escaping pass.
pub struct DummyLogger;

impl NccLogger for DummyLogger {}

/// One line of the per-run summary CSV.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub name: String,
    pub testset: usize,
    pub instance: usize,
    pub initialization_strategy: String,
    pub delta_strategy: String,
    pub detection_strategy: String,
    pub num_turbines: usize,
    pub num_substations: usize,
    pub num_edges: usize,
    pub num_relaxed_edges: usize,
    pub num_edges_on_canceled_cycles: usize,
    pub status: Status,
    pub best_solution: f64,
    pub initial_solution: f64,
    pub num_detection_runs: usize,
    pub num_negative_cycles: usize,
    pub elapsed_ms: f64,
    pub initialization_ms: f64,
    pub cycle_canceling_ms: f64,
}

impl SummaryRow {
    pub fn new(name: String, testset: usize, instance: usize) -> SummaryRow {
        SummaryRow {
            name,
            testset,
            instance,
            initialization_strategy: String::new(),
            delta_strategy: String::new(),
            detection_strategy: String::new(),
            num_turbines: 0,
            num_substations: 0,
            num_edges: 0,
            num_relaxed_edges: 0,
            num_edges_on_canceled_cycles: 0,
            status: Status::InProgress,
            best_solution: f64::INFINITY,
            initial_solution: f64::INFINITY,
            num_detection_runs: 0,
            num_negative_cycles: 0,
            elapsed_ms: 0.0,
            initialization_ms: 0.0,
            cycle_canceling_ms: 0.0,
        }
    }

    pub fn write_header<W: Write>(writer: &mut W) -> io::Result<()> {
        writeln!(
            writer,
            "Name,Testset,Instance,InitializationStrategy,DeltaStrategy,DetectionStrategy,\
             NumberOfTurbines,NumberOfSubstations,NumberOfEdges,NumberOfRelaxedEdges,\
             NumberOfEdgesOnCanceledCycles,Status,BestSolution,InitialSolution,\
             NumberOfDetectionRuns,NumberOfNegativeCycles,GlobalElapsedMilliseconds,\
             GlobalElapsedMillisecondsInitialFlowTime,GlobalElapsedMillisecondsNegativeCycleDeletion"
        )
    }

    pub fn write_row<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.name,
            self.testset,
            self.instance,
            self.initialization_strategy,
            self.delta_strategy,
            self.detection_strategy,
            self.num_turbines,
            self.num_substations,
            self.num_edges,
            self.num_relaxed_edges,
            self.num_edges_on_canceled_cycles,
            self.status,
            self.best_solution,
            self.initial_solution,
            self.num_detection_runs,
            self.num_negative_cycles,
            self.elapsed_ms,
            self.initialization_ms,
            self.cycle_canceling_ms,
        )
    }
}

/// One line of the per-iteration runtime CSV.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeRow {
    pub name_of_problem: &'static str,
    pub name: String,
    pub testset: usize,
    pub instance: usize,
    pub current_procedure: String,
    pub walk_id: usize,
    pub solution: f64,
    pub change_in_cost: f64,
    pub elapsed_ms: f64,
    pub cycle_length: usize,
    pub delta: i32,
}

impl RuntimeRow {
    pub fn write_header<W: Write>(writer: &mut W) -> io::Result<()> {
        writeln!(
            writer,
            "NameOfProblem,Name,Testset,Instance,CurrentProcedure,WalkId,Solution,\
             ChangeInCost,GlobalElapsedMilliseconds,NumberOfEdgesPerCycle,Delta"
        )
    }

    pub fn write_row<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{}",
            self.name_of_problem,
            self.name,
            self.testset,
            self.instance,
            self.current_procedure,
            self.walk_id,
            self.solution,
            self.change_in_cost,
            self.elapsed_ms,
            self.cycle_length,
            self.delta,
        )
    }
}

/// The recording logger: accumulates the summary and the runtime rows.
pub struct RunLogger {
    pub summary: SummaryRow,
    pub rows: Vec<RuntimeRow>,
}

impl RunLogger {
    pub fn new(summary: SummaryRow) -> RunLogger {
        RunLogger { summary, rows: Vec::new() }
    }

    fn row(&self, procedure: &str) -> RuntimeRow {
        RuntimeRow {
            name_of_problem: "NegativeCycleCanceling",
            name: self.summary.name.clone(),
            testset: self.summary.testset,
            instance: self.summary.instance,
            current_procedure: procedure.to_string(),
            walk_id: 0,
            solution: 0.0,
            change_in_cost: 0.0,
            elapsed_ms: 0.0,
            cycle_length: 0,
            delta: 0,
        }
    }
}

impl NccLogger for RunLogger {
    fn detection_run_started(&mut self) {
        self.summary.num_detection_runs += 1;
    }

    fn edges_relaxed(&mut self, count: usize) {
        self.summary.num_relaxed_edges += count;
    }

    fn cycle_found(
        &mut self,
        procedure: &str,
        delta: i32,
        walk_id: usize,
        cost_change: f64,
        cycle_length: usize,
        elapsed_ms: f64,
        solution: f64,
        will_cancel: bool,
    ) {
        if will_cancel {
            self.summary.num_negative_cycles += 1;
            self.summary.num_edges_on_canceled_cycles += cycle_length;
        }
        let mut row = self.row(procedure);
        row.walk_id = walk_id;
        row.solution = if will_cancel { solution + cost_change } else { solution };
        row.change_in_cost = cost_change;
        row.elapsed_ms = elapsed_ms;
        row.cycle_length = cycle_length;
        row.delta = delta;
        self.rows.push(row);
    }

    fn initialization_finished(&mut self, elapsed_ms: f64, cost: f64, status: Status) {
        self.summary.initialization_ms = elapsed_ms;
        self.summary.initial_solution = cost;
        // The status column stays in progress unless initialization already
        // ended the run.
        if status != Status::Success {
            self.summary.status = status;
            self.summary.elapsed_ms = elapsed_ms;
            self.summary.cycle_canceling_ms = 0.0;
        }
    }

    fn run_finished(&mut self, elapsed_ms: f64, cost: f64, status: Status) {
        self.summary.elapsed_ms = elapsed_ms;
        self.summary.cycle_canceling_ms = elapsed_ms - self.summary.initialization_ms;
        self.summary.best_solution = cost;
        self.summary.status = status;
    }

    fn half_iteration(
        &mut self,
        procedure: &str,
        elapsed_ms: f64,
        solution: f64,
        change: f64,
        status: Status,
    ) {
        let mut row = self.row(procedure);
        row.solution = solution;
        row.change_in_cost = change;
        row.elapsed_ms = elapsed_ms;
        // The delta column carries the status code of the half-iteration.
        row.delta = status.code();
        self.rows.push(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_round_trips_through_csv() {
        let mut summary = SummaryRow::new("WCP-NCC-testset-0-instance-1".to_string(), 0, 1);
        summary.num_turbines = 2;
        summary.best_solution = 123.5;
        summary.status = Status::Success;

        let mut buffer = Vec::new();
        SummaryRow::write_header(&mut buffer).unwrap();
        summary.write_row(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        let row = lines.next().unwrap();
        assert_eq!(header.split(',').count(), row.split(',').count());
        assert!(row.starts_with("WCP-NCC-testset-0-instance-1,0,1,"));
        assert!(row.contains(",123.5,"));
    }

    #[test]
    fn run_logger_accumulates_counts() {
        let mut logger = RunLogger::new(SummaryRow::new("run".into(), 0, 1));
        logger.detection_run_started();
        logger.detection_run_started();
        logger.edges_relaxed(10);
        logger.cycle_found("NCC", 1, 0, -5.0, 3, 1.0, 100.0, true);
        logger.cycle_found("NCC", 1, 0, 2.0, 2, 1.5, 95.0, false);
        assert_eq!(logger.summary.num_detection_runs, 2);
        assert_eq!(logger.summary.num_relaxed_edges, 10);
        assert_eq!(logger.summary.num_negative_cycles, 1);
        assert_eq!(logger.summary.num_edges_on_canceled_cycles, 3);
        assert_eq!(logger.rows.len(), 2);
    }
}
