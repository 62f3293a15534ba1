use crate::plan::PlanGraph;
use crate::recom::StepOutcome;
use crate::stats::{ChainCounts, EnsembleSummary, SampleRecord};
use crate::votes::Party;
use serde_json::json;
use std::io::{Result, Write};

/// A standard interface for streaming chain records.
///
/// A chain calls `init` once with the baseline plan, `step` once per
/// sampling round (after the round's commit or rejection), and `close`
/// once when it finishes.
pub trait StatsWriter: Send {
    /// Writes data about the baseline (initial) plan.
    fn init(&mut self, plan: &PlanGraph, baseline: &SampleRecord) -> Result<()>;

    /// Writes the record of one sampling round.
    fn step(
        &mut self,
        round: u64,
        plan: &PlanGraph,
        outcome: &StepOutcome,
        record: &SampleRecord,
    ) -> Result<()>;

    /// Writes the final summary and flushes.
    fn close(&mut self, summary: &EnsembleSummary, counts: &ChainCounts) -> Result<()>;
}

/// Writes chain records in JSONL (JSON Lines) format: an `init` line,
/// one `step` line per sampling round, and a `summary` line.
pub struct JSONLWriter<W: Write + Send> {
    out: W,
    /// Determines whether the node lists of committed proposals are written.
    nodes: bool,
}

/// Writes chain records in TSV (tab-separated values) format.
/// Each sampling round is a line; the baseline is round 0 and no
/// summary is written.
///
/// Rows in the output contain the following columns:
///   * `round` - The sampling round (1-indexed).
///   * `committed` - Whether the round committed a recombination.
///   * `a_label` - The label of the `a`-district merged in the round.
///   * `b_label` - The label of the `b`-district merged in the round.
///   * `efficiency_gap` - The plan's efficiency gap after the round.
///   * `favors` - The party favored by the gap (empty on a tie).
///   * `seats_D` - Districts won by the Democratic party.
///   * `seats_R` - Districts won by the Republican party.
pub struct TSVWriter<W: Write + Send> {
    out: W,
}

/// Discards everything.
#[derive(Default)]
pub struct NullWriter;

impl<W: Write + Send> JSONLWriter<W> {
    pub fn new(out: W, nodes: bool) -> JSONLWriter<W> {
        JSONLWriter { out, nodes }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> TSVWriter<W> {
    pub fn new(out: W) -> TSVWriter<W> {
        TSVWriter { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn row(&mut self, round: u64, outcome: Option<&StepOutcome>, record: &SampleRecord) -> Result<()> {
        let (committed, a, b) = match outcome {
            Some(outcome) => {
                let (a, b) = outcome.dists();
                (outcome.is_committed().to_string(), a.to_string(), b.to_string())
            }
            None => (String::new(), String::new(), String::new()),
        };
        writeln!(
            self.out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            round,
            committed,
            a,
            b,
            record.efficiency_gap.value,
            record.efficiency_gap.favors.map_or("", |party| party.label()),
            record.seats.get(Party::Democratic),
            record.seats.get(Party::Republican)
        )
    }
}

impl<W: Write + Send> StatsWriter for JSONLWriter<W> {
    fn init(&mut self, plan: &PlanGraph, baseline: &SampleRecord) -> Result<()> {
        let init = json!({
            "num_dists": plan.num_districts(),
            "populations": plan.partition().dist_pops,
            "record": baseline,
        });
        writeln!(self.out, "{}", json!({ "init": init }))
    }

    fn step(
        &mut self,
        round: u64,
        _plan: &PlanGraph,
        outcome: &StepOutcome,
        record: &SampleRecord,
    ) -> Result<()> {
        let mut step = json!({
            "round": round,
            "committed": outcome.is_committed(),
            "dists": outcome.dists(),
            "record": record,
        });
        if let (true, StepOutcome::Committed(proposal), Some(fields)) =
            (self.nodes, outcome, step.as_object_mut())
        {
            fields.insert(
                "populations".to_string(),
                json!((proposal.a_pop, proposal.b_pop)),
            );
            fields.insert(
                "nodes".to_string(),
                json!((&proposal.a_nodes, &proposal.b_nodes)),
            );
        }
        writeln!(self.out, "{}", json!({ "step": step }))
    }

    fn close(&mut self, summary: &EnsembleSummary, counts: &ChainCounts) -> Result<()> {
        writeln!(
            self.out,
            "{}",
            json!({ "summary": summary, "counts": counts })
        )?;
        self.out.flush()
    }
}

impl<W: Write + Send> StatsWriter for TSVWriter<W> {
    fn init(&mut self, _plan: &PlanGraph, baseline: &SampleRecord) -> Result<()> {
        // TSV column header.
        writeln!(
            self.out,
            "round\tcommitted\ta_label\tb_label\tefficiency_gap\tfavors\tseats_D\tseats_R"
        )?;
        self.row(0, None, baseline)
    }

    fn step(
        &mut self,
        round: u64,
        _plan: &PlanGraph,
        outcome: &StepOutcome,
        record: &SampleRecord,
    ) -> Result<()> {
        self.row(round, Some(outcome), record)
    }

    fn close(&mut self, _summary: &EnsembleSummary, _counts: &ChainCounts) -> Result<()> {
        self.out.flush()
    }
}

impl StatsWriter for NullWriter {
    fn init(&mut self, _plan: &PlanGraph, _baseline: &SampleRecord) -> Result<()> {
        Ok(())
    }

    fn step(
        &mut self,
        _round: u64,
        _plan: &PlanGraph,
        _outcome: &StepOutcome,
        _record: &SampleRecord,
    ) -> Result<()> {
        Ok(())
    }

    fn close(&mut self, _summary: &EnsembleSummary, _counts: &ChainCounts) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::recom::RecomProposal;
    use crate::stats::{record, Ensemble};
    use crate::votes::VoteTally;
    use serde_json::Value;

    fn plan() -> PlanGraph {
        let mut graph = Graph::rect_grid(4, 1);
        graph.votes = vec![
            VoteTally::new(3, 1),
            VoteTally::new(2, 2),
            VoteTally::new(0, 4),
            VoteTally::new(1, 3),
        ];
        PlanGraph::from_graph(graph, &[0, 0, 1, 1]).unwrap()
    }

    #[test]
    fn jsonl_lines_parse() {
        let plan = plan();
        let baseline = record(&plan);
        let mut writer = JSONLWriter::new(Vec::<u8>::new(), true);
        writer.init(&plan, &baseline).unwrap();
        let mut proposal = RecomProposal::new_buffer(4);
        proposal.b_label = 1;
        proposal.a_nodes.extend_from_slice(&[0, 1]);
        proposal.b_nodes.extend_from_slice(&[2, 3]);
        writer
            .step(1, &plan, &StepOutcome::Committed(proposal), &baseline)
            .unwrap();
        let rejected = StepOutcome::Rejected {
            dists: (1, 0),
            trees: 2,
            attempts: 5,
        };
        writer.step(2, &plan, &rejected, &baseline).unwrap();
        writer
            .close(&Ensemble::new().summary(&baseline), &ChainCounts::default())
            .unwrap();

        let out = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["init"]["num_dists"], 2);
        assert_eq!(lines[1]["step"]["nodes"], json!([[0, 1], [2, 3]]));
        assert_eq!(lines[2]["step"]["committed"], false);
        assert_eq!(lines[2]["step"]["dists"], json!([1, 0]));
        assert!(lines[2]["step"].get("nodes").is_none());
        assert_eq!(lines[3]["summary"]["samples"], 0);
    }

    #[test]
    fn tsv_header_and_rows() {
        let plan = plan();
        let baseline = record(&plan);
        let mut writer = TSVWriter::new(Vec::<u8>::new());
        writer.init(&plan, &baseline).unwrap();
        let rejected = StepOutcome::Rejected {
            dists: (0, 1),
            trees: 1,
            attempts: 1,
        };
        writer.step(1, &plan, &rejected, &baseline).unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        let rows: Vec<Vec<&str>> = out.lines().map(|l| l.split('\t').collect()).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.len() == 8));
        assert_eq!(rows[1][0], "0");
        assert_eq!(rows[2][..4], ["1", "false", "0", "1"]);
        assert_eq!(rows[2][6..], ["1", "1"]);
    }
}
