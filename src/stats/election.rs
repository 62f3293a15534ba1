//! Per-plan election metrics: efficiency gap and seat counts.
use crate::plan::PlanGraph;
use crate::votes::{Party, VoteTally};
use serde::Serialize;

/// An efficiency gap and the party it favors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EfficiencyGap {
    /// The gap, in `[0, 1]`.
    pub value: f64,
    /// The party that benefits (`None` on a tie).
    pub favors: Option<Party>,
}

impl EfficiencyGap {
    /// A zero gap favoring no one.
    pub fn zero() -> EfficiencyGap {
        EfficiencyGap {
            value: 0.0,
            favors: None,
        }
    }

    /// The gap as a signed value: positive when it favors Democrats,
    /// negative when it favors Republicans.
    pub fn signed(&self) -> f64 {
        match self.favors {
            Some(Party::Democratic) => self.value,
            Some(Party::Republican) => -self.value,
            None => 0.0,
        }
    }
}

/// Wasted votes for each party in a single district.
///
/// The loser wastes every vote; the winner wastes every vote beyond the
/// `ceil(total / 2)` needed to win. A tied district wastes nothing.
pub fn wasted_votes(tally: &VoteTally) -> VoteTally {
    let votes_to_win = (tally.total() + 1) / 2;
    match tally.winner() {
        Some(Party::Democratic) => VoteTally::new(tally.dem - votes_to_win, tally.rep),
        Some(Party::Republican) => VoteTally::new(tally.dem, tally.rep - votes_to_win),
        None => VoteTally::default(),
    }
}

/// The efficiency gap of one district, reported with its winner.
pub fn district_efficiency_gap(tally: &VoteTally) -> EfficiencyGap {
    let winner = match tally.winner() {
        Some(winner) => winner,
        None => return EfficiencyGap::zero(),
    };
    let wasted = wasted_votes(tally);
    let diff = (wasted.dem as f64 - wasted.rep as f64).abs();
    EfficiencyGap {
        value: diff / tally.total() as f64,
        favors: Some(winner),
    }
}

/// The whole-plan efficiency gap for per-district tallies.
///
/// Wasted votes are pooled over all districts and divided by the total
/// vote; the favored party is the one that wasted fewer votes.
pub fn efficiency_gap_of(tallies: &[VoteTally]) -> EfficiencyGap {
    let total: u64 = tallies.iter().map(|t| t.total() as u64).sum();
    if total == 0 {
        return EfficiencyGap::zero();
    }
    let (wasted_dem, wasted_rep) = tallies
        .iter()
        .map(wasted_votes)
        .fold((0u64, 0u64), |(d, r), w| (d + w.dem as u64, r + w.rep as u64));
    let favors = if wasted_dem < wasted_rep {
        Some(Party::Democratic)
    } else if wasted_rep < wasted_dem {
        Some(Party::Republican)
    } else {
        None
    };
    EfficiencyGap {
        value: (wasted_dem.max(wasted_rep) - wasted_dem.min(wasted_rep)) as f64 / total as f64,
        favors,
    }
}

/// The whole-plan efficiency gap.
pub fn plan_efficiency_gap(plan: &PlanGraph) -> EfficiencyGap {
    efficiency_gap_of(&plan.view().all_votes())
}

/// The number of districts in which `party` strictly outpolls its opponent.
pub fn seats_won_by(plan: &PlanGraph, party: Party) -> usize {
    plan.view()
        .all_votes()
        .iter()
        .filter(|tally| tally.winner() == Some(party))
        .count()
}

/// Election results for one district of a plan.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DistrictResult {
    /// The district's original label.
    pub label: String,
    pub votes: VoteTally,
    pub winner: Option<Party>,
    pub gap: EfficiencyGap,
}

/// Seat counts for both parties.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Seats {
    #[serde(rename = "D")]
    pub dem: usize,
    #[serde(rename = "R")]
    pub rep: usize,
}

impl Seats {
    pub fn get(&self, party: Party) -> usize {
        match party {
            Party::Democratic => self.dem,
            Party::Republican => self.rep,
        }
    }
}

/// A snapshot of a plan's election statistics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SampleRecord {
    pub efficiency_gap: EfficiencyGap,
    pub seats: Seats,
    pub districts: Vec<DistrictResult>,
}

impl SampleRecord {
    /// Computes the statistics of `plan`'s current assignment.
    pub fn of(plan: &PlanGraph) -> SampleRecord {
        let tallies = plan.view().all_votes();
        let districts: Vec<DistrictResult> = tallies
            .iter()
            .enumerate()
            .map(|(dist, tally)| DistrictResult {
                label: plan.district_label(dist).to_string(),
                votes: *tally,
                winner: tally.winner(),
                gap: district_efficiency_gap(tally),
            })
            .collect();
        let seats = districts
            .iter()
            .fold(Seats::default(), |mut seats, result| {
                match result.winner {
                    Some(Party::Democratic) => seats.dem += 1,
                    Some(Party::Republican) => seats.rep += 1,
                    None => {}
                }
                seats
            });
        SampleRecord {
            efficiency_gap: efficiency_gap_of(&tallies),
            seats,
            districts,
        }
    }
}

/// Computes the statistics of `plan`'s current assignment.
pub fn record(plan: &PlanGraph) -> SampleRecord {
    SampleRecord::of(plan)
}
