// Algebraic properties of the efficiency gap.
use gmcmc::stats::{district_efficiency_gap, efficiency_gap_of, wasted_votes};
use gmcmc::votes::VoteTally;
use proptest::prelude::*;

fn tally() -> impl Strategy<Value = VoteTally> {
    (0u32..10_000, 0u32..10_000).prop_map(|(dem, rep)| VoteTally::new(dem, rep))
}

fn swapped(tally: &VoteTally) -> VoteTally {
    VoteTally::new(tally.rep, tally.dem)
}

proptest! {
    #[test]
    fn gap_is_a_fraction(tallies in prop::collection::vec(tally(), 0..12)) {
        let gap = efficiency_gap_of(&tallies);
        prop_assert!((0.0..=1.0).contains(&gap.value));
        if gap.value == 0.0 {
            prop_assert_eq!(gap.signed(), 0.0);
        }
    }

    #[test]
    fn swapping_parties_flips_the_sign(tallies in prop::collection::vec(tally(), 1..12)) {
        let gap = efficiency_gap_of(&tallies);
        let mirrored: Vec<VoteTally> = tallies.iter().map(swapped).collect();
        let mirrored_gap = efficiency_gap_of(&mirrored);
        prop_assert!((gap.value - mirrored_gap.value).abs() < 1e-12);
        prop_assert_eq!(gap.favors.map(|p| p.opponent()), mirrored_gap.favors);
    }

    #[test]
    fn district_order_is_irrelevant(mut tallies in prop::collection::vec(tally(), 1..12)) {
        let gap = efficiency_gap_of(&tallies);
        tallies.reverse();
        prop_assert_eq!(gap, efficiency_gap_of(&tallies));
    }

    #[test]
    fn winner_wastes_less_than_a_majority(t in tally()) {
        let wasted = wasted_votes(&t);
        match t.winner() {
            Some(winner) => {
                let loser = winner.opponent();
                prop_assert_eq!(wasted.get(loser), t.get(loser));
                prop_assert!(wasted.get(winner) < t.get(winner));
                prop_assert_eq!(district_efficiency_gap(&t).favors, Some(winner));
            }
            None => prop_assert_eq!(wasted, VoteTally::default()),
        }
    }

    #[test]
    fn single_district_plan_matches_district_gap(t in tally()) {
        let plan_gap = efficiency_gap_of(&[t]);
        let district_gap = district_efficiency_gap(&t);
        prop_assert!((plan_gap.value - district_gap.value).abs() < 1e-12);
    }
}
