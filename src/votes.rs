//! Two-party vote tallies.
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// The two parties tracked in election data.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Party {
    #[serde(rename = "D")]
    Democratic,
    #[serde(rename = "R")]
    Republican,
}

impl Party {
    /// Both parties, in label order.
    pub const ALL: [Party; 2] = [Party::Democratic, Party::Republican];

    /// Returns the other party.
    pub fn opponent(self) -> Party {
        match self {
            Party::Democratic => Party::Republican,
            Party::Republican => Party::Democratic,
        }
    }

    /// Parses a one-letter party label (`"D"` or `"R"`).
    pub fn from_label(label: &str) -> Option<Party> {
        match label {
            "D" => Some(Party::Democratic),
            "R" => Some(Party::Republican),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Party::Democratic => "D",
            Party::Republican => "R",
        }
    }
}

/// Votes cast for each party within some unit (a precinct, a district,
/// or a whole plan).
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct VoteTally {
    #[serde(rename = "D")]
    pub dem: u32,
    #[serde(rename = "R")]
    pub rep: u32,
}

impl VoteTally {
    pub fn new(dem: u32, rep: u32) -> VoteTally {
        VoteTally { dem, rep }
    }

    /// Returns the number of votes cast for `party`.
    pub fn get(&self, party: Party) -> u32 {
        match party {
            Party::Democratic => self.dem,
            Party::Republican => self.rep,
        }
    }

    /// Returns the total number of votes cast.
    pub fn total(&self) -> u32 {
        self.dem + self.rep
    }

    /// Returns the party with strictly more votes (`None` on a tie).
    pub fn winner(&self) -> Option<Party> {
        if self.dem > self.rep {
            Some(Party::Democratic)
        } else if self.rep > self.dem {
            Some(Party::Republican)
        } else {
            None
        }
    }
}

/// A single vote for a party (precinct data that only records one
/// party label per precinct).
impl From<Party> for VoteTally {
    fn from(party: Party) -> VoteTally {
        match party {
            Party::Democratic => VoteTally::new(1, 0),
            Party::Republican => VoteTally::new(0, 1),
        }
    }
}

impl Add for VoteTally {
    type Output = VoteTally;

    fn add(self, other: VoteTally) -> VoteTally {
        VoteTally::new(self.dem + other.dem, self.rep + other.rep)
    }
}

impl AddAssign for VoteTally {
    fn add_assign(&mut self, other: VoteTally) {
        self.dem += other.dem;
        self.rep += other.rep;
    }
}

impl Sum for VoteTally {
    fn sum<I: Iterator<Item = VoteTally>>(iter: I) -> VoteTally {
        iter.fold(VoteTally::default(), |acc, t| acc + t)
    }
}

impl<'a> Sum<&'a VoteTally> for VoteTally {
    fn sum<I: Iterator<Item = &'a VoteTally>>(iter: I) -> VoteTally {
        iter.fold(VoteTally::default(), |acc, &t| acc + t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_labels_round_trip() {
        for &party in Party::ALL.iter() {
            assert_eq!(Party::from_label(party.label()), Some(party));
        }
        assert_eq!(Party::from_label("G"), None);
        assert_eq!(Party::Democratic.opponent(), Party::Republican);
    }

    #[test]
    fn tally_winner() {
        assert_eq!(VoteTally::new(6, 2).winner(), Some(Party::Democratic));
        assert_eq!(VoteTally::new(1, 3).winner(), Some(Party::Republican));
        assert_eq!(VoteTally::new(4, 4).winner(), None);
        assert_eq!(VoteTally::default().winner(), None);
    }

    #[test]
    fn tally_sums() {
        let tallies = vec![
            VoteTally::from(Party::Democratic),
            VoteTally::from(Party::Democratic),
            VoteTally::from(Party::Republican),
            VoteTally::new(10, 5),
        ];
        let total: VoteTally = tallies.iter().sum();
        assert_eq!(total, VoteTally::new(12, 6));
        assert_eq!(total.total(), 18);
        assert_eq!(total.get(Party::Republican), 6);
    }

    #[test]
    fn tally_serializes_with_party_labels() {
        let json = serde_json::to_string(&VoteTally::new(3, 1)).unwrap();
        assert_eq!(json, r#"{"D":3,"R":1}"#);
        let party: Party = serde_json::from_str(r#""R""#).unwrap();
        assert_eq!(party, Party::Republican);
    }
}
