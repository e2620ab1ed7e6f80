//! Which of A, B, C and M an object exists in.
//!
//! Every object seen by any of the six comparisons exists in at least one
//! of the four changesets, so the empty mask has no variant. Each variant
//! carries the existence-level outcome of its case: the flags it sets, its
//! `Added`/`Removed` headings, and how change bits are qualified (see
//! [`Strategy`]).

use std::fmt;

use serde::{Serialize, Serializer};

use arbor_diff::StatusFlags;

use crate::accumulate::Pair;
use crate::legend::Label;

/// Presence pattern of one object across the diamond.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Existence {
    A,
    B,
    AB,
    C,
    AC,
    BC,
    ABC,
    M,
    AM,
    BM,
    ABM,
    CM,
    ACM,
    BCM,
    ABCM,
}

/// How change bits (rename, move, content, attributes) are judged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Absent from M: nothing to qualify.
    None,
    /// Present in M and exactly one predecessor: M's own edits against it,
    /// read from the comparison of that predecessor with M.
    Direct(Pair),
    /// Present in A, M and one parent `x`.
    AxM { x: Label, ax: Pair, xm: Pair },
    /// Present in both parents and M, absent from A.
    Bcm,
    /// Present everywhere.
    Abcm,
}

impl Existence {
    pub fn from_mask(mask: u8) -> Option<Self> {
        use Existence::*;
        Some(match mask {
            0b0001 => A,
            0b0010 => B,
            0b0011 => AB,
            0b0100 => C,
            0b0101 => AC,
            0b0110 => BC,
            0b0111 => ABC,
            0b1000 => M,
            0b1001 => AM,
            0b1010 => BM,
            0b1011 => ABM,
            0b1100 => CM,
            0b1101 => ACM,
            0b1110 => BCM,
            0b1111 => ABCM,
            _ => return None,
        })
    }

    pub fn mask(self) -> u8 {
        use Existence::*;
        match self {
            A => 0b0001,
            B => 0b0010,
            AB => 0b0011,
            C => 0b0100,
            AC => 0b0101,
            BC => 0b0110,
            ABC => 0b0111,
            M => 0b1000,
            AM => 0b1001,
            BM => 0b1010,
            ABM => 0b1011,
            CM => 0b1100,
            ACM => 0b1101,
            BCM => 0b1110,
            ABCM => 0b1111,
        }
    }

    pub fn contains(self, label: Label) -> bool {
        self.mask() & label.bit() != 0
    }

    /// Fixed-width pattern such as `_B_M`.
    pub fn pattern(self) -> String {
        Label::ALL
            .into_iter()
            .map(|l| if self.contains(l) { l.domain() } else { '_' })
            .collect()
    }

    /// Existence-level flags of this case.
    pub fn flags(self) -> StatusFlags {
        use Existence::*;
        let added = StatusFlags::ADDED;
        let deleted = StatusFlags::DELETED;
        let by_merge = StatusFlags::MERGE_CREATED;
        match self {
            // Both parents dropped it; M inherited that.
            A => deleted,
            // A parent added it and M dropped it.
            B | C | BC => deleted | by_merge,
            // One parent deleted it; M took the deletion.
            AB | AC => deleted,
            ABC => deleted | by_merge,
            M => added | by_merge,
            // Both parents deleted it; M restored it.
            AM => added | by_merge,
            BM | CM | BCM => added,
            ABM | ACM | ABCM => StatusFlags::empty(),
        }
    }

    pub fn strategy(self) -> Strategy {
        use Existence::*;
        match self {
            A | B | AB | C | AC | BC | ABC | M => Strategy::None,
            AM => Strategy::Direct(Pair::AM),
            BM => Strategy::Direct(Pair::BM),
            CM => Strategy::Direct(Pair::CM),
            ABM => Strategy::AxM {
                x: Label::B,
                ax: Pair::AB,
                xm: Pair::BM,
            },
            ACM => Strategy::AxM {
                x: Label::C,
                ax: Pair::AC,
                xm: Pair::CM,
            },
            BCM => Strategy::Bcm,
            ABCM => Strategy::Abcm,
        }
    }

    /// Labels in `Added (...)`: parents that have it while A does not,
    /// plus M when neither parent has it.
    pub fn added_in(self) -> Vec<Label> {
        let mut out: Vec<Label> = [Label::B, Label::C]
            .into_iter()
            .filter(|x| self.contains(*x) && !self.contains(Label::A))
            .collect();
        if self.contains(Label::M) && !self.contains(Label::B) && !self.contains(Label::C) {
            out.push(Label::M);
        }
        out
    }

    /// Labels in `Removed (...)`: parents lacking what A had, plus M when
    /// a parent had it and M does not.
    pub fn removed_in(self) -> Vec<Label> {
        let mut out: Vec<Label> = [Label::B, Label::C]
            .into_iter()
            .filter(|x| self.contains(Label::A) && !self.contains(*x))
            .collect();
        if !self.contains(Label::M) && (self.contains(Label::B) || self.contains(Label::C)) {
            out.push(Label::M);
        }
        out
    }

    /// `Added (B)`-style headings for this case.
    pub fn headings(self) -> Vec<String> {
        let list = |labels: Vec<Label>| {
            labels
                .iter()
                .map(Label::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut out = Vec::new();
        let added = self.added_in();
        if !added.is_empty() {
            out.push(format!("Added ({})", list(added)));
        }
        let removed = self.removed_in();
        if !removed.is_empty() {
            out.push(format!("Removed ({})", list(removed)));
        }
        out
    }
}

impl fmt::Display for Existence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern())
    }
}

impl Serialize for Existence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.pattern())
    }
}
