//! Folding six pairwise comparisons into one entry per gid.

use std::collections::BTreeMap;

use arbor_diff::{ChangeRecord, SideDetail, StatusFlags};
use arbor_types::Gid;

use crate::error::{MergeError, MergeResult};
use crate::existence::Existence;
use crate::legend::Label;

/// One of the six two-way comparisons of a diamond, orig side first.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pair {
    AB,
    AC,
    BC,
    BM,
    CM,
    AM,
}

impl Pair {
    pub const ALL: [Pair; 6] = [Pair::AB, Pair::AC, Pair::BC, Pair::BM, Pair::CM, Pair::AM];

    pub fn labels(self) -> (Label, Label) {
        match self {
            Pair::AB => (Label::A, Label::B),
            Pair::AC => (Label::A, Label::C),
            Pair::BC => (Label::B, Label::C),
            Pair::BM => (Label::B, Label::M),
            Pair::CM => (Label::C, Label::M),
            Pair::AM => (Label::A, Label::M),
        }
    }

    fn index(self) -> usize {
        match self {
            Pair::AB => 0,
            Pair::AC => 1,
            Pair::BC => 2,
            Pair::BM => 3,
            Pair::CM => 4,
            Pair::AM => 5,
        }
    }
}

/// Everything the six comparisons said about one gid.
#[derive(Clone, Debug, Default)]
pub struct Accumulated {
    mask: u8,
    flags: [Option<StatusFlags>; 6],
    sides: BTreeMap<Label, SideDetail>,
}

impl Accumulated {
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Flags the comparison reported, `None` if it reported nothing.
    pub fn pair_flags(&self, pair: Pair) -> Option<StatusFlags> {
        self.flags[pair.index()]
    }

    /// `true` if `pair` saw `bit` change.
    pub fn changed(&self, pair: Pair, bit: StatusFlags) -> bool {
        self.pair_flags(pair).is_some_and(|f| f.contains(bit))
    }

    pub fn side(&self, label: Label) -> Option<&SideDetail> {
        self.sides.get(&label)
    }

    /// Per-side details in A, B, C, M order.
    pub fn sides(&self) -> impl Iterator<Item = &SideDetail> {
        self.sides.values()
    }

    /// Type bit, taken from any reporting comparison.
    pub fn type_flags(&self) -> StatusFlags {
        self.flags
            .iter()
            .flatten()
            .fold(StatusFlags::empty(), |acc, f| acc | (*f & StatusFlags::TYPE))
    }
}

/// Per-gid accumulation across comparisons.
#[derive(Debug, Default)]
pub struct Accumulator {
    objects: BTreeMap<Gid, Accumulated>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Fold one record from the comparison `pair` in.
    pub fn add(&mut self, pair: Pair, record: &ChangeRecord) {
        let entry = self.objects.entry(record.gid.clone()).or_default();
        for detail in &record.sides {
            if let Some(label) = Label::from_domain(detail.domain) {
                entry.mask |= label.bit();
                entry
                    .sides
                    .entry(label)
                    .or_insert_with(|| detail.clone());
            }
        }
        entry.flags[pair.index()] = Some(record.flags);
    }

    /// Drain into `(gid, existence, accumulated)` triples in gid order.
    pub fn into_cases(self) -> MergeResult<Vec<(Gid, Existence, Accumulated)>> {
        self.objects
            .into_iter()
            .map(|(gid, acc)| match Existence::from_mask(acc.mask) {
                Some(existence) => Ok((gid, existence, acc)),
                None => Err(MergeError::EmptyExistence(gid)),
            })
            .collect()
    }
}
