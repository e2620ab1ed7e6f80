//! Deciding which change bits belong to the merge.
//!
//! A pairwise comparison only says that two versions differ. Whether that
//! difference is something M did, something it inherited, or something it
//! undid depends on which other pairs also differ. Each qualified bit comes
//! with a headline naming the agreements behind it, e.g.
//! `Renamed (M==B, M!=C)`.

use arbor_diff::StatusFlags;

use crate::accumulate::{Accumulated, Pair};
use crate::existence::Strategy;
use crate::legend::Label;

/// Bits subject to qualification, with the word used in headlines.
pub const QUALIFIED: [(StatusFlags, &str); 4] = [
    (StatusFlags::RENAMED, "Renamed"),
    (StatusFlags::MOVED, "Moved"),
    (StatusFlags::NON_DIR_MODIFIED, "Modified"),
    (StatusFlags::ATTR_CHANGED, "Attributes changed"),
];

/// Qualified change bits and their headlines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Qualified {
    pub flags: StatusFlags,
    pub headlines: Vec<String>,
}

impl Qualified {
    fn set(&mut self, bit: StatusFlags, word: &str, why: String) {
        self.flags |= bit;
        self.note(word, why);
    }

    fn note(&mut self, word: &str, why: String) {
        self.headlines.push(format!("{word} {why}"));
    }
}

pub fn qualify(strategy: Strategy, acc: &Accumulated) -> Qualified {
    let mut out = Qualified::default();
    for (bit, word) in QUALIFIED {
        match strategy {
            Strategy::None => {}
            Strategy::Direct(pair) => direct(&mut out, acc, pair, bit, word),
            Strategy::AxM { x, ax, xm } => axm(&mut out, acc, x, ax, xm, bit, word),
            Strategy::Bcm => bcm(&mut out, acc, bit, word),
            Strategy::Abcm => abcm(&mut out, acc, bit, word),
        }
    }
    out
}

fn direct(out: &mut Qualified, acc: &Accumulated, pair: Pair, bit: StatusFlags, word: &str) {
    if acc.changed(pair, bit) {
        let (x, _) = pair.labels();
        out.set(bit, word, format!("(M!={x})"));
    }
}

/// Present in A, one parent `x` and M.
fn axm(
    out: &mut Qualified,
    acc: &Accumulated,
    x: Label,
    ax: Pair,
    xm: Pair,
    bit: StatusFlags,
    word: &str,
) {
    let ax = acc.changed(ax, bit);
    let xm = acc.changed(xm, bit);
    let am = acc.changed(Pair::AM, bit);
    match (xm, am) {
        // M differs from both: its own change.
        (true, true) => out.set(bit, word, format!("(M!=A, M!={x})")),
        // x changed it, M went back to A.
        (true, false) => out.note(word, format!("(M==A, M!={x})")),
        // M took x's change.
        (false, _) if ax => out.set(bit, word, format!("(M=={x}, {x}!=A)")),
        (false, _) => {}
    }
}

/// Present in both parents and M, absent from A.
fn bcm(out: &mut Qualified, acc: &Accumulated, bit: StatusFlags, word: &str) {
    let bm = acc.changed(Pair::BM, bit);
    let cm = acc.changed(Pair::CM, bit);
    let bc = if acc.changed(Pair::BC, bit) { "!=" } else { "==" };
    match (bm, cm) {
        (true, true) => out.set(bit, word, format!("(M!=B, M!=C, B{bc}C)")),
        // Carried forward from C.
        (true, false) => out.note(word, "(M!=B, M==C)".into()),
        (false, true) => out.note(word, "(M==B, M!=C)".into()),
        (false, false) => {}
    }
}

/// Present everywhere; the bit is set when M differs from A.
fn abcm(out: &mut Qualified, acc: &Accumulated, bit: StatusFlags, word: &str) {
    let am = acc.changed(Pair::AM, bit);
    let bm = acc.changed(Pair::BM, bit);
    let cm = acc.changed(Pair::CM, bit);
    if am {
        let why = match (bm, cm) {
            (true, true) => "(M!=A, M!=B, M!=C)",
            (false, true) => "(M==B, M!=C)",
            (true, false) => "(M!=B, M==C)",
            (false, false) => "(M==B, M==C)",
        };
        out.set(bit, word, why.into());
    } else if bm || cm {
        let mut why = String::from("(M==A");
        for (label, differs) in [(Label::B, bm), (Label::C, cm)] {
            if differs {
                why.push_str(&format!(", M!={label}"));
            }
        }
        why.push(')');
        out.note(word, why);
    }
}
