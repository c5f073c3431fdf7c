//! Rank vocabulary and depth thresholds
//!
//! BioLib labels every tree node with a Czech rank name. Ranks map to a
//! numeric depth: lower values are broader groups. The table is passed
//! into the parser explicitly so tests can substitute a reduced one.

use std::collections::HashMap;

/// Depth assigned to nodes without a recognized rank label
pub const UNRANKED: i32 = -1;

/// Ranks at or above this depth are never expanded further (species and below)
pub const SPECIES_THRESHOLD: i32 = 150;

/// Reseeding only considers unexplored taxa broader than this depth
pub const BROAD_GROUP_THRESHOLD: i32 = 130;

/// Offset added to a node's own depth when retrying with a widened filter
pub const WIDEN_OFFSET: i32 = 20;

/// The full BioLib rank vocabulary, in broadest-to-narrowest order.
const BIOLIB_RANKS: &[(&str, i32)] = &[
    ("doména", 55),
    ("nadříše", 58),
    ("říše", 60),
    ("podříše", 63),
    ("oddělení", 70),
    ("pododdělení", 73),
    ("nadkmen", 78),
    ("kmen", 80),
    ("podkmen", 85),
    ("infrakmen", 86),
    ("kruh", 87),
    ("nadtřída", 88),
    ("třída", 90),
    ("podtřída", 91),
    ("infratřída", 92),
    ("parvtřída", 93),
    ("část", 94),
    ("legie", 95),
    ("kohorta", 96),
    ("nadřád", 98),
    ("řád", 100),
    ("hyperřád", 101),
    ("podřád", 103),
    ("infrařád", 104),
    ("parvřád", 105),
    ("falanx", 106),
    ("nadčeleď", 108),
    ("čeleď", 110),
    ("podčeleď", 113),
    ("nadtribus", 120),
    ("tribus", 123),
    ("podtribus", 125),
    ("skupina rodů", 129),
    ("rod", 130),
    ("podrod", 133),
    ("sekce", 140),
    ("podsekce", 142),
    ("skupina druhů", 143),
    ("podskupina druhů", 144),
    ("agregát", 145),
    ("druh", 150),
    ("klepton", 151),
    ("poddruh", 153),
    ("hybrid", 154),
    ("skupina", 155),
    ("mezirodový hybrid", 156),
    ("nothosubspecies", 157),
    ("chiméra", 159),
    ("convarieta", 160),
    ("varieta", 163),
    ("forma", 170),
    ("podforma", 173),
    ("kultivar", 175),
    ("ekotyp", 176),
    ("skupina plemen", 177),
    ("sekce plemen", 178),
    ("plemeno", 179),
    ("ráz", 180),
    ("lusus", 190),
];

/// Immutable rank-name to depth lookup table
#[derive(Debug, Clone)]
pub struct RankTable {
    levels: HashMap<String, i32>,
}

impl RankTable {
    /// Builds a table from explicit (name, depth) entries
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        let levels = entries
            .into_iter()
            .map(|(name, level)| (name.into(), level))
            .collect();
        Self { levels }
    }

    /// The full BioLib vocabulary
    pub fn biolib() -> Self {
        Self::new(BIOLIB_RANKS.iter().map(|&(name, level)| (name, level)))
    }

    /// Maps a rank label to its depth
    ///
    /// Unrecognized or absent labels map to [`UNRANKED`] rather than
    /// failing; some layout nodes legitimately carry no rank.
    pub fn level_of(&self, name: Option<&str>) -> i32 {
        name.and_then(|n| self.levels.get(n).copied())
            .unwrap_or(UNRANKED)
    }
}

impl Default for RankTable {
    fn default() -> Self {
        Self::biolib()
    }
}

/// Returns true if a node at this depth can have children of its own
pub fn can_expand(level: i32) -> bool {
    level < SPECIES_THRESHOLD
}
