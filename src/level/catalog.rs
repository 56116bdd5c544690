//! Built-in level catalog
//!
//! Levels are a fixed table indexed `0..TOTAL_LEVELS`. Lookups outside that
//! range fall back to level 0 so a corrupt persisted index still loads.

use super::descriptor::LevelDescriptor;

const FIRST: &[&str] = &[
    "          ",
    "   SSSS   ",
    "   SSSS   ",
    "   SSSS   ",
    "   SSSS   ",
];

const SECOND: &[&str] = &[
    "          ",
    "          ",
    "          ",
    "          ",
    "          ",
    "          ",
    "          ",
    "          ",
    "          ",
    "          ",
    "          ",
    "  BSSSSS  ",
    "  BSSBSS  ",
    "  BSSSSS  ",
    "          ",
    "          ",
];

const THIRD: &[&str] = &[
    "          ",
    "          ",
    "S        S",
    "B        B",
    "S        S",
    "B        S",
    "S        B",
    "S        S",
    "S        S",
    "B        B",
    "S        S",
    "B        S",
    "S        B",
    "S        S",
    "B        B",
    "S        S",
    "B        S",
    "S        B",
];

const FOURTH: &[&str] = &[
    "S B SS B S",
    " S BBBS S ",
    "B S SS B S",
];

const FIFTH: &[&str] = &[
    "TTTTTTTTTT",
    "T  GGGG  T",
    "T G1SS2G T",
    "T  GGGG  T",
    "          ",
    "  W    W  ",
    "  WW  WW  ",
];

const SIXTH: &[&str] = &[
    "    UU    ",
    "   I++I   ",
    "  ISSSSI  ",
    " LQQQQQQL ",
    "  {}{}{}  ",
    "  *&^%*&  ",
    "   $  $   ",
];

const LEVELS: &[&[&str]] = &[FIRST, SECOND, THIRD, FOURTH, FIFTH, SIXTH];

/// Number of levels in the catalog
pub const TOTAL_LEVELS: u32 = LEVELS.len() as u32;

/// Map any index onto a valid catalog slot (out of range → 0)
pub fn clamp_index(index: i64) -> u32 {
    if (0..i64::from(TOTAL_LEVELS)).contains(&index) {
        index as u32
    } else {
        0
    }
}

/// Initial layout of the level at `index`
pub fn decode(index: i64) -> LevelDescriptor {
    let slot = clamp_index(index) as usize;
    LevelDescriptor::from_rows(LEVELS[slot])
}

/// Level that follows `level`, wrapping to 0 after the last one
pub fn next_level(level: u32) -> u32 {
    (clamp_index(i64::from(level)) + 1) % TOTAL_LEVELS
}
