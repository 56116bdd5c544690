//! Prizes and their effect on the session
//!
//! A prize is released from a broken block and may be caught by the paddle.
//! Resolution is a pure table lookup: it returns the score/lives changes and
//! any level directive, and never touches session state itself.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_PENALTY_FACTOR, DEFAULT_SCORE_AWARDS, DEFAULT_WIN_BONUS};
use crate::settings::Settings;

/// Prize identifiers. The discriminant is the wire code shared with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Prize {
    None = 0,
    /// Produces a brick block
    Block = 1,
    /// Paddle climbs up
    Climb = 2,
    /// Lose the ball
    Destroy = 3,
    Dragon = 4,
    Easy = 5,
    EasyT = 6,
    /// Water blocks turn to fog
    Evaporate = 7,
    Explode = 8,
    Extend = 9,
    Fast = 10,
    Fog = 11,
    /// Ball sticks to the paddle
    Goo = 12,
    Hyper = 13,
    /// Reloads the current level
    Init = 14,
    Jump = 15,
    Laser = 16,
    Mirror = 17,
    Pierce = 18,
    Protect = 19,
    Random = 20,
    Short = 21,
    Slow = 22,
    Upgrade = 23,
    Degrade = 24,
    /// Extra life
    Vitality = 25,
    /// Level cleared
    Win = 26,
    Zygote = 27,
    Score1 = 28,
    Score2 = 29,
    Score3 = 30,
    Score4 = 31,
    Score5 = 32,
}

/// Every prize, in code order
pub const ALL_PRIZES: [Prize; 33] = [
    Prize::None,
    Prize::Block,
    Prize::Climb,
    Prize::Destroy,
    Prize::Dragon,
    Prize::Easy,
    Prize::EasyT,
    Prize::Evaporate,
    Prize::Explode,
    Prize::Extend,
    Prize::Fast,
    Prize::Fog,
    Prize::Goo,
    Prize::Hyper,
    Prize::Init,
    Prize::Jump,
    Prize::Laser,
    Prize::Mirror,
    Prize::Pierce,
    Prize::Protect,
    Prize::Random,
    Prize::Short,
    Prize::Slow,
    Prize::Upgrade,
    Prize::Degrade,
    Prize::Vitality,
    Prize::Win,
    Prize::Zygote,
    Prize::Score1,
    Prize::Score2,
    Prize::Score3,
    Prize::Score4,
    Prize::Score5,
];

/// Prizes the engine can drop from an ordinary block (`None..=Zygote`)
pub const ENGINE_PRIZES: usize = 28;

/// Chance that a broken block drops anything at all
pub const DEFAULT_DROP_PROBABILITY: f64 = 0.415;

impl Prize {
    /// Look up a prize by wire code
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| ALL_PRIZES.get(i))
            .copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn category(self) -> PrizeCategory {
        match self {
            Prize::Score1 | Prize::Score2 | Prize::Score3 | Prize::Score4 | Prize::Score5 => {
                PrizeCategory::Score
            }
            Prize::Vitality | Prize::Destroy => PrizeCategory::Life,
            Prize::Win => PrizeCategory::LevelEnding,
            _ => PrizeCategory::Neutral,
        }
    }
}

impl From<Prize> for u8 {
    fn from(prize: Prize) -> Self {
        prize.code()
    }
}

impl TryFrom<u8> for Prize {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Prize::from_code(i32::from(code)).ok_or_else(|| format!("unknown prize code {code}"))
    }
}

/// Broad grouping used by the resolution table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrizeCategory {
    Score,
    Life,
    LevelEnding,
    /// Handled entirely by the engine (paddle/ball/block modifiers)
    Neutral,
}

/// What the session must do with the level after applying an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Directive {
    #[default]
    None,
    /// Level cleared, move to the next one
    AdvanceLevel,
    /// Restart the current level from its initial layout
    ReloadLevel,
}

/// Result of resolving a caught prize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Effect {
    pub score_delta: i64,
    pub lives_delta: i32,
    pub directive: Directive,
}

impl Effect {
    pub fn ends_level(&self) -> bool {
        self.directive == Directive::AdvanceLevel
    }
}

/// Scoring constants for prize resolution and ball loss
#[derive(Debug, Clone, PartialEq)]
pub struct PrizeTable {
    /// Multiplier applied to `(level + 1)^2` when a ball is lost
    pub penalty_factor: u64,
    /// Bonus for catching `Win`
    pub win_bonus: u64,
    /// Awards for `Score1..=Score5`
    pub score_awards: [u64; 5],
}

impl Default for PrizeTable {
    fn default() -> Self {
        Self {
            penalty_factor: DEFAULT_PENALTY_FACTOR,
            win_bonus: DEFAULT_WIN_BONUS,
            score_awards: DEFAULT_SCORE_AWARDS,
        }
    }
}

impl PrizeTable {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            penalty_factor: settings.penalty_factor,
            win_bonus: settings.win_bonus,
            score_awards: settings.score_awards,
        }
    }

    /// Effect of catching `prize`. Pure lookup.
    pub fn resolve(&self, prize: Prize) -> Effect {
        let award = |i: usize| Effect {
            score_delta: to_delta(self.score_awards[i]),
            ..Effect::default()
        };
        match prize {
            Prize::Score1 => award(0),
            Prize::Score2 => award(1),
            Prize::Score3 => award(2),
            Prize::Score4 => award(3),
            Prize::Score5 => award(4),
            Prize::Vitality => Effect {
                lives_delta: 1,
                ..Effect::default()
            },
            Prize::Destroy => Effect {
                lives_delta: -1,
                ..Effect::default()
            },
            Prize::Win => Effect {
                score_delta: to_delta(self.win_bonus),
                directive: Directive::AdvanceLevel,
                ..Effect::default()
            },
            Prize::Init => Effect {
                directive: Directive::ReloadLevel,
                ..Effect::default()
            },
            _ => Effect::default(),
        }
    }

    /// Score lost when the ball falls: `factor * (level + 1)^2`
    pub fn ball_lost_penalty(&self, level: u32) -> u64 {
        let n = u64::from(level) + 1;
        self.penalty_factor.saturating_mul(n.saturating_mul(n))
    }
}

fn to_delta(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Seeded prize dropper mirroring the engine's rule: with the drop
/// probability, a uniformly chosen engine prize; otherwise `None`.
#[derive(Debug, Clone)]
pub struct PrizeGenerator {
    rng: Pcg32,
    drop_probability: f64,
}

impl PrizeGenerator {
    pub fn new(seed: u64, drop_probability: f64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            drop_probability: if drop_probability.is_nan() {
                0.0
            } else {
                drop_probability.clamp(0.0, 1.0)
            },
        }
    }

    pub fn generate(&mut self) -> Prize {
        if self.rng.random_bool(self.drop_probability) {
            ALL_PRIZES[self.rng.random_range(0..ENGINE_PRIZES)]
        } else {
            Prize::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        for (i, prize) in ALL_PRIZES.iter().enumerate() {
            assert_eq!(prize.code() as usize, i);
            assert_eq!(Prize::from_code(i as i32), Some(*prize));
        }
        assert_eq!(Prize::from_code(-1), None);
        assert_eq!(Prize::from_code(33), None);
        assert_eq!(Prize::Win.code(), 26);
        assert_eq!(Prize::Score5.code(), 32);
    }

    #[test]
    fn test_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Prize::Vitality).unwrap(), "25");
        let prize: Prize = serde_json::from_str("26").unwrap();
        assert_eq!(prize, Prize::Win);
        assert!(serde_json::from_str::<Prize>("99").is_err());
    }

    #[test]
    fn test_win_awards_bonus_and_advances() {
        let table = PrizeTable::default();
        let effect = table.resolve(Prize::Win);
        assert_eq!(effect.score_delta, 100);
        assert_eq!(effect.lives_delta, 0);
        assert!(effect.ends_level());
    }

    #[test]
    fn test_life_prizes() {
        let table = PrizeTable::default();
        assert_eq!(table.resolve(Prize::Vitality).lives_delta, 1);
        assert_eq!(table.resolve(Prize::Destroy).lives_delta, -1);
        assert_eq!(Prize::Vitality.category(), PrizeCategory::Life);
    }

    #[test]
    fn test_neutral_prizes_do_nothing() {
        let table = PrizeTable::default();
        for prize in [Prize::None, Prize::Laser, Prize::Goo, Prize::Fast] {
            assert_eq!(table.resolve(prize), Effect::default());
            assert_eq!(prize.category(), PrizeCategory::Neutral);
        }
        assert_eq!(table.resolve(Prize::Init).directive, Directive::ReloadLevel);
    }

    #[test]
    fn test_resolve_is_pure() {
        let table = PrizeTable::default();
        let before = table.clone();
        for prize in ALL_PRIZES {
            assert_eq!(table.resolve(prize), table.resolve(prize));
        }
        assert_eq!(table, before);
    }

    #[test]
    fn test_ball_lost_penalty_is_quadratic() {
        let table = PrizeTable::default();
        assert_eq!(table.ball_lost_penalty(0), 2);
        assert_eq!(table.ball_lost_penalty(1), 8);
        assert_eq!(table.ball_lost_penalty(2), 18);
        assert_eq!(table.ball_lost_penalty(9), 200);
    }

    #[test]
    fn test_generator_is_deterministic() {
        let mut a = PrizeGenerator::new(42, DEFAULT_DROP_PROBABILITY);
        let mut b = PrizeGenerator::new(42, DEFAULT_DROP_PROBABILITY);
        for _ in 0..100 {
            let prize = a.generate();
            assert_eq!(prize, b.generate());
            assert!((prize.code() as usize) < ENGINE_PRIZES);
        }
    }

    #[test]
    fn test_generator_never_drops_at_zero_probability() {
        let mut generator = PrizeGenerator::new(7, 0.0);
        assert!((0..50).all(|_| generator.generate() == Prize::None));
    }
}
