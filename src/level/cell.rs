//! Cell codes used in level rows
//!
//! Every character of a row is decoded on its own. Unknown characters are
//! read as empty cells so older builds can open levels that use newer codes.

use serde::{Deserialize, Serialize};

use crate::prize::Prize;

/// Block types understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Aluminium,
    Brick,
    Clay,
    Destroy,
    Electro,
    Fog,
    Glass,
    Glass1,
    Hyper,
    Iron,
    Jelly,
    KnockVertical,
    KnockHorizontal,
    Steel,
    Magic,
    Midas,
    Network,
    Origin,
    Plumbum,
    Quick,
    Quick1,
    Quick2,
    Rolling,
    Simple,
    Titan,
    Ultra,
    Ultra1,
    Ultra2,
    Ultra3,
    Ultra4,
    Invulnerable,
    Water,
    Extra,
    Yogurt,
    Yogurt1,
    Zygote,
    Zygote1,
    ZygoteSpawn,
    NotUsed,
}

impl BlockKind {
    /// Decode a block code. Lowercase letters alias their uppercase code.
    pub fn from_code(ch: char) -> Option<Self> {
        use BlockKind::*;
        let kind = match ch.to_ascii_uppercase() {
            'A' => Aluminium,
            'B' => Brick,
            'C' => Clay,
            'D' => Destroy,
            'E' => Electro,
            'F' => Fog,
            'G' => Glass,
            'H' => Hyper,
            'I' => Iron,
            'J' => Jelly,
            'K' => KnockVertical,
            '#' => KnockHorizontal,
            'L' => Steel,
            'M' => Magic,
            '$' => Midas,
            'N' => Network,
            'O' => Origin,
            'P' => Plumbum,
            'Q' => Quick,
            'R' => Rolling,
            'S' => Simple,
            'T' => Titan,
            'U' => Ultra,
            'V' => Invulnerable,
            'W' => Water,
            'X' => Extra,
            'Y' => Yogurt,
            'Z' => Zygote,
            '@' => ZygoteSpawn,
            '[' => Glass1,
            ']' => NotUsed,
            '{' => Quick2,
            '}' => Quick1,
            '%' => Ultra4,
            '^' => Ultra3,
            '&' => Ultra2,
            '*' => Ultra1,
            '(' => Yogurt1,
            ')' => Zygote1,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical code written back into rows
    pub fn code(self) -> char {
        use BlockKind::*;
        match self {
            Aluminium => 'A',
            Brick => 'B',
            Clay => 'C',
            Destroy => 'D',
            Electro => 'E',
            Fog => 'F',
            Glass => 'G',
            Hyper => 'H',
            Iron => 'I',
            Jelly => 'J',
            KnockVertical => 'K',
            KnockHorizontal => '#',
            Steel => 'L',
            Magic => 'M',
            Midas => '$',
            Network => 'N',
            Origin => 'O',
            Plumbum => 'P',
            Quick => 'Q',
            Rolling => 'R',
            Simple => 'S',
            Titan => 'T',
            Ultra => 'U',
            Invulnerable => 'V',
            Water => 'W',
            Extra => 'X',
            Yogurt => 'Y',
            Zygote => 'Z',
            ZygoteSpawn => '@',
            Glass1 => '[',
            NotUsed => ']',
            Quick2 => '{',
            Quick1 => '}',
            Ultra4 => '%',
            Ultra3 => '^',
            Ultra2 => '&',
            Ultra1 => '*',
            Yogurt1 => '(',
            Zygote1 => ')',
        }
    }

    /// Number of hits this block contributes to clearing a level.
    /// Zero for blocks that never have to be broken.
    pub fn cardinality_cost(self) -> u32 {
        use BlockKind::*;
        match self {
            Ultra => 5,
            Plumbum | Ultra4 => 4,
            Iron | Steel | Quick | Ultra3 => 3,
            Brick | Glass | Zygote | Quick2 | Ultra2 => 2,
            Aluminium | Clay | Electro | Fog | Glass1 | Hyper | Jelly | KnockVertical
            | KnockHorizontal | Magic | Origin | Rolling | Simple | Water | Yogurt | Yogurt1
            | Network | Quick1 | Ultra1 | Zygote1 | ZygoteSpawn => 1,
            Destroy | Midas | Titan | Invulnerable | Extra | NotUsed => 0,
        }
    }

    /// Points the engine awards when this block is destroyed
    pub fn score(self) -> u32 {
        use BlockKind::*;
        match self {
            Ultra => 585,
            Ultra4 => 458,
            Ultra3 => 333,
            Ultra2 => 211,
            Ultra1 => 100,
            Plumbum => 148,
            Steel => 101,
            Iron => 62,
            Aluminium => 25,
            Quick => 79,
            Quick2 => 51,
            Quick1 => 24,
            Brick => 24,
            Rolling => 28,
            Jelly => 23,
            Clay => 12,
            Water => 9,
            Simple => 4,
            KnockVertical | KnockHorizontal => 15,
            Zygote => 14,
            Zygote1 => 11,
            Yogurt => 9,
            Yogurt1 => 2,
            ZygoteSpawn => 1,
            Glass => 3,
            Glass1 => 2,
            Fog => 1,
            Network => 20,
            Electro => 9,
            Hyper => 11,
            Magic => 10,
            Origin => 2,
            Destroy | Midas | Titan | Invulnerable | Extra | NotUsed => 0,
        }
    }
}

/// One cell of a level grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Block(BlockKind),
    /// Capsule that releases the given prize when broken
    PrizeSpawn(Prize),
}

impl Cell {
    /// Decode a single character; anything unrecognised is `Empty`.
    ///
    /// Capsule codes `1`..`5` and `+` extend the engine's block table, which
    /// has no prize capsules of its own.
    pub fn from_code(ch: char) -> Self {
        if let Some(kind) = BlockKind::from_code(ch) {
            return Cell::Block(kind);
        }
        match ch {
            '1' => Cell::PrizeSpawn(Prize::Score1),
            '2' => Cell::PrizeSpawn(Prize::Score2),
            '3' => Cell::PrizeSpawn(Prize::Score3),
            '4' => Cell::PrizeSpawn(Prize::Score4),
            '5' => Cell::PrizeSpawn(Prize::Score5),
            '+' => Cell::PrizeSpawn(Prize::Vitality),
            _ => Cell::Empty,
        }
    }

    pub fn code(self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::Block(kind) => kind.code(),
            Cell::PrizeSpawn(prize) => match prize {
                Prize::Score1 => '1',
                Prize::Score2 => '2',
                Prize::Score3 => '3',
                Prize::Score4 => '4',
                Prize::Score5 => '5',
                Prize::Vitality => '+',
                // Only the capsules above have a code
                _ => ' ',
            },
        }
    }

    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Hits needed to clear this cell (prize capsules break in one)
    pub fn cardinality_cost(self) -> u32 {
        match self {
            Cell::Empty => 0,
            Cell::Block(kind) => kind.cardinality_cost(),
            Cell::PrizeSpawn(_) => 1,
        }
    }
}
