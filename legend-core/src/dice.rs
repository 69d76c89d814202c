//! Open Legend dice.
//!
//! Action rolls are 1d20 plus an attribute's dice, and every die explodes:
//! a die that lands on its maximum value is rolled again and added. Advantage
//! and disadvantage roll extra attribute dice and keep the highest (or
//! lowest) of the original count.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice parsing and rolling.
#[derive(Debug, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
}

/// Die types used by Open Legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D20,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D20 => 20,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            20 => Some(DieType::D20),
            _ => None,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// A dice pool: a count of one die type, e.g. `2d6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DicePool {
    pub count: u32,
    pub die: DieType,
}

impl DicePool {
    pub fn new(count: u32, die: DieType) -> Self {
        Self { count, die }
    }

    /// Parse notation like `2d6` or `d20`.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim().to_lowercase();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let d_pos = notation
            .find('d')
            .ok_or_else(|| DiceError::InvalidNotation(notation.clone()))?;

        let count_str = &notation[..d_pos];
        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceError::InvalidNotation(notation.clone()))?
        };
        if count == 0 {
            return Err(DiceError::NoDice);
        }

        let sides: u32 = notation[d_pos + 1..]
            .parse()
            .map_err(|_| DiceError::InvalidNotation(notation.clone()))?;
        let die = DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))?;

        Ok(Self { count, die })
    }

    /// Roll the pool with exploding dice.
    pub fn roll(&self, advantage: Advantage) -> PoolResult {
        self.roll_with_rng(advantage, &mut rand::thread_rng())
    }

    /// Roll with a specific RNG (useful for testing).
    pub fn roll_with_rng<R: Rng>(&self, advantage: Advantage, rng: &mut R) -> PoolResult {
        let extra = advantage.extra_dice();
        let rolled = self.count + extra;

        let mut rolls: Vec<u32> = (0..rolled).map(|_| explode(self.die, rng)).collect();

        let kept: Vec<u32> = if extra == 0 {
            rolls.clone()
        } else {
            let mut sorted = rolls.clone();
            match advantage {
                Advantage::Advantage(_) => sorted.sort_by(|a, b| b.cmp(a)),
                Advantage::Disadvantage(_) => sorted.sort(),
                Advantage::Normal => {}
            }
            sorted.truncate(self.count as usize);
            sorted
        };

        // Keep the display order stable
        rolls.sort_by(|a, b| b.cmp(a));

        PoolResult {
            pool: *self,
            rolls,
            total: kept.iter().sum::<u32>() as i32,
            kept,
        }
    }
}

/// Roll one die, rerolling and adding on its maximum value.
fn explode<R: Rng>(die: DieType, rng: &mut R) -> u32 {
    let sides = die.sides();
    let mut total = 0;
    loop {
        let roll = rng.gen_range(1..=sides);
        total += roll;
        if roll != sides {
            return total;
        }
    }
}

impl FromStr for DicePool {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DicePool::parse(s)
    }
}

impl fmt::Display for DicePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.die)
    }
}

/// Advantage state for a roll, counted in extra dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Advantage {
    #[default]
    Normal,
    Advantage(u8),
    Disadvantage(u8),
}

impl Advantage {
    /// Net two sources of advantage against each other.
    pub fn combine(self, other: Advantage) -> Advantage {
        Advantage::from_net(self.net() + other.net())
    }

    fn net(self) -> i16 {
        match self {
            Advantage::Normal => 0,
            Advantage::Advantage(n) => n as i16,
            Advantage::Disadvantage(n) => -(n as i16),
        }
    }

    fn from_net(net: i16) -> Advantage {
        match net {
            0 => Advantage::Normal,
            n if n > 0 => Advantage::Advantage(n as u8),
            n => Advantage::Disadvantage((-n) as u8),
        }
    }

    fn extra_dice(self) -> u32 {
        match self {
            Advantage::Normal => 0,
            Advantage::Advantage(n) | Advantage::Disadvantage(n) => n as u32,
        }
    }
}

/// Result of rolling one dice pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolResult {
    pub pool: DicePool,
    /// Every die rolled, highest first.
    pub rolls: Vec<u32>,
    /// The dice that counted toward the total.
    pub kept: Vec<u32>,
    pub total: i32,
}

impl fmt::Display for PoolResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rolls: Vec<String> = self.rolls.iter().map(|r| r.to_string()).collect();
        write!(f, "{} [{}] = {}", self.pool, rolls.join(", "), self.total)
    }
}

/// Convenience function to roll from a notation string.
pub fn roll(notation: &str) -> Result<PoolResult, DiceError> {
    let pool = DicePool::parse(notation)?;
    Ok(pool.roll(Advantage::Normal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let pool = DicePool::parse("2d6").unwrap();
        assert_eq!(pool.count, 2);
        assert_eq!(pool.die, DieType::D6);
    }

    #[test]
    fn test_parse_implicit_count() {
        let pool = DicePool::parse("d20").unwrap();
        assert_eq!(pool.count, 1);
        assert_eq!(pool.die, DieType::D20);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(DicePool::parse("").is_err());
        assert!(DicePool::parse("2d7").is_err());
        assert!(DicePool::parse("0d6").is_err());
        assert!(DicePool::parse("banana").is_err());
    }

    #[test]
    fn test_roll_minimum() {
        // Exploding dice have no fixed maximum, but the minimum is the count.
        for _ in 0..100 {
            let result = roll("3d8").unwrap();
            assert!(result.total >= 3);
            assert_eq!(result.kept.len(), 3);
        }
    }

    #[test]
    fn test_advantage_keeps_count() {
        let pool = DicePool::parse("2d6").unwrap();
        for _ in 0..50 {
            let result = pool.roll(Advantage::Advantage(2));
            assert_eq!(result.rolls.len(), 4);
            assert_eq!(result.kept.len(), 2);
            // Advantage keeps the highest dice
            let max_sum: u32 = result.rolls.iter().take(2).sum();
            assert_eq!(result.total, max_sum as i32);
        }
    }

    #[test]
    fn test_advantage_combine() {
        assert_eq!(
            Advantage::Advantage(2).combine(Advantage::Disadvantage(1)),
            Advantage::Advantage(1)
        );
        assert_eq!(
            Advantage::Advantage(1).combine(Advantage::Disadvantage(1)),
            Advantage::Normal
        );
        assert_eq!(
            Advantage::Normal.combine(Advantage::Disadvantage(3)),
            Advantage::Disadvantage(3)
        );
    }

    #[test]
    fn test_display() {
        let pool = DicePool::parse("2d10").unwrap();
        assert_eq!(pool.to_string(), "2d10");
    }
}
