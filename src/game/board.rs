//! Board geometry, the blocked-square set and move legality.
//!
//! Everything here is a pure function of its arguments. The engine, the AI and
//! the online peer all validate candidate moves through [`is_legal_move`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of the board.
pub const BOARD_SIZE: u8 = 8;

/// Number of squares on the board.
pub const SQUARE_COUNT: usize = (BOARD_SIZE as usize) * (BOARD_SIZE as usize);

/// Knight displacements, in the order candidates are generated.
///
/// The AI breaks score ties by first-seen order, so this order is observable.
pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
];

/// A square on the board. Both coordinates are in `0..BOARD_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    /// Column.
    pub x: u8,
    /// Row.
    pub y: u8,
}

/// Unchecked wire form of a [`Position`].
#[derive(Deserialize)]
struct RawPosition {
    x: i64,
    y: i64,
}

/// A coordinate pair that does not lie on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("position ({x}, {y}) is off the 8x8 board")]
pub struct OffBoard {
    /// Offending column.
    pub x: i64,
    /// Offending row.
    pub y: i64,
}

impl TryFrom<RawPosition> for Position {
    type Error = OffBoard;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        Position::checked(raw.x, raw.y).ok_or(OffBoard { x: raw.x, y: raw.y })
    }
}

impl Position {
    /// Create a position.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if either coordinate is off the board.
    #[must_use]
    pub const fn new(x: u8, y: u8) -> Self {
        debug_assert!(x < BOARD_SIZE && y < BOARD_SIZE);
        Self { x, y }
    }

    /// Create a position from signed coordinates, `None` when off the board.
    #[must_use]
    pub fn checked(x: i64, y: i64) -> Option<Self> {
        let size = i64::from(BOARD_SIZE);
        if !(0..size).contains(&x) || !(0..size).contains(&y) {
            return None;
        }
        // Both values are in 0..8 here.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pos = Self {
            x: x as u8,
            y: y as u8,
        };
        Some(pos)
    }

    /// Square index in row-major order (`y * 8 + x`).
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        (self.y as usize) * (BOARD_SIZE as usize) + self.x as usize
    }

    /// Inverse of [`Position::index`].
    #[must_use]
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= SQUARE_COUNT {
            return None;
        }
        let size = BOARD_SIZE as usize;
        #[allow(clippy::cast_possible_truncation)]
        let pos = Self {
            x: (index % size) as u8,
            y: (index / size) as u8,
        };
        Some(pos)
    }

    /// Offset this square, `None` when the result leaves the board.
    #[must_use]
    #[inline]
    pub fn offset(self, dx: i8, dy: i8) -> Option<Self> {
        Self::checked(
            i64::from(self.x) + i64::from(dx),
            i64::from(self.y) + i64::from(dy),
        )
    }

    /// Whether `other` is exactly one knight move away.
    #[must_use]
    pub fn is_knight_step(self, other: Position) -> bool {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        matches!((dx, dy), (1, 2) | (2, 1))
    }

    /// Manhattan distance between two squares.
    #[must_use]
    pub fn manhattan(self, other: Position) -> u8 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Manhattan distance from the geometric centre (3.5, 3.5).
    #[must_use]
    pub fn distance_from_center(self) -> f64 {
        let center = f64::from(BOARD_SIZE - 1) / 2.0;
        (f64::from(self.x) - center).abs() + (f64::from(self.y) - center).abs()
    }

    /// Iterate every square in row-major order.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE).flat_map(|y| (0..BOARD_SIZE).map(move |x| Position { x, y }))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Set of impassable squares, stored as a 64-bit bitboard.
///
/// Serialized as a sorted list of positions so equal sets always produce
/// identical bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<Position>", from = "Vec<Position>")]
pub struct BlockedSet {
    bits: u64,
}

impl BlockedSet {
    /// The empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    /// Build a set from raw bits (bit `i` is square index `i`).
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self { bits }
    }

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.bits
    }

    /// Whether `pos` is blocked.
    #[must_use]
    #[inline]
    pub const fn contains(self, pos: Position) -> bool {
        self.bits & (1u64 << pos.index()) != 0
    }

    /// Block `pos`. Returns `true` if it was not already blocked.
    #[inline]
    pub fn insert(&mut self, pos: Position) -> bool {
        let was = self.contains(pos);
        self.bits |= 1u64 << pos.index();
        !was
    }

    /// Unblock `pos`. Returns `true` if it was blocked.
    #[inline]
    pub fn remove(&mut self, pos: Position) -> bool {
        let was = self.contains(pos);
        self.bits &= !(1u64 << pos.index());
        was
    }

    /// Copy of this set with `pos` blocked.
    #[must_use]
    pub fn with(self, pos: Position) -> Self {
        Self {
            bits: self.bits | (1u64 << pos.index()),
        }
    }

    /// Number of blocked squares.
    #[must_use]
    pub const fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Whether nothing is blocked.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Whether every square in `self` is also in `other`.
    #[must_use]
    pub const fn is_subset(self, other: BlockedSet) -> bool {
        self.bits & !other.bits == 0
    }

    /// Blocked squares in row-major order.
    pub fn iter(self) -> impl Iterator<Item = Position> {
        Position::all().filter(move |p| self.contains(*p))
    }
}

impl FromIterator<Position> for BlockedSet {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        let mut set = Self::new();
        for pos in iter {
            set.insert(pos);
        }
        set
    }
}

impl From<Vec<Position>> for BlockedSet {
    fn from(positions: Vec<Position>) -> Self {
        positions.into_iter().collect()
    }
}

impl From<BlockedSet> for Vec<Position> {
    fn from(set: BlockedSet) -> Self {
        set.iter().collect()
    }
}

/// Legal destinations from `from`.
///
/// Without teleport these are the in-bounds, unblocked knight destinations in
/// [`KNIGHT_OFFSETS`] order. With teleport every unblocked square except
/// `from` itself is a candidate, in row-major order.
#[must_use]
pub fn legal_moves(from: Position, blocked: BlockedSet, teleport: bool) -> Vec<Position> {
    if teleport {
        return Position::all()
            .filter(|p| *p != from && !blocked.contains(*p))
            .collect();
    }

    KNIGHT_OFFSETS
        .iter()
        .filter_map(|&(dx, dy)| from.offset(dx, dy))
        .filter(|p| !blocked.contains(*p))
        .collect()
}

/// Number of legal destinations from `from`, without allocating.
#[must_use]
pub fn mobility(from: Position, blocked: BlockedSet, teleport: bool) -> usize {
    if teleport {
        let open = SQUARE_COUNT - blocked.len();
        return if blocked.contains(from) { open } else { open - 1 };
    }

    KNIGHT_OFFSETS
        .iter()
        .filter_map(|&(dx, dy)| from.offset(dx, dy))
        .filter(|p| !blocked.contains(*p))
        .count()
}

/// Whether `to` is in [`legal_moves`]`(from, blocked, teleport)`.
#[must_use]
pub fn is_legal_move(from: Position, to: Position, blocked: BlockedSet, teleport: bool) -> bool {
    if to == from || blocked.contains(to) {
        return false;
    }
    teleport || from.is_knight_step(to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_has_two_knight_moves() {
        let moves = legal_moves(Position::new(0, 0), BlockedSet::new(), false);
        assert_eq!(moves, vec![Position::new(1, 2), Position::new(2, 1)]);
    }

    #[test]
    fn test_center_has_eight_knight_moves() {
        assert_eq!(mobility(Position::new(3, 3), BlockedSet::new(), false), 8);
    }

    #[test]
    fn test_blocked_targets_are_excluded() {
        let blocked: BlockedSet = [Position::new(1, 2)].into_iter().collect();
        let moves = legal_moves(Position::new(0, 0), blocked, false);
        assert_eq!(moves, vec![Position::new(2, 1)]);
        assert!(!is_legal_move(Position::new(0, 0), Position::new(1, 2), blocked, false));
    }

    #[test]
    fn test_teleport_reaches_every_open_square() {
        let blocked: BlockedSet = [Position::new(5, 5), Position::new(6, 6)].into_iter().collect();
        let from = Position::new(0, 0);
        let moves = legal_moves(from, blocked, true);
        assert_eq!(moves.len(), SQUARE_COUNT - 3);
        assert_eq!(mobility(from, blocked, true), moves.len());
        assert!(is_legal_move(from, Position::new(7, 0), blocked, true));
        assert!(!is_legal_move(from, from, blocked, true));
        assert!(!is_legal_move(from, Position::new(5, 5), blocked, true));
    }

    #[test]
    fn test_non_knight_geometry_rejected() {
        let from = Position::new(3, 3);
        assert!(!is_legal_move(from, Position::new(4, 4), BlockedSet::new(), false));
        assert!(!is_legal_move(from, Position::new(3, 5), BlockedSet::new(), false));
        assert!(is_legal_move(from, Position::new(4, 5), BlockedSet::new(), false));
    }

    #[test]
    fn test_position_index_roundtrip_and_bounds() {
        for pos in Position::all() {
            assert_eq!(Position::from_index(pos.index()), Some(pos));
        }
        assert_eq!(Position::from_index(SQUARE_COUNT), None);
        assert_eq!(Position::checked(-1, 0), None);
        assert_eq!(Position::checked(0, 8), None);
    }

    #[test]
    fn test_blocked_set_serializes_sorted() {
        let set: BlockedSet = [Position::new(7, 7), Position::new(0, 0)].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"[{"x":0,"y":0},{"x":7,"y":7}]"#);
        let back: BlockedSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_off_board_position_rejected_on_deserialize() {
        let result: Result<Position, _> = serde_json::from_str(r#"{"x":8,"y":0}"#);
        assert!(result.is_err());
    }
}
