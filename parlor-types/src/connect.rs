use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;
use ts_rs::TS;

use crate::{Outcome, PlayerSlot};

pub const CONNECT_COLUMNS: usize = 7;
pub const CONNECT_ROWS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ConnectPiece {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
}

impl ConnectPiece {
    pub fn opponent(self) -> Self {
        match self {
            ConnectPiece::One => ConnectPiece::Two,
            ConnectPiece::Two => ConnectPiece::One,
        }
    }

    /// Seat index behind this piece (piece 1 sits in seat 0).
    pub fn seat(self) -> usize {
        match self {
            ConnectPiece::One => 0,
            ConnectPiece::Two => 1,
        }
    }

    pub fn from_seat(seat: usize) -> Option<Self> {
        match seat {
            0 => Some(ConnectPiece::One),
            1 => Some(ConnectPiece::Two),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            ConnectPiece::One => '1',
            ConnectPiece::Two => '2',
        }
    }
}

impl fmt::Display for ConnectPiece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One column of the board, bottom-to-top, at most six discs.
///
/// Persisted as a compact string of `'1'`/`'2'` characters (the wire format
/// the web clients already speak). Deserialization is defensive: anything
/// that does not match the expected shape is replaced with an empty column
/// and logged, so a corrupted document can never leak a malformed cell into
/// the rule engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, TS)]
#[ts(export)]
pub struct ConnectColumn(#[ts(type = "string")] Vec<ConnectPiece>);

fn column_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| regex::Regex::new("^[12]{0,6}$").unwrap())
}

impl ConnectColumn {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn discs(&self) -> &[ConnectPiece] {
        &self.0
    }

    pub fn height(&self) -> usize {
        self.0.len()
    }

    pub fn is_full(&self) -> bool {
        self.0.len() >= CONNECT_ROWS
    }

    /// Bounds-checked append. Returns false when the column already holds
    /// six discs; the column is never shrunk.
    pub fn push(&mut self, piece: ConnectPiece) -> bool {
        if self.is_full() {
            return false;
        }
        self.0.push(piece);
        true
    }

    pub fn get(&self, row: usize) -> Option<ConnectPiece> {
        self.0.get(row).copied()
    }

    fn encode(&self) -> String {
        self.0.iter().map(|p| p.as_char()).collect()
    }

    /// Parse the compact column encoding, sanitizing malformed input to an
    /// empty column rather than failing the whole document.
    pub fn parse_sanitized(raw: &str) -> Self {
        let truncated: String = raw.chars().take(CONNECT_ROWS).collect();
        if !column_pattern().is_match(&truncated) {
            tracing::warn!(column = %raw, "connect column was malformed, emptying column");
            return Self::new();
        }
        Self(
            truncated
                .chars()
                .map(|c| match c {
                    '1' => ConnectPiece::One,
                    _ => ConnectPiece::Two,
                })
                .collect(),
        )
    }
}

impl Serialize for ConnectColumn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for ConnectColumn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ConnectColumn::parse_sanitized(&raw))
    }
}

/// Authoritative state of one Connect Four match.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConnectGame {
    pub players: [Option<PlayerSlot>; 2],
    pub board: Vec<ConnectColumn>,
    pub turn: ConnectPiece,
    pub outcome: Outcome,
    /// Column of the most recent drop, kept for the client's fall animation.
    pub last_column: Option<usize>,
    pub created_at: String, // ISO 8601 string
}

impl ConnectGame {
    pub fn empty_board() -> Vec<ConnectColumn> {
        (0..CONNECT_COLUMNS).map(|_| ConnectColumn::new()).collect()
    }

    pub fn disc_count(&self) -> usize {
        self.board.iter().map(|c| c.height()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_round_trip() {
        let mut column = ConnectColumn::new();
        column.push(ConnectPiece::One);
        column.push(ConnectPiece::Two);
        column.push(ConnectPiece::Two);

        let encoded = serde_json::to_string(&column).unwrap();
        assert_eq!(encoded, "\"122\"");

        let decoded: ConnectColumn = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, column);
    }

    #[test]
    fn test_malformed_column_is_emptied() {
        let decoded: ConnectColumn = serde_json::from_str("\"12x1\"").unwrap();
        assert_eq!(decoded.height(), 0);

        let decoded: ConnectColumn = serde_json::from_str("\"303\"").unwrap();
        assert_eq!(decoded.height(), 0);
    }

    #[test]
    fn test_overlong_column_is_truncated() {
        let decoded: ConnectColumn = serde_json::from_str("\"12121212\"").unwrap();
        assert_eq!(decoded.height(), CONNECT_ROWS);
    }

    #[test]
    fn test_column_refuses_seventh_disc() {
        let mut column = ConnectColumn::new();
        for _ in 0..CONNECT_ROWS {
            assert!(column.push(ConnectPiece::One));
        }
        assert!(!column.push(ConnectPiece::Two));
        assert_eq!(column.height(), CONNECT_ROWS);
    }
}
