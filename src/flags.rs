//! Result shaping policy.
//!
//! A query asks for a *shape* (one row, every row, or "decide from the data") and a
//! *keying* (rows indexed by position, by column name, or both). The policy is a pure
//! function of those flags and, for [`Shape::Auto`], the size of the first rowset.

use serde::{Deserialize, Serialize};

use crate::error::FlagsError;
use crate::results::{QueryResult, Row};

/// How many rows a query hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// The first row of the first rowset, or nothing when the rowset is empty.
    ///
    /// An empty rowset and a failed query look the same through the sentinel API;
    /// use `try_query` to tell them apart.
    OneRow,
    /// Every row of the first rowset, possibly empty.
    #[default]
    ManyRows,
    /// `ManyRows` if the first rowset has more than one row, otherwise `OneRow`.
    ///
    /// Legacy mode: the whole rowset is buffered before the shape is known and the return
    /// type depends on the data. Prefer an explicit shape.
    Auto,
}

/// How values inside a row are addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keying {
    Positional,
    #[default]
    Keyed,
    Both,
}

impl Keying {
    #[must_use]
    pub fn keyed(self) -> bool {
        matches!(self, Keying::Keyed | Keying::Both)
    }

    #[must_use]
    pub fn positional(self) -> bool {
        matches!(self, Keying::Positional | Keying::Both)
    }
}

/// Per-call request flags.
///
/// ```rust
/// use sql_connector::{Keying, ResultFlags, Shape};
///
/// let flags = ResultFlags::ONE_ROW.with_keying(Keying::Both);
/// assert_eq!(flags.shape, Shape::OneRow);
/// assert_eq!(ResultFlags::default(), ResultFlags::new(Shape::ManyRows, Keying::Keyed));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultFlags {
    pub shape: Shape,
    pub keying: Keying,
}

impl ResultFlags {
    pub const ONE_ROW: Self = Self::new(Shape::OneRow, Keying::Keyed);
    pub const MANY_ROWS: Self = Self::new(Shape::ManyRows, Keying::Keyed);
    pub const AUTO: Self = Self::new(Shape::Auto, Keying::Keyed);

    // Legacy bit values.
    pub const BIT_ONE_ROW: u8 = 1;
    pub const BIT_MANY_ROWS: u8 = 2;
    pub const BIT_AUTO: u8 = 4;
    pub const BIT_POSITIONAL: u8 = 8;
    pub const BIT_KEYED: u8 = 16;

    const SHAPE_BITS: u8 = Self::BIT_ONE_ROW | Self::BIT_MANY_ROWS | Self::BIT_AUTO;
    const KEYING_BITS: u8 = Self::BIT_POSITIONAL | Self::BIT_KEYED;

    #[must_use]
    pub const fn new(shape: Shape, keying: Keying) -> Self {
        Self { shape, keying }
    }

    #[must_use]
    pub const fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    #[must_use]
    pub const fn with_keying(mut self, keying: Keying) -> Self {
        self.keying = keying;
        self
    }

    /// Decode a legacy bitset.
    ///
    /// No shape bit means `ManyRows`, no keying bit means `Keyed`, both keying bits mean
    /// `Both`.
    ///
    /// # Errors
    ///
    /// Returns [`FlagsError`] for unknown bits or more than one shape bit.
    pub fn from_bits(bits: u8) -> Result<Self, FlagsError> {
        let unknown = bits & !(Self::SHAPE_BITS | Self::KEYING_BITS);
        if unknown != 0 {
            return Err(FlagsError::UnknownBits(unknown));
        }

        let shape = match bits & Self::SHAPE_BITS {
            0 | Self::BIT_MANY_ROWS => Shape::ManyRows,
            Self::BIT_ONE_ROW => Shape::OneRow,
            Self::BIT_AUTO => Shape::Auto,
            other => return Err(FlagsError::ConflictingShape(other)),
        };

        let keying = match bits & Self::KEYING_BITS {
            Self::BIT_POSITIONAL => Keying::Positional,
            Self::KEYING_BITS => Keying::Both,
            _ => Keying::Keyed,
        };

        Ok(Self { shape, keying })
    }

    #[must_use]
    pub fn bits(self) -> u8 {
        let shape = match self.shape {
            Shape::OneRow => Self::BIT_ONE_ROW,
            Shape::ManyRows => Self::BIT_MANY_ROWS,
            Shape::Auto => Self::BIT_AUTO,
        };
        let keying = match self.keying {
            Keying::Positional => Self::BIT_POSITIONAL,
            Keying::Keyed => Self::BIT_KEYED,
            Keying::Both => Self::KEYING_BITS,
        };
        shape | keying
    }
}

impl TryFrom<u8> for ResultFlags {
    type Error = FlagsError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::from_bits(bits)
    }
}

/// Resolve `Auto` against the size of the first rowset.
#[must_use]
pub fn resolve_shape(shape: Shape, first_rowset_len: usize) -> Shape {
    match shape {
        Shape::Auto if first_rowset_len > 1 => Shape::ManyRows,
        Shape::Auto => Shape::OneRow,
        other => other,
    }
}

/// Apply the shaping policy to the fetched rows of the first rowset.
#[must_use]
pub fn shape_rows(flags: ResultFlags, rows: Vec<Row>) -> Option<QueryResult> {
    match resolve_shape(flags.shape, rows.len()) {
        Shape::ManyRows => Some(QueryResult::Rows(rows)),
        _ => rows.into_iter().next().map(QueryResult::Row),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ColumnSet;
    use crate::types::RowValues;

    fn rows(n: i64) -> Vec<Row> {
        let cols = ColumnSet::new(vec!["n".into()]);
        (0..n)
            .map(|i| Row::new(cols.clone(), vec![RowValues::Int(i)], Keying::Keyed))
            .collect()
    }

    #[test]
    fn auto_boundaries() {
        assert_eq!(resolve_shape(Shape::Auto, 0), Shape::OneRow);
        assert_eq!(resolve_shape(Shape::Auto, 1), Shape::OneRow);
        assert_eq!(resolve_shape(Shape::Auto, 2), Shape::ManyRows);
        assert_eq!(resolve_shape(Shape::OneRow, 5), Shape::OneRow);
        assert_eq!(resolve_shape(Shape::ManyRows, 0), Shape::ManyRows);
    }

    #[test]
    fn many_rows_is_never_none() {
        for n in 0..3 {
            let shaped = shape_rows(ResultFlags::MANY_ROWS, rows(n));
            assert_eq!(shaped.map(|r| r.len()), Some(n as usize));
        }
    }

    #[test]
    fn one_row_takes_the_first() {
        assert!(shape_rows(ResultFlags::ONE_ROW, rows(0)).is_none());
        let first = shape_rows(ResultFlags::ONE_ROW, rows(3)).and_then(QueryResult::into_row);
        assert_eq!(
            first.and_then(|r| r.get("n").cloned()),
            Some(RowValues::Int(0))
        );
    }

    #[test]
    fn auto_switches_on_two_rows() {
        assert!(shape_rows(ResultFlags::AUTO, rows(0)).is_none());
        assert!(matches!(
            shape_rows(ResultFlags::AUTO, rows(1)),
            Some(QueryResult::Row(_))
        ));
        assert!(matches!(
            shape_rows(ResultFlags::AUTO, rows(2)),
            Some(QueryResult::Rows(r)) if r.len() == 2
        ));
    }

    #[test]
    fn legacy_bits_decode() {
        assert_eq!(ResultFlags::from_bits(0), Ok(ResultFlags::default()));
        assert_eq!(ResultFlags::from_bits(1), Ok(ResultFlags::ONE_ROW));
        assert_eq!(
            ResultFlags::from_bits(4 | 8),
            Ok(ResultFlags::new(Shape::Auto, Keying::Positional))
        );
        assert_eq!(
            ResultFlags::from_bits(2 | 8 | 16),
            Ok(ResultFlags::new(Shape::ManyRows, Keying::Both))
        );
    }

    #[test]
    fn legacy_bits_reject_conflicts() {
        assert_eq!(
            ResultFlags::from_bits(1 | 2),
            Err(FlagsError::ConflictingShape(3))
        );
        assert_eq!(ResultFlags::from_bits(32), Err(FlagsError::UnknownBits(32)));
    }
}
