//! Bookkeeping for a PostgreSQL cursor that does not touch the server.
//!
//! - `CellWalk` tracks the next cell of a buffered result, row-major
//! - `ParamSlots` holds the values bound so far, one per input slot

use crate::db::ClientError;
use crate::db::value::TypedScalar;

/// Position of the next unread cell in `row_count` rows of `width` cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellWalk {
    width: usize,
    row_count: usize,
    row: usize,
    column: usize,
}

impl CellWalk {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    /// Start over at the first cell of a fresh result of `row_count` rows.
    pub fn reset(&mut self, row_count: usize) {
        self.row_count = row_count;
        self.row = 0;
        self.column = 0;
    }

    pub fn eof(&self) -> bool {
        self.width == 0 || self.row >= self.row_count
    }

    /// `(row, column)` of the next unread cell.
    pub fn position(&self) -> Result<(usize, usize), ClientError> {
        if self.eof() {
            return Err(ClientError::new("no more data"));
        }
        Ok((self.row, self.column))
    }

    /// Step past the current cell, wrapping to the next row after the last column.
    pub fn advance(&mut self) {
        self.column += 1;
        if self.column == self.width {
            self.column = 0;
            self.row += 1;
        }
    }
}

/// Values bound into a statement's input slots. Unbound slots are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSlots(Vec<Option<TypedScalar>>);

impl ParamSlots {
    pub fn new(count: usize) -> Self {
        Self(vec![None; count])
    }

    pub fn set(&mut self, slot: usize, value: Option<TypedScalar>) -> Result<(), ClientError> {
        let count = self.0.len();
        let target = self.0.get_mut(slot).ok_or_else(|| {
            ClientError::new(format!("no input slot {} (statement has {})", slot, count))
                .with_variable(format!("${}", slot + 1))
        })?;
        *target = value;
        Ok(())
    }

    pub fn values(&self) -> &[Option<TypedScalar>] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn visit_all(walk: &mut CellWalk) -> Vec<(usize, usize)> {
        let mut seen = Vec::new();
        while let Ok(pos) = walk.position() {
            seen.push(pos);
            walk.advance();
        }
        seen
    }

    #[rstest]
    fn test_walk_wraps_to_next_row() {
        let mut walk = CellWalk::new(2);
        walk.reset(2);
        assert_eq!(visit_all(&mut walk), vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        assert!(walk.eof());
    }

    #[rstest]
    fn test_walk_position_at_eof_is_error() {
        let mut walk = CellWalk::new(3);
        walk.reset(1);
        walk.advance();
        walk.advance();
        assert_eq!(walk.position().unwrap(), (0, 2));
        walk.advance();

        let err = walk.position().unwrap_err();
        assert_eq!(err.message, "no more data");
    }

    #[rstest]
    #[case(0, 5)]
    #[case(2, 0)]
    fn test_walk_empty_is_eof(#[case] width: usize, #[case] rows: usize) {
        let mut walk = CellWalk::new(width);
        walk.reset(rows);
        assert!(walk.eof());
        assert!(walk.position().is_err());
    }

    #[rstest]
    fn test_walk_reset_starts_over() {
        let mut walk = CellWalk::new(1);
        walk.reset(1);
        walk.advance();
        assert!(walk.eof());

        walk.reset(3);
        assert_eq!(walk.position().unwrap(), (0, 0));
    }

    #[rstest]
    fn test_new_walk_has_no_rows() {
        assert!(CellWalk::new(4).eof());
    }

    #[rstest]
    fn test_param_slots_bind_in_place() {
        let mut params = ParamSlots::new(2);
        params.set(1, Some(TypedScalar::Int64(7))).unwrap();
        assert_eq!(params.values(), &[None, Some(TypedScalar::Int64(7))]);

        params.set(1, None).unwrap();
        assert_eq!(params.values(), &[None, None]);
    }

    #[rstest]
    fn test_param_slots_out_of_range() {
        let mut params = ParamSlots::new(2);
        let err = params.set(2, Some(TypedScalar::Int32(1))).unwrap_err();
        assert_eq!(err.variable.as_deref(), Some("$3"));
        assert_eq!(params.values(), &[None, None]);
    }
}
