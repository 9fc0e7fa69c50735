//! Row type - the column values of one stored row

use super::datum::Datum;

/// Values of one row, in column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: Vec<Datum>,
}

impl Row {
    pub fn new(values: Vec<Datum>) -> Self {
        Row { values }
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at column `index`, `None` past the last column
    pub fn get(&self, index: usize) -> Option<&Datum> {
        self.values.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Datum> {
        self.values.iter()
    }

    /// Hand the values to a slot without copying
    pub fn into_values(self) -> Vec<Datum> {
        self.values
    }
}
