use crate::streams::ObservationStream;
use std::io::Error;

/// Finite stream over a fixed list of rows.
pub struct VecStream {
    pub rows: Vec<Vec<f64>>,
    idx: usize,
}

impl VecStream {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows, idx: 0 }
    }
}

impl ObservationStream for VecStream {
    fn dimension(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    fn has_more_observations(&self) -> bool {
        self.idx < self.rows.len()
    }

    fn next_observation(&mut self) -> Option<Vec<f64>> {
        if !self.has_more_observations() {
            return None;
        }
        let row = self.rows[self.idx].clone();
        self.idx += 1;
        Some(row)
    }

    fn restart(&mut self) -> Result<(), Error> {
        self.idx = 0;
        Ok(())
    }
}
