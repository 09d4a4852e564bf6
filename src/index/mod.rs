//! Exact nearest-neighbour index over squared Euclidean distance
//!
//! Vectors are stored back to back in one flat buffer and positions are
//! assigned in insertion order, so position `i` always names the `i`-th
//! inserted vector. The index only grows.


use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("Vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// One search hit: squared L2 distance to the query and the stored position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub distance: f32,
    pub position: usize,
}

#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(dimension: usize, vectors: usize) -> Self {
        Self {
            dimension,
            data: Vec::with_capacity(dimension.saturating_mul(vectors)),
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len().checked_div(self.dimension).unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a vector and return its position.
    #[inline]
    pub fn insert(&mut self, vector: &[f32]) -> Result<usize, IndexError> {
        self.check_dimension(vector)?;
        let position = self.len();
        self.data.extend_from_slice(vector);
        Ok(position)
    }

    /// Return up to `k` stored vectors closest to `query`, nearest first.
    /// Ties are broken by position. An empty index or `k == 0` yields an
    /// empty result.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        self.check_dimension(query)?;
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, stored)| Neighbor {
                distance: squared_l2(query, stored),
                position,
            })
            .collect();

        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k, compare_neighbors);
            neighbors.truncate(k);
        }
        neighbors.sort_unstable_by(compare_neighbors);

        Ok(neighbors)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() == self.dimension && self.dimension > 0 {
            Ok(())
        } else {
            Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            })
        }
    }
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then(a.position.cmp(&b.position))
}

#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
