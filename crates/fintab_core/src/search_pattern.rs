//! Normalized search directions for pattern-search optimizers.

use crate::error::GeometryError;
use nalgebra::DVector;

/// The `dim` unit coordinate directions.
pub fn square(dim: usize) -> Result<Vec<DVector<f64>>, GeometryError> {
    if dim == 0 {
        return Err(GeometryError::InvalidDimension(dim));
    }
    Ok((0..dim)
        .map(|i| DVector::from_fn(dim, |j, _| if i == j { 1.0 } else { 0.0 }))
        .collect())
}

/// Returns `dim` points that, together with the origin, form a regular
/// simplex with unit edge length.
///
/// The simplex is first built centered on the origin with all `dim + 1`
/// vertices on the unit sphere: each vertex picks its next coordinate so that
/// its dot product with every later vertex is `-1/dim`. The extra vertex is
/// then moved onto the origin and the rest are rescaled to unit edges, which
/// leaves every coordinate non-negative.
pub fn regular_simplex(dim: usize) -> Result<Vec<DVector<f64>>, GeometryError> {
    if dim == 0 {
        return Err(GeometryError::InvalidDimension(dim));
    }

    let dot = -1.0 / dim as f64;
    let mut coordinates = vec![0.0; dim];
    let mut vertices = Vec::with_capacity(dim + 1);

    for i in 0..dim {
        let used: f64 = coordinates[..i].iter().map(|c| c * c).sum();
        coordinates[i] = (1.0 - used).max(0.0).sqrt();
        vertices.push(DVector::from_column_slice(&coordinates));

        // Coordinate i shared by every later vertex.
        coordinates[i] = (dot - used) / coordinates[i];
    }

    // The remaining vertex takes every shared coordinate.
    let anchor = DVector::from_column_slice(&coordinates);

    let edge = (&vertices[0] - &anchor).norm();
    Ok(vertices
        .into_iter()
        .map(|vertex| (vertex - &anchor) / edge)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn square_returns_unit_basis() {
        let pattern = square(3).expect("pattern");
        assert_eq!(pattern.len(), 3);
        for (i, direction) in pattern.iter().enumerate() {
            assert_eq!(direction.norm(), 1.0);
            assert_eq!(direction[i], 1.0);
        }
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert_eq!(square(0).expect_err("dim 0"), GeometryError::InvalidDimension(0));
        assert_eq!(
            regular_simplex(0).expect_err("dim 0"),
            GeometryError::InvalidDimension(0)
        );
    }

    #[test]
    fn one_dimensional_simplex_is_unit_step() {
        let simplex = regular_simplex(1).expect("simplex");
        assert_eq!(simplex.len(), 1);
        assert!((simplex[0][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn two_dimensional_simplex_is_equilateral_triangle() {
        let simplex = regular_simplex(2).expect("simplex");
        let expected = [[3f64.sqrt() / 2.0, 0.5], [0.0, 1.0]];
        for (vertex, want) in simplex.iter().zip(expected.iter()) {
            assert!((vertex[0] - want[0]).abs() < 1e-12);
            assert!((vertex[1] - want[1]).abs() < 1e-12);
        }
    }

    proptest! {
        #[test]
        fn simplex_edges_have_unit_length(dim in 1usize..12) {
            let simplex = regular_simplex(dim).expect("simplex");
            prop_assert_eq!(simplex.len(), dim);
            for (i, a) in simplex.iter().enumerate() {
                prop_assert_eq!(a.len(), dim);
                prop_assert!((a.norm() - 1.0).abs() < 1e-9);
                for b in simplex.iter().skip(i + 1) {
                    prop_assert!(((a - b).norm() - 1.0).abs() < 1e-9);
                }
            }
        }

        #[test]
        fn simplex_has_no_coordinate_below_origin(dim in 1usize..12) {
            let simplex = regular_simplex(dim).expect("simplex");
            for axis in 0..dim {
                let min = simplex.iter().map(|p| p[axis]).fold(f64::INFINITY, f64::min);
                prop_assert!(min >= -1e-9);
            }
        }
    }
}
