//! Dense linear-algebra services shared by the solvers.
//!
//! Everything here is a thin wrapper over `nalgebra` factorizations. The
//! wrappers exist so the solvers report singularity as a recoverable
//! condition instead of panicking on a bad factorization.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Factorization failures surfaced to the solvers.
#[derive(Error, Debug)]
pub enum FactorizationError {
    /// The matrix is singular to working precision.
    #[error("matrix of dimension {dim} is singular to working precision")]
    Singular {
        /// Matrix dimension.
        dim: usize,
    },

    /// The matrix is not positive definite.
    #[error("matrix of dimension {dim} is not positive definite")]
    NotPositiveDefinite {
        /// Matrix dimension.
        dim: usize,
    },
}

/// An LU factorization of a square matrix, kept around for repeated solves.
pub struct DenseLu {
    lu: nalgebra::LU<f64, nalgebra::Dyn, nalgebra::Dyn>,
    dim: usize,
}

impl DenseLu {
    /// Factor a square matrix. Fails if it is singular.
    pub fn factor(matrix: DMatrix<f64>) -> Result<Self, FactorizationError> {
        let dim = matrix.nrows();
        let lu = matrix.lu();
        if !lu.is_invertible() {
            return Err(FactorizationError::Singular { dim });
        }
        Ok(Self { lu, dim })
    }

    /// Solve `A x = b` against the stored factorization.
    pub fn solve(&self, b: &DVector<f64>) -> Result<DVector<f64>, FactorizationError> {
        self.lu
            .solve(b)
            .ok_or(FactorizationError::Singular { dim: self.dim })
    }
}

/// Invert a square matrix, reporting singularity instead of panicking.
pub fn invert(matrix: DMatrix<f64>) -> Result<DMatrix<f64>, FactorizationError> {
    let dim = matrix.nrows();
    matrix
        .try_inverse()
        .ok_or(FactorizationError::Singular { dim })
}

/// Solve a symmetric positive definite system via Cholesky.
pub fn spd_solve(
    matrix: DMatrix<f64>,
    b: &DVector<f64>,
) -> Result<DVector<f64>, FactorizationError> {
    let dim = matrix.nrows();
    let chol = matrix
        .cholesky()
        .ok_or(FactorizationError::NotPositiveDefinite { dim })?;
    Ok(chol.solve(b))
}

/// Numerical rank via column-pivoted QR.
pub fn rank(matrix: &DMatrix<f64>, eps: f64) -> usize {
    if matrix.nrows() == 0 || matrix.ncols() == 0 {
        return 0;
    }
    matrix.rank(eps)
}

/// An orthonormal basis for the null space of `A` (columns of the result).
///
/// Works for wide matrices: the null space is read off the eigenvectors of
/// `A^T A` whose eigenvalues vanish to within `eps` of the largest one.
/// With zero rows the whole space is returned (the identity).
pub fn null_space(matrix: &DMatrix<f64>, eps: f64) -> DMatrix<f64> {
    let n = matrix.ncols();
    if matrix.nrows() == 0 {
        return DMatrix::identity(n, n);
    }

    let gram = matrix.transpose() * matrix;
    let eigen = gram.symmetric_eigen();
    let max_eig = eigen.eigenvalues.iter().cloned().fold(0.0_f64, f64::max);
    let threshold = eps * max_eig.max(1.0);

    let kept: Vec<usize> = (0..n)
        .filter(|&i| eigen.eigenvalues[i].abs() <= threshold)
        .collect();

    let mut basis = DMatrix::zeros(n, kept.len());
    for (col, &i) in kept.iter().enumerate() {
        basis.set_column(col, &eigen.eigenvectors.column(i));
    }
    basis
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{dmatrix, dvector};

    #[test]
    fn lu_solves_a_small_system() {
        let a = dmatrix![2.0, 1.0; 1.0, 3.0];
        let lu = DenseLu::factor(a).unwrap();
        let x = lu.solve(&dvector![3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn singular_matrix_is_reported() {
        let a = dmatrix![1.0, 2.0; 2.0, 4.0];
        assert!(matches!(
            DenseLu::factor(a),
            Err(FactorizationError::Singular { dim: 2 })
        ));
    }

    #[test]
    fn spd_solve_matches_direct_inverse() {
        let a = dmatrix![4.0, 1.0; 1.0, 3.0];
        let x = spd_solve(a.clone(), &dvector![1.0, 2.0]).unwrap();
        let expect = a.try_inverse().unwrap() * dvector![1.0, 2.0];
        assert!((x - expect).norm() < 1e-12);
    }

    #[test]
    fn indefinite_matrix_fails_cholesky() {
        let a = dmatrix![0.0, 1.0; 1.0, 0.0];
        assert!(matches!(
            spd_solve(a, &dvector![1.0, 1.0]),
            Err(FactorizationError::NotPositiveDefinite { dim: 2 })
        ));
    }

    #[test]
    fn rank_of_rank_deficient_matrix() {
        let a = dmatrix![1.0, 2.0; 2.0, 4.0];
        assert_eq!(rank(&a, 1e-10), 1);
        assert_eq!(rank(&DMatrix::<f64>::zeros(0, 3), 1e-10), 0);
    }

    #[test]
    fn null_space_of_wide_matrix() {
        // A single row in R^3: the null space is two-dimensional and
        // orthogonal to the row.
        let a = dmatrix![1.0, 1.0, 0.0];
        let z = null_space(&a, 1e-10);
        assert_eq!(z.ncols(), 2);
        for col in z.column_iter() {
            assert!((a.clone() * col).norm() < 1e-8);
            assert!((col.norm() - 1.0).abs() < 1e-8);
        }
    }

    #[test]
    fn null_space_with_no_rows_is_identity() {
        let a = DMatrix::<f64>::zeros(0, 2);
        let z = null_space(&a, 1e-10);
        assert_eq!(z, DMatrix::identity(2, 2));
    }
}
