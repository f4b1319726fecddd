//! Dense linear solve for the Newton steps of the logistic backend.

/// Solves `A x = b` in place with Gaussian elimination and partial pivoting.
///
/// `a` is row-major `n x n`. Returns `None` when a pivot falls below `1e-12`
/// (numerically singular system).
#[allow(clippy::needless_range_loop)]
pub fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    assert_eq!(a.len(), n, "matrix must be square with the rhs length");

    for col in 0..n {
        let (max_row, max_val) = (col..n)
            .map(|row| (row, a[row][col].abs()))
            .fold((col, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });

        if max_val < 1e-12 {
            return None;
        }

        if max_row != col {
            a.swap(col, max_row);
            b.swap(col, max_row);
        }

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for j in col..n {
                a[row][j] -= factor * a[col][j];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| a[i][j] * x[j]).sum();
        x[i] = (b[i] - tail) / a[i][i];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_diagonal() {
        let a = vec![
            vec![2.0, 0.0, 0.0],
            vec![0.0, 4.0, 0.0],
            vec![0.0, 0.0, 5.0],
        ];
        let x = solve_linear_system(a, vec![2.0, 8.0, 20.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
        assert!((x[2] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_solve_requires_pivoting() {
        // Zero on the leading diagonal forces a row swap.
        let a = vec![vec![0.0, 1.0], vec![1.0, 1.0]];
        let x = solve_linear_system(a, vec![3.0, 5.0]).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_singular_returns_none() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(solve_linear_system(a, vec![1.0, 2.0]).is_none());
    }
}
