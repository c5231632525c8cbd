//! Branching-variable selection and integrality checks.

/// Distance from `v` to the nearest integer.
fn fractionality(v: f64) -> f64 {
    (v - v.round()).abs()
}

/// True if every integer variable is integral at `x` within `tol`.
pub(crate) fn is_integral(x: &[f64], integer_vars: &[usize], tol: f64) -> bool {
    integer_vars.iter().all(|&i| fractionality(x[i]) <= tol)
}

/// Most-fractional branching: the integer variable whose relaxation value
/// is farthest from an integer, with the lowest index winning ties.
/// Returns `None` when `x` is integral.
pub(crate) fn select(x: &[f64], integer_vars: &[usize], tol: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for &i in integer_vars {
        let frac = fractionality(x[i]);
        if frac <= tol {
            continue;
        }
        let better = match best {
            None => true,
            Some((best_i, best_frac)) => {
                frac > best_frac || (frac == best_frac && i < best_i)
            }
        };
        if better {
            best = Some((i, frac));
        }
    }
    best.map(|(i, _)| i)
}

/// Snap integer variables to the nearest integer, leaving continuous
/// variables untouched.
pub(crate) fn round_integers(x: &[f64], integer_vars: &[usize]) -> Vec<f64> {
    let mut rounded = x.to_vec();
    for &i in integer_vars {
        rounded[i] = rounded[i].round();
    }
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_most_fractional_variable() {
        let x = [1.1, 2.5, 3.4];
        assert_eq!(select(&x, &[0, 1, 2], 1e-6), Some(1));
    }

    #[test]
    fn ties_break_to_the_lowest_index() {
        let x = [0.5, 1.5, 2.5];
        assert_eq!(select(&x, &[0, 1, 2], 1e-6), Some(0));
        assert_eq!(select(&x, &[2, 1], 1e-6), Some(1));
    }

    #[test]
    fn integral_points_are_recognized() {
        let x = [2.0, 2.9999997, 1.5];
        assert!(is_integral(&x, &[0, 1], 1e-6));
        assert!(!is_integral(&x, &[0, 2], 1e-6));
        assert_eq!(select(&x, &[0, 1], 1e-6), None);
    }

    #[test]
    fn rounding_only_touches_integer_variables() {
        let x = [1.0000002, 0.7];
        assert_eq!(round_integers(&x, &[0]), vec![1.0, 0.7]);
    }
}
