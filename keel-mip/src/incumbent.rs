//! Incumbent tracking.

use std::sync::Mutex;

/// Best integral solution found so far.
///
/// Guarded by a mutex so node workers can race on improvements; the
/// compare-and-swap inside [`try_improve`](Incumbent::try_improve) keeps
/// the stored pair consistent under concurrent updates.
pub(crate) struct Incumbent {
    best: Mutex<Option<(f64, Vec<f64>)>>,
}

impl Incumbent {
    pub fn new() -> Self {
        Self {
            best: Mutex::new(None),
        }
    }

    /// Install `(value, x)` if it improves on the stored incumbent.
    /// Returns true on improvement.
    pub fn try_improve(&self, value: f64, x: Vec<f64>) -> bool {
        let mut guard = self.best.lock().unwrap_or_else(|e| e.into_inner());
        match &*guard {
            Some((best, _)) if *best <= value => false,
            _ => {
                *guard = Some((value, x));
                true
            }
        }
    }

    /// Current incumbent value; +inf when none exists.
    pub fn value(&self) -> f64 {
        self.best
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|(v, _)| *v)
            .unwrap_or(f64::INFINITY)
    }

    /// Copy of the incumbent pair, if any.
    pub fn snapshot(&self) -> Option<(f64, Vec<f64>)> {
        self.best.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_improvements_are_kept() {
        let incumbent = Incumbent::new();
        assert_eq!(incumbent.value(), f64::INFINITY);

        assert!(incumbent.try_improve(10.0, vec![1.0]));
        assert!(!incumbent.try_improve(10.0, vec![2.0]));
        assert!(!incumbent.try_improve(12.0, vec![3.0]));
        assert!(incumbent.try_improve(7.0, vec![4.0]));

        let (value, x) = incumbent.snapshot().unwrap();
        assert_eq!(value, 7.0);
        assert_eq!(x, vec![4.0]);
    }
}
