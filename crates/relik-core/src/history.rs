//! The session's joint state and its recent past.

/// Current joint configuration plus the three previous solutions.
///
/// The current configuration is the warm start for the next solve; the
/// older entries feed the velocity/acceleration/jerk smoothness terms.
#[derive(Debug, Clone, PartialEq)]
pub struct JointHistory {
    current: Vec<f64>,
    prev: Vec<f64>,
    prev2: Vec<f64>,
    prev3: Vec<f64>,
}

impl JointHistory {
    /// A history that has been sitting still at `state`.
    pub fn new(state: Vec<f64>) -> Self {
        Self {
            prev: state.clone(),
            prev2: state.clone(),
            prev3: state.clone(),
            current: state,
        }
    }

    /// Push a new solution, shifting the window back by one.
    pub fn update(&mut self, solution: Vec<f64>) {
        self.prev3 = std::mem::take(&mut self.prev2);
        self.prev2 = std::mem::take(&mut self.prev);
        self.prev = std::mem::replace(&mut self.current, solution);
    }

    /// Forget all motion and sit still at `state`.
    pub fn reset(&mut self, state: &[f64]) {
        *self = Self::new(state.to_vec());
    }

    pub fn current(&self) -> &[f64] {
        &self.current
    }

    pub fn prev(&self) -> &[f64] {
        &self.prev
    }

    pub fn prev2(&self) -> &[f64] {
        &self.prev2
    }

    pub fn prev3(&self) -> &[f64] {
        &self.prev3
    }

    pub fn dof(&self) -> usize {
        self.current.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_history_is_stationary() {
        let h = JointHistory::new(vec![1.0, 2.0]);
        assert_eq!(h.current(), &[1.0, 2.0]);
        assert_eq!(h.prev(), &[1.0, 2.0]);
        assert_eq!(h.prev2(), &[1.0, 2.0]);
        assert_eq!(h.prev3(), &[1.0, 2.0]);
        assert_eq!(h.dof(), 2);
    }

    #[test]
    fn update_shifts_window() {
        let mut h = JointHistory::new(vec![0.0]);
        h.update(vec![1.0]);
        h.update(vec![2.0]);
        h.update(vec![3.0]);
        h.update(vec![4.0]);
        assert_eq!(h.current(), &[4.0]);
        assert_eq!(h.prev(), &[3.0]);
        assert_eq!(h.prev2(), &[2.0]);
        assert_eq!(h.prev3(), &[1.0]);
    }

    #[test]
    fn reset_discards_motion() {
        let mut h = JointHistory::new(vec![0.0]);
        h.update(vec![1.0]);
        h.reset(&[5.0]);
        assert_eq!(h, JointHistory::new(vec![5.0]));
    }
}
