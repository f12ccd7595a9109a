/// Emitted once per finished sweep cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepProgress {
    /// Cells finished so far, including this one
    pub completed: usize,
    pub total: usize,
    pub pulse_duration: f64,
    pub rate: f64,
    /// Whether a matching power was found for this cell
    pub solved: bool,
    pub elapsed_wall_s: f64,
}

impl SweepProgress {
    pub fn fraction_complete(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn is_finished(&self) -> bool {
        self.completed >= self.total
    }
}
