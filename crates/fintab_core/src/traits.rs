use nalgebra::DVector;

/// Decides whether an optimizer should keep stepping.
pub trait OptimizationController {
    /// Called after every optimizer step.
    /// old_point/old_value: best point before the step
    /// new_point/new_value: best point after the step
    /// step_size: pattern step size after the step
    ///
    /// Returns `false` to stop the optimization.
    fn step_taken(
        &mut self,
        old_point: &DVector<f64>,
        old_value: f64,
        new_point: &DVector<f64>,
        new_value: f64,
        step_size: f64,
    ) -> bool;
}
