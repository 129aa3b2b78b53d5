// THEORY:
// The decision threshold is the only state that outlives a frame. It starts at a
// configured value and moves only on explicit control events from the operator:
// raise it when vacant slots are read as occupied, lower it when occupied slots
// are read as vacant. Lowering is clamped at a floor so the classifier can never be
// pushed into calling every slot vacant. Raising is unbounded.
//
// The state is an explicit value owned by the orchestrator rather than a global,
// and `increase` / `decrease` are its only mutators.

/// A discrete operator input for the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Raise the threshold by one step.
    Increase,
    /// Lower the threshold by one step, not below the floor.
    Decrease,
    /// End the session after the current frame.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionThreshold {
    value: f64,
    floor: f64,
}

impl DecisionThreshold {
    pub fn new(initial: f64, floor: f64) -> Self {
        Self {
            value: initial,
            floor,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    pub fn increase(&mut self, step: f64) -> f64 {
        self.value += step;
        self.value
    }

    /// Lowers by `step`, clamped at `floor`. `floor` becomes the retained floor.
    pub fn decrease(&mut self, step: f64, floor: f64) -> f64 {
        self.floor = floor;
        self.value = (self.value - step).max(floor);
        self.value
    }

    /// Applies a threshold event with the given step. `Stop` leaves it unchanged.
    pub fn apply(&mut self, signal: ControlSignal, step: f64) -> f64 {
        match signal {
            ControlSignal::Increase => self.increase(step),
            ControlSignal::Decrease => self.decrease(step, self.floor),
            ControlSignal::Stop => self.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_decreases_stop_at_the_floor() {
        let mut threshold = DecisionThreshold::new(120.0, 50.0);
        for _ in 0..20 {
            threshold.apply(ControlSignal::Decrease, 5.0);
        }
        assert_eq!(threshold.value(), 50.0);
    }

    #[test]
    fn floor_holds_for_any_start_and_event_count() {
        for start in [50.0, 51.0, 77.5, 120.0, 400.0] {
            for events in 0..100 {
                let mut threshold = DecisionThreshold::new(start, 50.0);
                for _ in 0..events {
                    threshold.decrease(5.0, 50.0);
                }
                assert!(threshold.value() >= 50.0);
            }
        }
    }

    #[test]
    fn increase_is_unbounded_and_stop_is_inert() {
        let mut threshold = DecisionThreshold::new(250.0, 50.0);
        threshold.apply(ControlSignal::Increase, 5.0);
        threshold.apply(ControlSignal::Increase, 5.0);
        assert_eq!(threshold.value(), 260.0);
        assert_eq!(threshold.apply(ControlSignal::Stop, 5.0), 260.0);
    }

    #[test]
    fn decrease_then_increase_round_trips_above_the_floor() {
        let mut threshold = DecisionThreshold::new(120.0, 50.0);
        threshold.decrease(5.0, 50.0);
        threshold.increase(5.0);
        assert_eq!(threshold.value(), 120.0);
    }
}
