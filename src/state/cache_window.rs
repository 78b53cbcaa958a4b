//! Sliding-window planning for the pre-warm cache.
//!
//! The planner decides which folder indices should be resident around the
//! current image, and whether the window needs recomputing at all. Replanning
//! is throttled by a movement threshold so that stepping one image at a time
//! does not replan on every move.

use std::collections::HashSet;

/// Indices that should be resident around `center`.
///
/// Offsets in `[-radius, radius]` wrap modulo `total`. When the folder is
/// smaller than the window the whole folder is covered, without duplicates.
pub fn plan_window(center: usize, total: usize, radius: usize) -> HashSet<usize> {
    let mut window = HashSet::new();
    if total == 0 {
        return window;
    }
    let total_i = total as i64;
    for offset in -(radius as i64)..=(radius as i64) {
        let index = (center as i64 + offset).rem_euclid(total_i) as usize;
        window.insert(index);
    }
    window
}

/// Whether the window around `current` needs recomputing.
pub fn should_replan(current: usize, last_center: Option<usize>, threshold: usize) -> bool {
    match last_center {
        None => true,
        Some(last) => current.abs_diff(last) >= threshold,
    }
}

/// Remembers the last planned center so consecutive small steps reuse the
/// existing window.
#[derive(Debug)]
pub struct CacheWindow {
    radius: usize,
    replan_threshold: usize,
    last_planned_center: Option<usize>,
}

impl CacheWindow {
    pub fn new(radius: usize, replan_threshold: usize) -> Self {
        Self {
            radius,
            replan_threshold,
            last_planned_center: None,
        }
    }

    pub fn should_replan(&self, current: usize) -> bool {
        should_replan(current, self.last_planned_center, self.replan_threshold)
    }

    /// Plans the window around `current` and records it as the new center.
    pub fn replan(&mut self, current: usize, total: usize) -> HashSet<usize> {
        self.last_planned_center = Some(current);
        plan_window(current, total, self.radius)
    }

    /// Forgets the planned center, forcing the next `should_replan` to pass.
    pub fn reset(&mut self) {
        self.last_planned_center = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_size_is_min_of_total_and_full_span() {
        assert_eq!(plan_window(50, 1000, 25).len(), 51);
        assert_eq!(plan_window(1, 3, 25).len(), 3);
        assert_eq!(plan_window(0, 1, 25).len(), 1);
        assert_eq!(plan_window(4, 10, 0).len(), 1);
    }

    #[test]
    fn window_indices_stay_in_range() {
        for center in 0..7 {
            let window = plan_window(center, 7, 3);
            assert_eq!(window.len(), 7);
            assert!(window.iter().all(|&i| i < 7));
        }
    }

    #[test]
    fn window_wraps_at_the_start() {
        let window = plan_window(1, 100, 3);
        let expected: HashSet<usize> = [98, 99, 0, 1, 2, 3, 4].into_iter().collect();
        assert_eq!(window, expected);
    }

    #[test]
    fn window_wraps_at_the_end() {
        let window = plan_window(99, 100, 2);
        let expected: HashSet<usize> = [97, 98, 99, 0, 1].into_iter().collect();
        assert_eq!(window, expected);
    }

    #[test]
    fn empty_folder_plans_nothing() {
        assert!(plan_window(0, 0, 25).is_empty());
    }

    #[test]
    fn replans_when_center_is_unset() {
        assert!(should_replan(0, None, 10));
    }

    #[test]
    fn replans_only_at_the_threshold() {
        assert!(!should_replan(14, Some(10), 10));
        assert!(!should_replan(19, Some(10), 10));
        assert!(should_replan(20, Some(10), 10));
        assert!(should_replan(0, Some(10), 10));
    }

    #[test]
    fn sequential_steps_inside_the_band_do_not_replan() {
        let mut window = CacheWindow::new(25, 10);
        assert!(window.should_replan(5));
        window.replan(5, 200);

        for current in 6..15 {
            assert!(!window.should_replan(current), "replanned at {}", current);
        }
        assert!(window.should_replan(15));
    }

    #[test]
    fn reset_forces_the_next_replan() {
        let mut window = CacheWindow::new(25, 10);
        window.replan(5, 200);
        assert!(!window.should_replan(6));
        window.reset();
        assert!(window.should_replan(6));
    }
}
