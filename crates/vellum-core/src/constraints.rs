//! Constraint resolver: how a child follows its parent through a resize.
//!
//! Pure function of the child's local box, its per-axis constraints and the
//! parent's old and new size.

use crate::model::{AxisConstraint, Bounds, Constraints, Size};

/// New local box for a child after its parent went from `old_parent` to
/// `new_parent`.
pub fn resolve_constraints(
    child: Bounds,
    constraints: Constraints,
    old_parent: Size,
    new_parent: Size,
) -> Bounds {
    let (x, width) = resolve_axis(
        child.x,
        child.width,
        constraints.horizontal,
        old_parent.width,
        new_parent.width,
    );
    let (y, height) = resolve_axis(
        child.y,
        child.height,
        constraints.vertical,
        old_parent.height,
        new_parent.height,
    );
    Bounds::new(x, y, width, height)
}

fn resolve_axis(start: f64, extent: f64, rule: AxisConstraint, old: f64, new: f64) -> (f64, f64) {
    let delta = new - old;
    match rule {
        AxisConstraint::Min => (start, extent),
        AxisConstraint::Max => (start + delta, extent),
        AxisConstraint::Stretch => (start, (extent + delta).max(0.0)),
        AxisConstraint::Center => (start + delta / 2.0, extent),
        AxisConstraint::Scale => {
            if old.abs() < f64::EPSILON {
                (start, extent)
            } else {
                let ratio = new / old;
                (start * ratio, extent * ratio)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHILD: Bounds = Bounds::new(10.0, 20.0, 30.0, 40.0);
    const OLD: Size = Size::new(100.0, 100.0);
    const NEW: Size = Size::new(200.0, 150.0);

    fn with(h: AxisConstraint, v: AxisConstraint) -> Bounds {
        resolve_constraints(
            CHILD,
            Constraints {
                horizontal: h,
                vertical: v,
            },
            OLD,
            NEW,
        )
    }

    #[test]
    fn min_keeps_everything() {
        assert_eq!(with(AxisConstraint::Min, AxisConstraint::Min), CHILD);
    }

    #[test]
    fn max_tracks_far_edge() {
        let b = with(AxisConstraint::Max, AxisConstraint::Max);
        assert_eq!(b, Bounds::new(110.0, 70.0, 30.0, 40.0));
    }

    #[test]
    fn stretch_grows_extent() {
        let b = with(AxisConstraint::Stretch, AxisConstraint::Stretch);
        assert_eq!(b, Bounds::new(10.0, 20.0, 130.0, 90.0));
    }

    #[test]
    fn center_moves_half() {
        let b = with(AxisConstraint::Center, AxisConstraint::Center);
        assert_eq!(b, Bounds::new(60.0, 45.0, 30.0, 40.0));
    }

    #[test]
    fn scale_is_proportional() {
        let b = with(AxisConstraint::Scale, AxisConstraint::Scale);
        assert_eq!(b, Bounds::new(20.0, 30.0, 60.0, 60.0));
    }

    #[test]
    fn stretch_never_goes_negative() {
        let b = resolve_constraints(
            CHILD,
            Constraints {
                horizontal: AxisConstraint::Stretch,
                vertical: AxisConstraint::Min,
            },
            OLD,
            Size::new(10.0, 100.0),
        );
        assert_eq!(b.width, 0.0);
    }
}
