//! Body posture of a juggler: fixed landmarks plus a two-link arm per hand.

use juggle_core::Coordinate;
use nalgebra::Vector3;

use crate::error::InternalError;
use crate::event::Hand;
use crate::layout::rotate;

/// Shoulder to elbow.
pub const UPPER_LENGTH: f64 = 41.0;
/// Elbow to hand.
pub const LOWER_LENGTH: f64 = 40.0;

pub const SHOULDER_HALF_WIDTH: f64 = 23.0;
pub const SHOULDER_HEIGHT: f64 = 40.0;
pub const WAIST_HALF_WIDTH: f64 = 17.0;
pub const WAIST_HEIGHT: f64 = -5.0;
pub const HEAD_HALF_WIDTH: f64 = 10.0;
pub const HEAD_HEIGHT: f64 = 26.0;
pub const NECK_HEIGHT: f64 = 5.0;

/// One arm, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmPose {
    pub shoulder: Coordinate,
    pub elbow: Coordinate,
    pub hand: Coordinate,
}

/// World-space landmarks of one juggler at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JugglerPose {
    pub left: ArmPose,
    pub right: ArmPose,
    pub left_waist: Coordinate,
    pub right_waist: Coordinate,
    /// Bottom corners of the head box, left then right.
    pub head_bottom: [Coordinate; 2],
    /// Top corners of the head box, left then right.
    pub head_top: [Coordinate; 2],
}

impl JugglerPose {
    #[must_use]
    pub fn arm(&self, hand: Hand) -> &ArmPose {
        match hand {
            Hand::Left => &self.left,
            Hand::Right => &self.right,
        }
    }
}

/// Local offset of a body landmark; left is `-x`.
fn landmark(hand: Hand, half_width: f64, height: f64) -> Coordinate {
    let x = match hand {
        Hand::Left => -half_width,
        Hand::Right => half_width,
    };
    Coordinate::new(x, 0.0, height)
}

/// Extent of the body around the juggler reference point, as offsets to add
/// to a bounding box of positions. Horizontal extents cover every facing.
#[must_use]
pub fn body_extent() -> (Coordinate, Coordinate) {
    let reach = SHOULDER_HALF_WIDTH.max(WAIST_HALF_WIDTH);
    let top = SHOULDER_HEIGHT + NECK_HEIGHT + HEAD_HEIGHT;
    (
        Coordinate::new(-reach, -reach, WAIST_HEIGHT),
        Coordinate::new(reach, reach, top),
    )
}

/// Solve the pose of `juggler` standing at `position` facing `angle` degrees
/// with its hands at `left` and `right` (world coordinates).
pub fn solve_pose(
    juggler: usize,
    position: Coordinate,
    angle: f64,
    left: Coordinate,
    right: Coordinate,
) -> Result<JugglerPose, InternalError> {
    if !position.is_finite() || !angle.is_finite() {
        return Err(InternalError::NonFinite {
            what: "juggler position",
        });
    }
    let place = |local: Coordinate| position + rotate(local, angle);
    let outward = |hand: Hand| rotate(landmark(hand, 1.0, 0.0), angle);

    let arm = |hand: Hand, target: Coordinate| -> Result<ArmPose, InternalError> {
        let shoulder = place(landmark(hand, SHOULDER_HALF_WIDTH, SHOULDER_HEIGHT));
        let elbow = solve_elbow(shoulder, target, outward(hand)).ok_or_else(|| {
            InternalError::UnreachableHand {
                juggler,
                hand,
                distance: shoulder.distance(target),
            }
        })?;
        Ok(ArmPose {
            shoulder,
            elbow,
            hand: target,
        })
    };

    let head_base = SHOULDER_HEIGHT + NECK_HEIGHT;
    Ok(JugglerPose {
        left: arm(Hand::Left, left)?,
        right: arm(Hand::Right, right)?,
        left_waist: place(landmark(Hand::Left, WAIST_HALF_WIDTH, WAIST_HEIGHT)),
        right_waist: place(landmark(Hand::Right, WAIST_HALF_WIDTH, WAIST_HEIGHT)),
        head_bottom: [
            place(landmark(Hand::Left, HEAD_HALF_WIDTH, head_base)),
            place(landmark(Hand::Right, HEAD_HALF_WIDTH, head_base)),
        ],
        head_top: [
            place(landmark(Hand::Left, HEAD_HALF_WIDTH, head_base + HEAD_HEIGHT)),
            place(landmark(Hand::Right, HEAD_HALF_WIDTH, head_base + HEAD_HEIGHT)),
        ],
    })
}

/// Elbow of a two-link arm from `shoulder` to `hand`, bent down and away from
/// the body. `None` when the hand is out of reach or any input is not finite.
fn solve_elbow(
    shoulder: Coordinate,
    hand: Coordinate,
    outward: Coordinate,
) -> Option<Coordinate> {
    let s = Vector3::from(shoulder);
    let reach = Vector3::from(hand) - s;
    let d = reach.norm();
    let (longest, shortest) = (
        UPPER_LENGTH + LOWER_LENGTH,
        (UPPER_LENGTH - LOWER_LENGTH).abs(),
    );
    if !d.is_finite() || d > longest || d < shortest {
        return None;
    }
    let u = reach / d;

    // Law of cosines for the angle at the shoulder.
    let cos_a = ((UPPER_LENGTH * UPPER_LENGTH + d * d - LOWER_LENGTH * LOWER_LENGTH)
        / (2.0 * UPPER_LENGTH * d))
        .clamp(-1.0, 1.0);
    let sin_a = (1.0 - cos_a * cos_a).sqrt();

    let bend = [
        Vector3::from(outward) - Vector3::z(),
        -Vector3::z(),
        Vector3::from(outward),
    ]
    .into_iter()
    .map(|hint| hint - u * hint.dot(&u))
    .find(|w| w.norm() > 1e-9)?
    .normalize();

    let elbow = s + (u * cos_a + bend * sin_a) * UPPER_LENGTH;
    let elbow = Coordinate::from(elbow);
    elbow.is_finite().then_some(elbow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rest_hands() -> (Coordinate, Coordinate) {
        (
            Coordinate::new(-25.0, 30.0, 100.0),
            Coordinate::new(25.0, 30.0, 100.0),
        )
    }

    #[test]
    fn arm_segments_have_fixed_lengths() {
        let (left, right) = rest_hands();
        let pose = solve_pose(1, Coordinate::new(0.0, 0.0, 100.0), 0.0, left, right).unwrap();
        for arm in [pose.left, pose.right] {
            assert_abs_diff_eq!(arm.shoulder.distance(arm.elbow), UPPER_LENGTH, epsilon = 1e-9);
            assert_abs_diff_eq!(arm.elbow.distance(arm.hand), LOWER_LENGTH, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(pose.left.shoulder.x, -SHOULDER_HALF_WIDTH, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.left.shoulder.z, 140.0, epsilon = 1e-9);
    }

    #[test]
    fn elbows_bend_outward_and_down() {
        let (left, right) = rest_hands();
        let pose = solve_pose(1, Coordinate::new(0.0, 0.0, 100.0), 0.0, left, right).unwrap();
        let mid = |a: &ArmPose| a.shoulder.lerp(a.hand, 0.5);
        assert!(pose.left.elbow.x < mid(&pose.left).x);
        assert!(pose.right.elbow.x > mid(&pose.right).x);
        assert!(pose.right.elbow.z < mid(&pose.right).z);
    }

    #[test]
    fn landmarks_turn_with_the_juggler() {
        let position = Coordinate::new(0.0, 0.0, 100.0);
        let left = position + rotate(Coordinate::new(-25.0, 30.0, 0.0), 90.0);
        let right = position + rotate(Coordinate::new(25.0, 30.0, 0.0), 90.0);
        let pose = solve_pose(1, position, 90.0, left, right).unwrap();
        assert_abs_diff_eq!(pose.right_waist.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.right_waist.y, WAIST_HALF_WIDTH, epsilon = 1e-9);
    }

    #[test]
    fn out_of_reach_hand_is_an_error() {
        let (left, _) = rest_hands();
        let far = Coordinate::new(300.0, 0.0, 100.0);
        let err = solve_pose(1, Coordinate::new(0.0, 0.0, 100.0), 0.0, left, far).unwrap_err();
        assert!(matches!(
            err,
            InternalError::UnreachableHand {
                juggler: 1,
                hand: Hand::Right,
                ..
            }
        ));
    }

    #[test]
    fn nan_hand_is_unreachable() {
        let (left, _) = rest_hands();
        let nan = Coordinate::new(f64::NAN, 0.0, 0.0);
        let err = solve_pose(2, Coordinate::new(0.0, 0.0, 100.0), 0.0, left, nan).unwrap_err();
        assert!(matches!(err, InternalError::UnreachableHand { juggler: 2, .. }));
    }

    #[test]
    fn body_extent_covers_head() {
        let (lo, hi) = body_extent();
        assert_eq!(lo.z, WAIST_HEIGHT);
        assert_eq!(hi.z, SHOULDER_HEIGHT + NECK_HEIGHT + HEAD_HEIGHT);
        assert_eq!(hi.x, SHOULDER_HALF_WIDTH);
    }
}
