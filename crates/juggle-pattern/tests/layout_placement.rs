mod common;

use approx::assert_abs_diff_eq;
use juggle_pattern::{Coordinate, Hand, Pattern, Position};

fn assert_close(a: Coordinate, b: Coordinate, eps: f64) {
    assert!(
        (a - b).length() <= eps,
        "coordinates differ: got {a:?}, expected {b:?}"
    );
}

fn laid_out(mut p: Pattern) -> Pattern {
    p.layout().unwrap();
    p
}

#[test]
fn jugglers_stand_on_a_circle_facing_its_center() {
    let p = laid_out(common::two_holders());
    assert_close(
        p.juggler_position(1, 0.3).unwrap(),
        Coordinate::new(70.0, 0.0, 100.0),
        1e-9,
    );
    assert_close(
        p.juggler_position(2, 0.3).unwrap(),
        Coordinate::new(-70.0, 0.0, 100.0),
        1e-9,
    );
    assert_abs_diff_eq!(p.juggler_angle(1, 0.3).unwrap(), 90.0, epsilon = 1e-9);
    assert_abs_diff_eq!(p.juggler_angle(2, 0.3).unwrap(), 270.0, epsilon = 1e-9);
}

#[test]
fn switch_places_the_image_in_the_other_jugglers_frame() {
    let p = laid_out(common::two_holders());
    // Local (10, 30) in front of juggler 1, who faces -x.
    let first = Coordinate::new(40.0, 10.0, 100.0);
    let second = Coordinate::new(-40.0, -10.0, 100.0);
    for t in [0.0, 0.5, 2.75] {
        assert!(p.is_in_hand(1, t).unwrap() && p.is_in_hand(2, t).unwrap());
        assert_close(p.path_coordinate(1, t).unwrap(), first, 1e-9);
        assert_close(p.path_coordinate(2, t).unwrap(), second, 1e-9);
        assert_close(p.hand_coordinate(2, Hand::Right, t).unwrap(), second, 1e-9);
    }
    assert_close(
        p.hand_coordinate(2, Hand::Left, 0.5).unwrap(),
        Coordinate::new(-40.0, 10.0, 100.0),
        1e-9,
    );
    assert!(p.juggler_pose(2, 0.25).is_ok());
}

#[test]
fn declared_position_moves_the_frame() {
    let mut p = common::held_prop(15.0);
    p.add_position(Position::new(Coordinate::new(50.0, 20.0, 90.0), 90.0, 0.0, 1));
    let p = laid_out(p);
    assert_close(
        p.juggler_position(1, 0.7).unwrap(),
        Coordinate::new(50.0, 20.0, 90.0),
        1e-9,
    );
    assert_abs_diff_eq!(p.juggler_angle(1, 0.7).unwrap(), 90.0, epsilon = 1e-9);
    assert_close(
        p.path_coordinate(1, 0.5).unwrap(),
        Coordinate::new(20.0, 35.0, 90.0),
        1e-9,
    );
    assert_close(
        p.hand_coordinate(1, Hand::Left, 0.5).unwrap(),
        Coordinate::new(20.0, 10.0, 90.0),
        1e-9,
    );
}

#[test]
fn events_follow_a_walking_juggler() {
    let mut p = common::held_prop(15.0);
    p.add_position(Position::new(Coordinate::new(0.0, 0.0, 100.0), 0.0, 0.0, 1));
    p.add_position(Position::new(Coordinate::new(40.0, 0.0, 100.0), 0.0, 0.5, 1));
    let p = laid_out(p);

    assert_close(
        p.juggler_position(1, 0.5).unwrap(),
        Coordinate::new(40.0, 0.0, 100.0),
        1e-9,
    );
    assert_close(
        p.juggler_position(1, 1.0).unwrap(),
        Coordinate::new(0.0, 0.0, 100.0),
        1e-9,
    );
    // The left-hand event at t=0.5 is placed where the juggler is then.
    assert_close(
        p.hand_coordinate(1, Hand::Left, 0.5).unwrap(),
        Coordinate::new(30.0, 30.0, 100.0),
        1e-9,
    );
    assert_close(
        p.path_coordinate(1, 0.0).unwrap(),
        Coordinate::new(15.0, 30.0, 100.0),
        1e-9,
    );
    let hi = p.juggler_max(1).unwrap();
    assert!(hi.x >= 40.0);
}
