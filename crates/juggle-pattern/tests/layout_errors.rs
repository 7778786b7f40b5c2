mod common;

use juggle_pattern::{
    Coordinate, Event, Hand, InternalError, PathKind, Pattern, PatternError, Symmetry,
    SymmetryKind, Transition, UserError,
};

#[test]
fn untouched_hand_is_named() {
    let mut p = Pattern::new(1, 1);
    p.add_symmetry(Symmetry::delay(1, 1, "", 1.0).unwrap());
    p.add_event(
        Event::new(Coordinate::new(10.0, 0.0, 0.0), 0.0, 1, Hand::Right)
            .with(Transition::catch(1))
            .with(Transition::throw(1, PathKind::Toss, "")),
    );
    assert_eq!(
        p.layout().unwrap_err(),
        PatternError::User(UserError::HandNeverTouched {
            juggler: 1,
            hand: Hand::Left
        })
    );
    assert!(p.needs_layout());
}

#[test]
fn untouched_path_is_named() {
    let mut p = Pattern::new(1, 2);
    p.add_symmetry(Symmetry::delay(1, 2, "", 1.0).unwrap());
    p.add_event(
        Event::new(Coordinate::new(10.0, 0.0, 0.0), 0.0, 1, Hand::Right)
            .with(Transition::holding(1)),
    );
    p.add_event(Event::new(Coordinate::new(-10.0, 0.0, 0.0), 0.5, 1, Hand::Left));
    assert_eq!(
        p.layout().unwrap_err(),
        PatternError::User(UserError::PathNeverTouched { path: 2 })
    );
}

#[test]
fn successive_throws_are_rejected() {
    let mut p = Pattern::new(1, 1);
    p.add_symmetry(Symmetry::delay(1, 1, "", 1.0).unwrap());
    p.add_event(
        Event::new(Coordinate::new(10.0, 0.0, 0.0), 0.0, 1, Hand::Right)
            .with(Transition::throw(1, PathKind::Toss, "")),
    );
    p.add_event(
        Event::new(Coordinate::new(-10.0, 0.0, 0.0), 0.5, 1, Hand::Left)
            .with(Transition::throw(1, PathKind::Toss, "")),
    );
    assert_eq!(
        p.layout().unwrap_err(),
        PatternError::User(UserError::SuccessiveThrows { path: 1 })
    );
}

#[test]
fn catch_without_throw_is_rejected() {
    let mut p = Pattern::new(1, 1);
    p.add_symmetry(Symmetry::delay(1, 1, "", 1.0).unwrap());
    p.add_event(
        Event::new(Coordinate::new(10.0, 0.0, 0.0), 0.0, 1, Hand::Right)
            .with(Transition::catch(1)),
    );
    p.add_event(Event::new(Coordinate::new(-10.0, 0.0, 0.0), 0.5, 1, Hand::Left));
    assert_eq!(
        p.layout().unwrap_err(),
        PatternError::User(UserError::SuccessiveCatches { path: 1 })
    );
}

#[test]
fn held_prop_cannot_change_hands() {
    let mut p = Pattern::new(1, 1);
    p.add_symmetry(Symmetry::delay(1, 1, "", 1.0).unwrap());
    p.add_event(
        Event::new(Coordinate::new(10.0, 0.0, 0.0), 0.0, 1, Hand::Right)
            .with(Transition::holding(1)),
    );
    p.add_event(
        Event::new(Coordinate::new(-10.0, 0.0, 0.0), 0.5, 1, Hand::Left)
            .with(Transition::holding(1)),
    );
    assert_eq!(
        p.layout().unwrap_err(),
        PatternError::User(UserError::HandChangedWhileHeld { path: 1 })
    );
}

#[test]
fn out_of_range_references_are_rejected() {
    let mut p = common::cascade();
    p.add_event(Event::new(Coordinate::ZERO, 0.2, 2, Hand::Left));
    assert_eq!(
        p.layout().unwrap_err(),
        PatternError::User(UserError::JugglerOutOfRange {
            juggler: 2,
            jugglers: 1
        })
    );
    assert!(matches!(
        common::cascade().path_coordinate(4, 0.0),
        Err(PatternError::User(UserError::PathOutOfRange { path: 4, .. }))
    ));
}

#[test]
fn exactly_one_delay_is_required() {
    let mut p = common::cascade();
    p.add_symmetry(Symmetry::delay(1, 3, "", 2.0).unwrap());
    assert_eq!(
        p.layout().unwrap_err(),
        PatternError::User(UserError::DelaySymmetryCount { count: 2 })
    );
}

#[test]
fn colliding_images_are_rejected() {
    // A switch that maps the juggler onto itself with hands exchanged puts
    // the mirror of every right-hand event on the left hand at the same time.
    let mut p = common::single_prop(1.0);
    p.add_symmetry(Symmetry::parse(SymmetryKind::Switch, 1, 1, "(1,1*)", "", None).unwrap());
    assert!(matches!(
        p.layout().unwrap_err(),
        PatternError::User(UserError::EventCollision { juggler: 1, .. })
    ));
}

#[test]
fn bounce_from_below_the_floor_is_a_user_error() {
    let mut p = common::single_prop(1.0);
    p.remove_event(0);
    p.add_event(
        Event::new(Coordinate::new(10.0, 0.0, 0.0), 0.0, 1, Hand::Right)
            .with(Transition::catch(1))
            .with(Transition::throw(1, PathKind::Bounce, "bounceplane=150")),
    );
    assert!(matches!(
        p.layout().unwrap_err(),
        PatternError::User(UserError::Flight { path: 1, .. })
    ));
}

#[test]
fn queries_before_layout_fail_fast() {
    let p = common::cascade();
    assert_eq!(
        p.path_coordinate(1, 0.0).unwrap_err(),
        PatternError::Internal(InternalError::NotLaidOut)
    );
    assert!(p.juggler_pose(1, 0.0).is_err());
}
