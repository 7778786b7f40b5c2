#![allow(dead_code)]

use juggle_pattern::{
    Coordinate, Event, Hand, PathKind, Pattern, Symmetry, SymmetryKind, Transition,
};

/// Three-ball cascade: the right hand throws from x=10 at t=0 and catches at
/// x=25 at t=0.4; the left hand mirrors it half a delay (0.3) later.
pub fn cascade() -> Pattern {
    let mut p = Pattern::new(1, 3);
    p.add_symmetry(Symmetry::delay(1, 3, "(1,3,2)", 0.6).unwrap());
    p.add_symmetry(
        Symmetry::parse(SymmetryKind::SwitchDelay, 1, 3, "(1,1*)", "(1,2,3)", None).unwrap(),
    );
    p.add_event(
        Event::new(Coordinate::new(10.0, 0.0, 0.0), 0.0, 1, Hand::Right)
            .with(Transition::throw(1, PathKind::Toss, "")),
    );
    p.add_event(
        Event::new(Coordinate::new(25.0, 0.0, 0.0), 0.4, 1, Hand::Right)
            .with(Transition::catch(3)),
    );
    p
}

/// One prop thrown straight up by the right hand every `delay` seconds and
/// caught where it left. The left hand rests.
pub fn single_prop(delay: f64) -> Pattern {
    let mut p = Pattern::new(1, 1);
    p.add_symmetry(Symmetry::delay(1, 1, "", delay).unwrap());
    p.add_event(
        Event::new(Coordinate::new(10.0, 0.0, 0.0), 0.0, 1, Hand::Right)
            .with(Transition::catch(1))
            .with(Transition::throw(1, PathKind::Toss, "")),
    );
    p.add_event(Event::new(Coordinate::new(-10.0, 0.0, 0.0), 0.0, 1, Hand::Left));
    p
}

/// One prop held forever by the right hand at local x = `x`.
pub fn held_prop(x: f64) -> Pattern {
    let mut p = Pattern::new(1, 1);
    p.add_symmetry(Symmetry::delay(1, 1, "", 1.0).unwrap());
    p.add_event(
        Event::new(Coordinate::new(x, 0.0, 0.0), 0.0, 1, Hand::Right)
            .with(Transition::holding(1)),
    );
    p.add_event(Event::new(Coordinate::new(-10.0, 0.0, 0.0), 0.5, 1, Hand::Left));
    p
}

/// One prop shuttled between the hands with soft catches: the right hand
/// throws from x=10 at t=0, the left hand soft-catches it at x=-25 at t=0.3
/// and throws it back half a delay after the right hand threw.
pub fn soft_catch_shuttle() -> Pattern {
    let mut p = Pattern::new(1, 1);
    p.add_symmetry(Symmetry::delay(1, 1, "", 1.0).unwrap());
    p.add_symmetry(
        Symmetry::parse(SymmetryKind::SwitchDelay, 1, 1, "(1,1*)", "", None).unwrap(),
    );
    p.add_event(
        Event::new(Coordinate::new(10.0, 0.0, 0.0), 0.0, 1, Hand::Right)
            .with(Transition::throw(1, PathKind::Toss, "")),
    );
    p.add_event(
        Event::new(Coordinate::new(-25.0, 0.0, 0.0), 0.3, 1, Hand::Left)
            .with(Transition::soft_catch(1)),
    );
    p
}

/// Two props that swap labels every delay: the right hand catches and
/// rethrows path 1 at t=0, so path 2 is only ever reached as the delay image
/// of path 1. Each flight lasts two delays.
pub fn relabelled_pair() -> Pattern {
    let mut p = Pattern::new(1, 2);
    p.add_symmetry(Symmetry::delay(1, 2, "(1,2)", 1.0).unwrap());
    p.add_event(
        Event::new(Coordinate::new(10.0, 0.0, 0.0), 0.0, 1, Hand::Right)
            .with(Transition::catch(1))
            .with(Transition::throw(1, PathKind::Toss, "")),
    );
    p.add_event(Event::new(Coordinate::new(-10.0, 0.0, 0.0), 0.5, 1, Hand::Left));
    p
}

/// Two jugglers in the default circle, each holding one prop in the right
/// hand; a switch maps juggler 1 and path 1 onto juggler 2 and path 2.
pub fn two_holders() -> Pattern {
    let mut p = Pattern::new(2, 2);
    p.add_symmetry(Symmetry::delay(2, 2, "", 1.0).unwrap());
    p.add_symmetry(Symmetry::parse(SymmetryKind::Switch, 2, 2, "(1,2)", "(1,2)", None).unwrap());
    p.add_event(
        Event::new(Coordinate::new(10.0, 0.0, 0.0), 0.0, 1, Hand::Right)
            .with(Transition::holding(1)),
    );
    p.add_event(Event::new(Coordinate::new(-10.0, 0.0, 0.0), 0.5, 1, Hand::Left));
    p
}
