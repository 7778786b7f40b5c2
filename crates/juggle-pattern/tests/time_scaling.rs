mod common;

use approx::assert_abs_diff_eq;
use juggle_pattern::{Coordinate, Position};

#[test]
fn scaling_stretches_times_only() {
    let mut p = common::cascade();
    p.add_position(Position::new(Coordinate::new(5.0, 0.0, 100.0), 30.0, 0.25, 1));
    let before = p.events().to_vec();
    p.scale_time(2.0).unwrap();

    for (a, b) in before.iter().zip(p.events()) {
        assert_abs_diff_eq!(b.t, a.t * 2.0);
        assert_eq!(b.local, a.local);
        assert_eq!(b.transitions, a.transitions);
    }
    assert_abs_diff_eq!(p.positions()[0].t, 0.5);
    assert_eq!(p.positions()[0].coordinate, Coordinate::new(5.0, 0.0, 100.0));
    assert_eq!(p.positions()[0].angle, 30.0);
    assert_abs_diff_eq!(p.symmetries()[0].delay_time().unwrap(), 1.2);
    // The switch-delay keeps taking half of the delay.
    assert_eq!(p.symmetries()[1].delay_time(), None);

    p.layout().unwrap();
    assert_abs_diff_eq!(p.loop_end().unwrap(), 1.2);
    assert!(p.is_in_hand(3, 1.0).unwrap());
    assert!(!p.is_in_hand(3, 0.4).unwrap());
}

#[test]
fn scaling_invalidates_layout() {
    let mut p = common::cascade();
    p.layout().unwrap();
    p.scale_time(0.5).unwrap();
    assert!(p.needs_layout());
    p.layout().unwrap();
    assert_abs_diff_eq!(p.loop_end().unwrap(), 0.3);
}
