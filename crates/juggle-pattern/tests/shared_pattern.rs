mod common;

use std::sync::Arc;
use std::thread;

use juggle_pattern::{Coordinate, Event, Hand, InternalError, LayoutState, PatternError};
use juggle_pattern::SharedPattern;

#[test]
fn readers_sample_while_clean() {
    let shared = Arc::new(SharedPattern::new(common::cascade()));
    assert!(shared.needs_layout());
    shared.relayout().unwrap();
    assert_eq!(shared.state(), LayoutState::Clean);

    let expected = shared.read().path_coordinate(1, 0.3).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let pattern = shared.read();
                (0..100)
                    .map(|_| pattern.path_coordinate(1, 0.3).unwrap())
                    .all(|c| c == expected)
            })
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap());
    }
}

#[test]
fn edits_mark_dirty_until_relayout() {
    let shared = SharedPattern::new(common::cascade());
    shared.relayout().unwrap();
    let index = shared.edit(|p| p.add_event(Event::new(Coordinate::ZERO, 0.3, 1, Hand::Left)));
    assert_eq!(index, 2);
    assert!(shared.needs_layout());
    assert_eq!(
        shared.read().path_coordinate(1, 0.0).unwrap_err(),
        PatternError::Internal(InternalError::NotLaidOut)
    );

    shared.edit(|p| p.remove_event(index));
    shared.relayout().unwrap();
    assert!(!shared.needs_layout());
    assert_eq!(shared.into_inner().events().len(), 2);
}
