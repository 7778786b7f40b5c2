mod common;

use juggle_pattern::{Hand, JmlNode, PathKind, Pattern, Prop, SymmetryKind, TransitionKind};

const SHOWER_YAML: &str = r#"
tag: jml
children:
  - tag: pattern
    children:
      - tag: title
        text: Two-person feed
      - tag: prop
        attributes: { type: ball }
      - tag: prop
        attributes: { type: club, mod: "color=red" }
      - tag: setup
        attributes: { jugglers: 2, paths: 2, props: "1,2" }
      - tag: symmetry
        attributes: { type: delay, pperm: "(1,2)", delay: 1.5 }
      - tag: symmetry
        attributes: { type: switch, jperm: "(1,2)", pperm: "" }
      - tag: event
        attributes: { x: 10, y: 0, z: 0, t: 0, hand: "1:right" }
        children:
          - tag: throw
            attributes: { path: 1, type: bounce, mod: "bounces=2" }
      - tag: event
        attributes: { x: -20.5, t: 0.75, hand: "2:left" }
        children:
          - tag: catch
            attributes: { path: 2 }
          - tag: holding
            attributes: { path: 1 }
      - tag: position
        attributes: { x: 0, y: -100, z: 100, t: 0, angle: 90, juggler: 2 }
      - tag: lights
        attributes: { on: true }
"#;

fn reparse(p: &Pattern) -> Pattern {
    let json = p.to_document().to_json_string().unwrap();
    Pattern::from_document(&JmlNode::from_json_str(&json).unwrap()).unwrap()
}

#[test]
fn yaml_document_populates_the_pattern() {
    let doc = JmlNode::from_yaml_str(SHOWER_YAML).unwrap();
    let p = Pattern::from_document(&doc).unwrap();

    assert_eq!(p.title(), Some("Two-person feed"));
    assert_eq!(p.number_of_jugglers(), 2);
    assert_eq!(p.number_of_paths(), 2);
    assert_eq!(p.props()[1].kind, "club");
    assert_eq!(p.props()[1].modifier.as_deref(), Some("color=red"));
    assert_eq!(p.prop_assignments(), vec![1, 2]);
    assert_eq!(p.symmetries()[1].kind(), SymmetryKind::Switch);
    assert_eq!(p.symmetries()[0].delay_time(), Some(1.5));

    let throw = &p.events()[0].transitions[0];
    assert_eq!(throw.kind, TransitionKind::Throw);
    assert_eq!(throw.throw_type, PathKind::Bounce);
    assert_eq!(throw.modifier, "bounces=2");
    assert!(p.is_bounce_pattern());

    let second = &p.events()[1];
    assert_eq!((second.juggler, second.hand), (2, Hand::Left));
    assert_eq!(second.local.x, -20.5);
    assert_eq!(second.transitions[1].kind, TransitionKind::Holding);
    assert_eq!(p.positions()[0].angle, 90.0);
}

#[test]
fn round_trip_preserves_declarations() {
    let p = Pattern::from_document(&JmlNode::from_yaml_str(SHOWER_YAML).unwrap()).unwrap();
    let again = reparse(&p);
    assert_eq!(again.title(), p.title());
    assert_eq!(again.props(), p.props());
    assert_eq!(again.prop_assignments(), p.prop_assignments());
    assert_eq!(again.symmetries(), p.symmetries());
    assert_eq!(again.events(), p.events());
    assert_eq!(again.positions(), p.positions());
}

#[test]
fn laid_out_pattern_writes_only_masters() {
    let mut p = common::cascade();
    p.add_prop(Prop::default());
    p.layout().unwrap();
    let doc = p.to_document();
    assert_eq!(doc.children_tagged("event").count(), 2);

    let mut again = reparse(&p);
    assert_eq!(again.events(), p.events());
    again.layout().unwrap();
    assert_eq!(
        again.path_coordinate(2, 0.2).unwrap(),
        p.path_coordinate(2, 0.2).unwrap()
    );
}

#[test]
fn missing_event_time_is_reported() {
    let doc = JmlNode::new("pattern")
        .child(JmlNode::new("setup").attr("paths", 1))
        .child(JmlNode::new("event").attr("hand", "left"));
    let err = Pattern::from_document(&doc).unwrap_err();
    assert!(err.is_user());
    assert!(err.to_string().contains("\"t\""), "{err}");
}
