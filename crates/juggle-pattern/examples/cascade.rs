use std::path::PathBuf;

use juggle_pattern::{Hand, JmlNode, Pattern};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| workspace_root().join("fixtures/cascade.yaml"));
    let text = std::fs::read_to_string(&path).expect("read pattern document");
    let root = JmlNode::from_yaml_str(&text).expect("parse pattern document");
    let mut pattern = Pattern::from_document(&root).expect("build pattern");
    pattern.layout().expect("lay out pattern");

    let (start, end) = (pattern.loop_start().unwrap(), pattern.loop_end().unwrap());
    println!(
        "{}: loop [{start}, {end}), period {}",
        pattern.title().unwrap_or("untitled"),
        pattern.period().unwrap()
    );
    for k in 0..12 {
        let t = start + (end - start) * f64::from(k) / 12.0;
        print!("t={t:.3}");
        for p in 1..=pattern.number_of_paths() {
            let c = pattern.path_coordinate(p, t).unwrap();
            let held = if pattern.is_in_hand(p, t).unwrap() { "*" } else { " " };
            print!("  {p}{held}({:6.1},{:6.1},{:6.1})", c.x, c.y, c.z);
        }
        let r = pattern.hand_coordinate(1, Hand::Right, t).unwrap();
        println!("  R({:6.1},{:6.1})", r.x, r.z);
    }
}
