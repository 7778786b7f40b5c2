use juggle_core::Permutation;
use proptest::prelude::*;

/// Builds a permutation from a shuffled arrangement by writing it in cycle
/// notation, so the parser is exercised too.
fn perm_from_order(order: &[usize], cut: &[bool]) -> Permutation {
    let n = order.len();
    let mut spec = String::new();
    let mut current: Vec<String> = Vec::new();
    for (i, &e) in order.iter().enumerate() {
        current.push(e.to_string());
        if cut[i] || i == n - 1 {
            spec.push_str(&format!("({})", current.join(",")));
            current.clear();
        }
    }
    Permutation::parse(n, &spec, false).unwrap()
}

fn arrangement() -> impl Strategy<Value = (Vec<usize>, Vec<bool>)> {
    (1usize..9).prop_flat_map(|n| {
        (
            Just((1..=n).collect::<Vec<_>>()).prop_shuffle(),
            proptest::collection::vec(any::<bool>(), n),
        )
    })
}

proptest! {
    #[test]
    fn double_inverse_is_original((order, cut) in arrangement()) {
        let p = perm_from_order(&order, &cut);
        prop_assert_eq!(p.inverse().inverse(), p.clone());
        prop_assert!(p.then(&p.inverse()).is_identity());
        prop_assert!(p.inverse().then(&p).is_identity());
        for i in 1..=p.size() {
            prop_assert_eq!(p.inverse().target(p.target(i)), i);
        }
    }

    #[test]
    fn cycles_partition_the_domain((order, cut) in arrangement()) {
        let p = perm_from_order(&order, &cut);
        let mut all: Vec<usize> = p.cycles().into_iter().flatten().collect();
        all.sort_unstable();
        prop_assert_eq!(all, (1..=p.size()).collect::<Vec<_>>());
    }

    #[test]
    fn order_returns_to_identity((order, cut) in arrangement()) {
        let p = perm_from_order(&order, &cut);
        let k = p.order() as i64;
        prop_assert!(p.power(k).is_identity());
    }

    #[test]
    fn period_ignores_label_names(
        (order, cut) in arrangement(),
        offset in 1usize..50,
    ) {
        let p = perm_from_order(&order, &cut);
        let labels: Vec<usize> = (0..p.size()).map(|i| i % 2 + 1).collect();
        let renamed: Vec<usize> = labels.iter().map(|l| l + offset).collect();
        let period = Permutation::period(&p, &labels);
        prop_assert!(period >= 1);
        prop_assert_eq!(period, Permutation::period(&p, &renamed));
        // Distinct labels give the full order of the permutation.
        let distinct: Vec<usize> = (1..=p.size()).collect();
        prop_assert_eq!(Permutation::period(&p, &distinct), p.order());
    }
}

#[test]
fn period_changes_when_repetition_changes() {
    let p = Permutation::parse(4, "(1,2,3,4)", false).unwrap();
    assert_eq!(Permutation::period(&p, &[1, 1, 1, 1]), 1);
    assert_eq!(Permutation::period(&p, &[1, 2, 1, 2]), 2);
    assert_eq!(Permutation::period(&p, &[1, 1, 2, 2]), 4);
}
