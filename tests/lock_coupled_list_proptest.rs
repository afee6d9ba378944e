use coupled::LockCoupledList;
use proptest::prelude::*;

/// Where `insert(value, pos)` lands in a plain `Vec`.
fn model_insert(model: &mut Vec<u32>, value: u32, pos: usize) {
    let idx = pos.max(1).min(model.len());
    model.insert(idx, value);
}

fn position() -> impl Strategy<Value = usize> {
    prop_oneof![
        0..8usize,
        0..200usize,
        Just(usize::MAX),
    ]
}

proptest! {
    #[test]
    fn test_list_matches_vec_model(ops in proptest::collection::vec((any::<u32>(), position()), 1..200)) {
        let list = LockCoupledList::new();
        let mut model = Vec::new();

        for (value, pos) in ops {
            list.insert(value, pos);
            model_insert(&mut model, value, pos);
            prop_assert_eq!(list.len(), model.len());
        }

        prop_assert_eq!(list.to_vec(), model.clone());
        prop_assert_eq!(list.into_vec(), model);
    }

    #[test]
    fn test_beyond_tail_is_append(len in 1..50usize, extra in 0..1_000usize) {
        let list: LockCoupledList<usize> = (0..len).collect();
        list.insert(usize::MAX, len + extra);
        let values = list.to_vec();
        prop_assert_eq!(values.len(), len + 1);
        prop_assert_eq!(values[len], usize::MAX);
    }

    #[test]
    fn test_head_never_moves(first in any::<u32>(), rest in proptest::collection::vec((any::<u32>(), position()), 0..100)) {
        let list = LockCoupledList::new();
        list.insert(first, 0);
        for (value, pos) in rest {
            list.insert(value, pos);
        }
        prop_assert_eq!(list.to_vec()[0], first);
    }
}
