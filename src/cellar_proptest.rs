#![cfg(test)]

// Property tests for CellarTable kept inside the crate so they can reach
// the structural checks without feature gates.

use crate::cellar::{CellarTable, Placement};
use crate::config::TableConfig;
use hashbrown::HashMap;
use proptest::prelude::*;
use std::collections::BTreeSet;

type Table = CellarTable<Box<[u8]>, u32>;

// Pool-indexed operations so shrinking moves towards earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, u32),
    Increment(usize),
    Find(usize),
    Contains(Vec<u8>),
    SetLoadFactor(f32),
    Grow,
    Clear,
    Iterate,
}

fn arb_key() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        "[a-z_]{0,6}".prop_map(String::into_bytes),
        proptest::collection::vec(any::<u8>(), 0..6),
    ]
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Vec<u8>>, Vec<OpI>)> {
    proptest::collection::vec(arb_key(), 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<u32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            4 => idx.clone().prop_map(OpI::Increment),
            3 => idx.clone().prop_map(OpI::Find),
            2 => prop_oneof![contains_pool, arb_key()].prop_map(OpI::Contains),
            1 => prop_oneof![
                0.05f32..0.99,
                Just(0.0f32),
                Just(1.0f32),
                Just(-0.25f32),
                Just(1.5f32),
                Just(f32::NAN),
            ]
            .prop_map(OpI::SetLoadFactor),
            1 => Just(OpI::Grow),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_scenario(
    mut sut: Table,
    pool: &[Vec<u8>],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Vec<u8>, u32> = HashMap::new();
    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = &pool[i];
                let already = model.contains_key(k);
                let mut default_calls = 0;
                let (key, value, placement) = sut.find_or_create(k, || {
                    default_calls += 1;
                    0
                });
                prop_assert_eq!(&**key, &k[..]);
                prop_assert_eq!(placement == Placement::Found, already);
                prop_assert_eq!(default_calls, usize::from(!already));
                *value = v;
                model.insert(k.clone(), v);
            }
            OpI::Increment(i) => {
                let k = &pool[i];
                let (_, value, _) = sut.find_or_create(k, || 0);
                *value = value.wrapping_add(1);
                let m = model.entry(k.clone()).or_insert(0);
                *m = m.wrapping_add(1);
            }
            OpI::Find(i) => {
                let k = &pool[i];
                let found = sut.find(k).map(|(_, &v)| v);
                prop_assert_eq!(found, model.get(k).copied());
            }
            OpI::Contains(k) => {
                prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
            }
            OpI::SetLoadFactor(lf) => {
                let before = sut.capacity();
                sut.set_load_factor(lf);
                if lf > 0.0 && lf < 1.0 {
                    prop_assert_eq!(sut.capacity(), before);
                    prop_assert_eq!(sut.load_factor(), lf);
                } else {
                    prop_assert_eq!(sut.capacity(), before * 2);
                }
            }
            OpI::Grow => {
                let before = sut.capacity();
                sut.grow();
                prop_assert_eq!(sut.capacity(), before * 2);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
            }
            OpI::Iterate => {
                let s: BTreeSet<(Vec<u8>, u32)> =
                    sut.iter().map(|(k, &v)| (k.to_vec(), v)).collect();
                let m: BTreeSet<(Vec<u8>, u32)> =
                    model.iter().map(|(k, &v)| (k.clone(), v)).collect();
                prop_assert_eq!(s, m);
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.check_integrity(), Ok(()));
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.len() <= sut.capacity());
    }
    Ok(())
}

// Property: state-machine equivalence against hashbrown::HashMap.
// Invariants exercised across random operation sequences:
// - `find_or_create` reports Found exactly for keys already present and
//   runs `default` only on creation.
// - `find`/`contains_key` parity, including keys with embedded zeros.
// - `iter` yields each live entry exactly once.
// - Chains stay acyclic and reach every entry after every op, across
//   growth, clears and load-factor resets.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(Table::with_config(TableConfig::STRING_POOL), &pool, ops)?;
    }
}

// Property: same invariants starting from a table with one to four slots
// and a high load factor, so almost every insertion collides and the
// cellar and the probing fallbacks are both exercised.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_tiny_table(
        (pool, ops) in arb_scenario(),
        capacity in 1usize..=4,
        load_factor in 0.5f32..0.99,
        cellar_ratio in 0.01f32..0.6,
    ) {
        let config = TableConfig::FREQUENCY_MAP
            .with_initial_capacity(capacity)
            .with_load_factor(load_factor)
            .with_cellar_ratio(cellar_ratio);
        run_scenario(Table::with_config(config), &pool, ops)?;
    }
}

// Property: inserting N distinct keys into a table of capacity C never
// panics and keeps every key retrievable, for any C >= 1.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_growth_keeps_every_key(n in 1usize..600, capacity in 1usize..=16) {
        let mut sut = Table::with_config(TableConfig::FREQUENCY_MAP.with_initial_capacity(capacity));
        for i in 0..n {
            let key = format!("key{i}");
            let (_, v, placement) = sut.find_or_create(key.as_bytes(), || 0);
            prop_assert!(placement.created());
            *v = i as u32;
        }
        prop_assert_eq!(sut.len(), n);
        prop_assert!(sut.len() <= sut.stats().threshold + 1);
        for i in 0..n {
            let key = format!("key{i}");
            prop_assert_eq!(sut.find(key.as_bytes()).map(|(_, &v)| v), Some(i as u32));
        }
        prop_assert_eq!(sut.check_integrity(), Ok(()));
    }
}
