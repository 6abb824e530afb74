//! Property-based tests for the pool and the machine.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use proptest::prelude::*;
use statepool::{KeyedPool, PoolDescriptor, Pooled, State, StateContext, StateMachine};

#[derive(Default)]
struct Token(u64);

impl Pooled for Token {}

fn token_pool(capacity: usize) -> KeyedPool<Token> {
    let mut pool = KeyedPool::new();
    pool.register("Token", capacity, || Box::new(Token::default()))
        .unwrap();
    pool
}

const KEYS: [&str; 5] = ["n0", "n1", "n2", "n3", "n4"];

/// How deep the chain should grow, and whether the leaf swaps this tick.
struct Plan {
    depth: usize,
    swap: bool,
}

type Cx<'a> = StateContext<'a, (), Plan>;
type Descriptor = PoolDescriptor<dyn State<(), Plan>>;

#[derive(Default)]
struct Node;

impl Pooled for Node {}

impl State<(), Plan> for Node {
    fn init_sub_state(&mut self, cx: &mut Cx<'_>) {
        let next = cx.depth() + 1;
        if next < cx.input().depth {
            cx.set_sub_state_keyed::<Node>(KEYS[next]);
        }
    }

    fn check_switch_states(&mut self, cx: &mut Cx<'_>) {
        if cx.input().swap && cx.depth() + 1 == cx.input().depth {
            cx.switch_state_keyed::<Leaf>("Leaf");
        }
    }
}

#[derive(Default)]
struct Leaf;

impl Pooled for Leaf {}

impl State<(), Plan> for Leaf {
    fn check_switch_states(&mut self, cx: &mut Cx<'_>) {
        if cx.input().swap {
            let depth = cx.depth();
            cx.switch_state_keyed::<Node>(KEYS[depth]);
        }
    }
}

fn chain_machine() -> StateMachine<(), Plan> {
    let mut descriptors: Vec<Descriptor> = KEYS
        .iter()
        .map(|key| Descriptor::new(*key, 1, || -> Box<dyn State<(), Plan>> { Box::new(Node) }))
        .collect();
    descriptors.push(Descriptor::state::<Leaf>(1));
    StateMachine::with_pools(descriptors).unwrap()
}

fn free_counts(machine: &StateMachine<(), Plan>) -> Vec<Option<usize>> {
    let pool = machine.pool().borrow();
    let mut counts: Vec<_> = KEYS.iter().map(|key| pool.free_count(key)).collect();
    counts.push(pool.free_count("Leaf"));
    counts
}

proptest! {
    #[test]
    fn release_then_acquire_returns_same_instance(
        capacity in 0..4usize,
        held in 1..6usize,
        pick in any::<prop::sample::Index>(),
    ) {
        let mut pool = token_pool(capacity);
        let mut values: Vec<Box<Token>> = (0..held)
            .map(|_| pool.acquire("Token").unwrap())
            .collect();

        let released = values.swap_remove(pick.index(held));
        let address = &*released as *const Token;
        pool.release(released, "Token").unwrap();

        let again = pool.acquire("Token").unwrap();
        prop_assert_eq!(&*again as *const Token, address);
    }

    #[test]
    fn factory_runs_only_past_free_count(capacity in 0..6usize, acquires in 0..12usize) {
        let mut pool = token_pool(capacity);
        let created_before = pool.stats("Token").unwrap().created;

        let held: Vec<Box<Token>> = (0..acquires)
            .map(|_| pool.acquire("Token").unwrap())
            .collect();

        let stats = pool.stats("Token").unwrap();
        prop_assert_eq!(stats.created - created_before, acquires.saturating_sub(capacity) as u64);
        prop_assert_eq!(stats.misses, acquires.saturating_sub(capacity) as u64);
        prop_assert_eq!(held.len(), acquires);
    }

    #[test]
    fn unknown_key_never_disturbs_pool(capacity in 0..4usize, key in "[a-z]{1,8}") {
        let mut pool = token_pool(capacity);
        let before = pool.stats("Token");

        prop_assert!(pool.acquire(&key).is_err());
        prop_assert_eq!(pool.stats("Token"), before);
        prop_assert_eq!(pool.len(), 1);
    }

    #[test]
    fn entered_chain_exits_without_leaks(depth in 1..=5usize) {
        let mut machine = chain_machine();
        let before = free_counts(&machine);
        let plan = Plan { depth, swap: false };

        machine.start_keyed::<Node>(KEYS[0], &mut (), &plan).unwrap();
        prop_assert_eq!(machine.depth(), depth);
        prop_assert_eq!(machine.describe_hierarchy(), vec!["Node"; depth].join("/"));

        machine.stop(&mut (), &plan);
        prop_assert!(!machine.is_running());
        prop_assert_eq!(free_counts(&machine), before);
    }

    #[test]
    fn is_in_state_tracks_leaf_type(
        depth in 1..=5usize,
        swaps in prop::collection::vec(any::<bool>(), 0..12),
    ) {
        let mut machine = chain_machine();
        let mut leaf_is_leaf = false;
        machine
            .start_keyed::<Node>(KEYS[0], &mut (), &Plan { depth, swap: false })
            .unwrap();

        for swap in swaps {
            machine.update(&mut (), &Plan { depth, swap });
            if swap {
                leaf_is_leaf = !leaf_is_leaf;
            }

            prop_assert_eq!(machine.depth(), depth);
            prop_assert_eq!(machine.is_in_state::<Leaf>(), leaf_is_leaf);
            prop_assert_eq!(machine.is_in_state::<Node>(), !leaf_is_leaf);
            let leaf = if leaf_is_leaf { "Leaf" } else { "Node" };
            prop_assert_eq!(machine.hierarchy().last(), Some(leaf));
        }

        machine.stop(&mut (), &Plan { depth, swap: false });
        prop_assert_eq!(free_counts(&machine), vec![Some(1); KEYS.len() + 1]);
    }
}
