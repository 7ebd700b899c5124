use criterion::{criterion_group, criterion_main, Criterion};
use k0_core::arena::NodeArena;
use k0_core::node::K0Node;

fn tick_chain_of_ten(c: &mut Criterion) {
    let arena = NodeArena::new();
    let mut ids = Vec::new();
    for _ in 0..10 {
        ids.push(arena.insert(K0Node::new(1000)));
    }
    for window in ids.windows(2) {
        let (prev, next) = (window[0], window[1]);
        arena.borrow_mut()[next.0].add_inbound_connection(k0_core::node::K0Connection::new(prev, 0.3, 0));
    }
    arena.borrow_mut()[ids[0].0].set_external_stimulus(0.5);

    c.bench_function("tick_chain_of_ten", |b| {
        b.iter(|| {
            for &id in &ids {
                arena.calculate_next_state(id).unwrap();
            }
            for &id in &ids {
                arena.commit_next_state(id);
            }
        })
    });
}

criterion_group!(benches, tick_chain_of_ten);
criterion_main!(benches);
