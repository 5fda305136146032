use lazy_lanes::resolve::{producers, resolve};
use lazy_lanes::{BinaryOp, Buffer, ChainId, EvalOptions, Expression, OpDescriptor, Rhs, VarId};

fn buffers(count: usize) -> Vec<Buffer<f64>> {
    (0..count).map(|i| Buffer::filled(8, i as f64 + 1.0)).collect()
}

#[test]
fn canonical_log_links_every_product() {
    let l = buffers(5);
    let expr = Expression::with_options(EvalOptions::builtin());
    let [l0, l1, l2, l3, l4] = expr.vars([&l[0], &l[1], &l[2], &l[3], &l[4]]);
    let _root = l0 * l1 + l2 * l3 + l4 * l1 + l2 * l3 + l4 * l1;

    let resolved = expr.resolved();
    assert_eq!(resolved.len(), 9);
    assert_eq!(
        producers(&resolved),
        vec![None, None, Some(1), None, Some(3), None, Some(5), None, Some(7)]
    );
    let claimed: Vec<usize> = resolved
        .iter()
        .filter(|d| d.claimed)
        .map(|d| d.sequence_id)
        .collect();
    assert_eq!(claimed, vec![1, 3, 5, 7]);
}

#[test]
fn continued_subchain_links_to_its_last_descriptor() {
    let l = buffers(4);
    let expr = Expression::with_options(EvalOptions::builtin());
    let [a, c, d, e] = expr.vars([&l[0], &l[1], &l[2], &l[3]]);
    let _root = a + (c * d + e);

    let resolved = expr.resolved();
    assert_eq!(producers(&resolved), vec![None, None, Some(1)]);
    assert!(!resolved[0].claimed);
}

#[test]
fn raw_operands_never_link() {
    let l = buffers(3);
    let expr = Expression::with_options(EvalOptions::builtin());
    let [l0, l1, l2] = expr.vars([&l[0], &l[1], &l[2]]);
    let _root = l0 * l1 + l2 + l0;

    let mut log = expr.descriptors();
    assert_eq!(resolve(&mut log), 0);
    assert!(log.iter().all(|d| d.producer.is_none() && !d.claimed));
}

#[test]
fn resolution_is_repeatable() {
    let l = buffers(5);
    let expr = Expression::with_options(EvalOptions::builtin());
    let [l0, l1, l2, l3, l4] = expr.vars([&l[0], &l[1], &l[2], &l[3], &l[4]]);
    let _root = l0 * l1 + l2 + l3 + l4 * l1 + l2 * l3 + l4 * l1;

    let mut log = expr.descriptors();
    let first_links = resolve(&mut log);
    let first = log.clone();
    let second_links = resolve(&mut log);
    assert_eq!(first_links, second_links);
    assert_eq!(first, log);
    assert_eq!(log, expr.resolved());
}

#[test]
fn nearest_unclaimed_producer_wins() {
    let c0 = ChainId(0);
    let c1 = ChainId(1);
    let mut log = vec![
        OpDescriptor::new(0, c1, VarId(1), true, Rhs::Var(VarId(2)), BinaryOp::Mul),
        OpDescriptor::new(1, c1, VarId(1), false, Rhs::Var(VarId(3)), BinaryOp::Add),
        OpDescriptor::new(2, c0, VarId(0), true, Rhs::Chain(c1), BinaryOp::Sub),
        OpDescriptor::new(3, c0, VarId(0), false, Rhs::Chain(ChainId(7)), BinaryOp::Div),
    ];
    assert_eq!(resolve(&mut log), 1);
    assert_eq!(producers(&log), vec![None, None, Some(1), None]);
}
