use anyhow::{ensure, Context, Result};
use lazy_lanes::{Buffer, Element, EvalOptions, Expression, Remainder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Not a multiple of any supported lane width, so the scalar tail is always exercised.
pub const LEN: usize = 1003;

fn filled<T: Element>(len: usize, value: f64) -> Buffer<T> {
    Buffer::filled(len, T::from_f64(value))
}

fn inputs<T: Element, const K: usize>(len: usize, values: [f64; K]) -> [Buffer<T>; K] {
    values.map(|value| filled(len, value))
}

fn random<T: Element>(rng: &mut StdRng, len: usize) -> Buffer<T> {
    (0..len)
        .map(|_| T::from_f64(rng.gen_range(0.5..2.0)))
        .collect()
}

fn builtin<'a, T: Element>() -> Expression<'a, T> {
    Expression::with_options(EvalOptions::builtin())
}

fn ensure_all<T: Element>(out: &[T], expected: f64) -> Result<()> {
    for (i, value) in out.iter().enumerate() {
        ensure!(
            value.to_f64() == expected,
            "{}: element {i} is {:?}, expected {expected}",
            T::NAME,
            value
        );
    }
    Ok(())
}

fn ensure_close<T: Element>(actual: &[T], expected: &[T]) -> Result<()> {
    ensure!(actual.len() == expected.len(), "length differs");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        let (a, e) = (a.to_f64(), e.to_f64());
        let tol = 1e-5 * e.abs().max(1.0);
        ensure!((a - e).abs() <= tol, "element {i}: lazy {a} vs eager {e}");
    }
    Ok(())
}

pub fn mul_add_over_constants<T: Element>() -> Result<()> {
    let [a, b, c] = inputs::<T, 3>(LEN, [2.0, 3.0, 4.0]);
    let expr = builtin();
    let [x, y, z] = expr.vars([&a, &b, &c]);
    let out = (x * y + z).eval()?;
    ensure!(out.len() == LEN);
    ensure_all(&out, 10.0)
}

pub fn repeated_operand_sums<T: Element>() -> Result<()> {
    let [a, b] = inputs::<T, 2>(LEN, [1.0, 2.0]);
    let expr = builtin();
    let [x, y] = expr.vars([&a, &b]);
    ensure_all(&(x + y + x).eval()?, 4.0)
}

pub fn product_chain_reuses_root_operand<T: Element>() -> Result<()> {
    let [l0, l1] = inputs::<T, 2>(LEN, [1.0, 2.0]);
    let expr = builtin();
    let [a, b] = expr.vars([&l0, &l1]);
    ensure_all(&(a * b * a).eval()?, 2.0)
}

pub fn product_of_sum_is_seven<T: Element>() -> Result<()> {
    let [l0, l1, l2] = inputs::<T, 3>(LEN, [1.0, 2.0, 3.0]);
    let expr = builtin();
    let [a, b, c] = expr.vars([&l0, &l1, &l2]);
    ensure_all(&(a + b * c).eval()?, 7.0)
}

pub fn origin_reused_as_raw_operand<T: Element>() -> Result<()> {
    let [l0, l1, l2] = inputs::<T, 3>(LEN, [1.0, 2.0, 3.0]);
    let expr = builtin();
    let [a, b, c] = expr.vars([&l0, &l1, &l2]);
    ensure_all(&(a * b + c + a).eval()?, 6.0)
}

pub fn alternating_products_reach_46<T: Element>() -> Result<()> {
    let l = inputs::<T, 5>(LEN, [1.0, 2.0, 3.0, 4.0, 5.0]);
    let expr = builtin();
    let [l0, l1, l2, l3, l4] = expr.vars([&l[0], &l[1], &l[2], &l[3], &l[4]]);
    let out = (l0 * l1 + l2 * l3 + l4 * l1 + l2 * l3 + l4 * l1).eval()?;
    ensure_all(&out, 46.0)
}

pub fn mixed_sums_reach_39<T: Element>() -> Result<()> {
    let l = inputs::<T, 6>(LEN, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let expr = builtin();
    let [l0, l1, l2, l3, l4, l5] = expr.vars([&l[0], &l[1], &l[2], &l[3], &l[4], &l[5]]);
    ensure_all(&(l0 * l1 + l2 + l3 + l4 * l5).eval()?, 39.0)
}

pub fn mixed_sums_reach_41<T: Element>() -> Result<()> {
    let l = inputs::<T, 5>(LEN, [1.0, 2.0, 3.0, 4.0, 5.0]);
    let expr = builtin();
    let [l0, l1, l2, l3, l4] = expr.vars([&l[0], &l[1], &l[2], &l[3], &l[4]]);
    let out = (l0 * l1 + l2 + l3 + l4 * l1 + l2 * l3 + l4 * l1).eval()?;
    ensure_all(&out, 41.0)
}

pub fn continued_subchain<T: Element>() -> Result<()> {
    let [a, c, d, e] = inputs::<T, 4>(LEN, [1.0, 3.0, 4.0, 5.0]);
    let expr = builtin();
    let [a, c, d, e] = expr.vars([&a, &c, &d, &e]);
    ensure_all(&(a + (c * d + e)).eval()?, 18.0)
}

pub fn chain_times_chain<T: Element>() -> Result<()> {
    let [a, b, c, d] = inputs::<T, 4>(LEN, [1.0, 2.0, 3.0, 4.0]);
    let expr = builtin();
    let [a, b, c, d] = expr.vars([&a, &b, &c, &d]);
    ensure_all(&((a + b) * (c + d)).eval()?, 21.0)
}

pub fn shared_origin_subchains<T: Element>() -> Result<()> {
    let [a, b, c, d] = inputs::<T, 4>(LEN, [1.0, 2.0, 3.0, 4.0]);
    let expr = builtin();
    let [a, b, c, d] = expr.vars([&a, &b, &c, &d]);
    ensure_all(&((b * c) * (b * d) + a).eval()?, 49.0)
}

pub fn subtraction_and_division<T: Element>() -> Result<()> {
    let [a, b, c] = inputs::<T, 3>(LEN, [10.0, 4.0, 3.0]);
    let expr = builtin();
    let [a, b, c] = expr.vars([&a, &b, &c]);
    ensure_all(&((a - b) / c).eval()?, 2.0)
}

pub fn bare_variable_is_copied<T: Element>() -> Result<()> {
    let a = filled::<T>(LEN, 7.5);
    let expr = builtin();
    let x = expr.var(&a);
    let out = x.eval()?;
    ensure!(out.as_slice() == a.as_slice());
    Ok(())
}

pub fn repeated_evaluation_is_idempotent<T: Element>() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(11);
    let l: Vec<Buffer<T>> = (0..5).map(|_| random(&mut rng, LEN)).collect();
    let expr = builtin();
    let [l0, l1, l2, l3, l4] = expr.vars([&l[0], &l[1], &l[2], &l[3], &l[4]]);

    let first = (l0 * l1 + l2 * l3 + l4 * l1).eval()?;
    let second = (l0 * l1 + l2 * l3 + l4 * l1).eval()?;
    ensure!(first == second, "second evaluation differs");
    Ok(())
}

pub fn consecutive_expressions_do_not_leak<T: Element>() -> Result<()> {
    let [a, b, c] = inputs::<T, 3>(LEN, [1.0, 2.0, 3.0]);
    let expr = builtin();
    let [x, y, z] = expr.vars([&a, &b, &c]);

    ensure_all(&(x * y + z * y).eval()?, 8.0)?;
    ensure!(expr.is_empty(), "log not cleared after evaluation");
    ensure_all(&(x + y).eval()?, 3.0)?;
    ensure_all(&(z - x * y).eval()?, 1.0)
}

pub fn exactly_one_lane<T: Element>() -> Result<()> {
    for remainder in [Remainder::ScalarTail, Remainder::Truncate] {
        let [a, b, c] = inputs::<T, 3>(T::LANES, [2.0, 3.0, 4.0]);
        let expr = Expression::with_options(EvalOptions::builtin().with_remainder(remainder));
        let [x, y, z] = expr.vars([&a, &b, &c]);
        let (out, report) = (x * y + z).eval_with_report()?;
        ensure!(report.full_lanes == 1 && report.skipped_elements == 0);
        ensure_all(&out, 10.0)?;
    }
    Ok(())
}

pub fn one_short_of_a_lane<T: Element>() -> Result<()> {
    let len = T::LANES - 1;
    let [a, b, c] = inputs::<T, 3>(len, [2.0, 3.0, 4.0]);

    let expr = Expression::with_options(EvalOptions::builtin());
    let [x, y, z] = expr.vars([&a, &b, &c]);
    let (out, report) = (x * y + z).eval_with_report()?;
    ensure!(out.len() == len);
    ensure!(report.full_lanes == 0 && report.tail_elements == len);
    ensure_all(&out, 10.0)?;

    let expr = Expression::with_options(EvalOptions::builtin().with_remainder(Remainder::Truncate));
    let [x, y, z] = expr.vars([&a, &b, &c]);
    let (out, report) = (x * y + z).eval_with_report()?;
    ensure!(out.len() == len);
    ensure!(report.skipped_elements == len && report.tail_elements == 0);
    ensure_all(&out, 2.0).context("truncated tail keeps the seeded origin")
}

pub fn lazy_matches_eager<T: Element>() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let [a, b, c, d, e] = [0; 5].map(|_| random::<T>(&mut rng, LEN));

    let eager = a.mul(&b)?.add(&c.mul(&d)?)?.sub(&a.div(&e)?)?;

    let expr = builtin();
    let [va, vb, vc, vd, ve] = expr.vars([&a, &b, &c, &d, &e]);
    let lazy = (va * vb + vc * vd - va / ve).eval()?;
    ensure_close(&lazy, &eager)
}

pub fn batching_does_not_change_results<T: Element>() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let l: Vec<Buffer<T>> = (0..5).map(|_| random(&mut rng, LEN)).collect();

    let mut results = Vec::new();
    for lanes in [1, 3, 16, 1024] {
        let expr = Expression::with_options(EvalOptions::builtin().with_lanes_per_batch(lanes));
        let [l0, l1, l2, l3, l4] = expr.vars([&l[0], &l[1], &l[2], &l[3], &l[4]]);
        let out = (l0 * l1 + l2 * (l3 - l4) + l4 * l1 / l2).eval()?;
        results.push(out);
    }
    for out in &results[1..] {
        ensure!(out == &results[0], "batched result differs");
    }
    Ok(())
}
