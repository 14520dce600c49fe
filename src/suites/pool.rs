//! Vantis pool checks

use super::{TestCase, TestContext, Verdict};
use crate::contracts::ContractKind::{self, BlendAdapter, VantisPool};
use crate::invoker::CallArg;
use futures::future::BoxFuture;
use futures::FutureExt;

const REQ: &[ContractKind] = &[VantisPool];

pub(super) const CASES: &[TestCase] = &[
    TestCase { name: "pool: admin is the deployer", requires: REQ, run: admin_matches },
    TestCase { name: "pool: reserves are non-negative", requires: REQ, run: reserves },
    TestCase { name: "pool: total borrows are non-negative", requires: REQ, run: total_borrows },
    TestCase { name: "pool: interest rate is readable", requires: REQ, run: interest_rate },
    TestCase {
        name: "pool: Blend pool is the deployed adapter",
        requires: &[VantisPool, BlendAdapter],
        run: blend_pool,
    },
    TestCase { name: "pool: admin collateral is readable", requires: REQ, run: collateral },
];

fn admin_matches(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move { ctx.expect_value(VantisPool, "admin", &[], &ctx.admin).await }.boxed()
}

/// Read an integer getter and require it to be >= 0
async fn non_negative(ctx: &TestContext, function: &str) -> Verdict {
    match ctx.read_value(VantisPool, function, &[]).await {
        Ok(result) => match result.value().parse::<i128>() {
            Ok(v) if v >= 0 => Verdict::Pass,
            Ok(v) => Verdict::Fail(format!("{} is negative: {}", function, v)),
            Err(_) => Verdict::Fail(format!("{} returned non-numeric {}", function, result.payload)),
        },
        Err(verdict) => verdict,
    }
}

fn reserves(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    non_negative(ctx, "get_reserves").boxed()
}

fn total_borrows(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    non_negative(ctx, "get_total_borrows").boxed()
}

fn interest_rate(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    non_negative(ctx, "get_interest_rate").boxed()
}

fn blend_pool(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        ctx.expect_value(VantisPool, "get_blend_pool", &[], ctx.address(BlendAdapter))
            .await
    }
    .boxed()
}

fn collateral(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        ctx.read(VantisPool, "get_collateral", &[CallArg::new("user", &ctx.admin)])
            .await
    }
    .boxed()
}
