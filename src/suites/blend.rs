//! Blend adapter checks

use super::{TestCase, TestContext, Verdict};
use crate::contracts::ContractKind::{self, BlendAdapter};
use crate::invoker::CallArg;
use futures::future::BoxFuture;
use futures::FutureExt;

const REQ: &[ContractKind] = &[BlendAdapter];

pub(super) const CASES: &[TestCase] = &[
    TestCase { name: "blend: admin is the deployer", requires: REQ, run: admin_matches },
    TestCase { name: "blend: wired to the configured Blend pool", requires: REQ, run: pool_wired },
    TestCase { name: "blend: pool config is readable", requires: REQ, run: pool_config },
    TestCase { name: "blend: reserve list is readable", requires: REQ, run: reserve_list },
    TestCase { name: "blend: admin health factor is readable", requires: REQ, run: health_factor },
];

fn admin_matches(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move { ctx.expect_value(BlendAdapter, "admin", &[], &ctx.admin).await }.boxed()
}

fn pool_wired(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        ctx.expect_value(BlendAdapter, "blend_pool", &[], &ctx.config.assets.blend_pool)
            .await
    }
    .boxed()
}

fn pool_config(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move { ctx.read(BlendAdapter, "get_pool_config", &[]).await }.boxed()
}

fn reserve_list(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move { ctx.read(BlendAdapter, "get_reserve_list", &[]).await }.boxed()
}

fn health_factor(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        ctx.read(
            BlendAdapter,
            "get_health_factor",
            &[CallArg::new("user", &ctx.admin)],
        )
        .await
    }
    .boxed()
}
