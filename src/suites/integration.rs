//! Cross-contract wiring

use super::{TestCase, TestContext, Verdict};
use crate::contracts::ContractKind::{
    BlendAdapter, BorrowLimitPolicy, OracleAdapter, RiskEngine, VantisPool,
};
use crate::invoker::CallArg;
use futures::future::BoxFuture;
use futures::FutureExt;

pub(super) const CASES: &[TestCase] = &[
    TestCase {
        name: "integration: pool routes through the Blend adapter",
        requires: &[VantisPool, BlendAdapter],
        run: pool_uses_adapter,
    },
    TestCase {
        name: "integration: risk engine routes through the Blend adapter",
        requires: &[RiskEngine, BlendAdapter],
        run: risk_uses_adapter,
    },
    TestCase {
        name: "integration: oracle prices the pool collateral",
        requires: &[OracleAdapter, VantisPool],
        run: oracle_knows_collateral,
    },
    TestCase {
        name: "integration: borrow-limit policy shares the admin",
        requires: &[BorrowLimitPolicy],
        run: policy_admin,
    },
    TestCase {
        name: "integration: risk-adjusted borrow limit is computable",
        requires: &[RiskEngine, OracleAdapter],
        run: safe_borrow_quote,
    },
];

fn pool_uses_adapter(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        ctx.expect_value(VantisPool, "get_blend_pool", &[], ctx.address(BlendAdapter))
            .await
    }
    .boxed()
}

fn risk_uses_adapter(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        ctx.expect_value(RiskEngine, "get_blend_adapter", &[], ctx.address(BlendAdapter))
            .await
    }
    .boxed()
}

fn oracle_knows_collateral(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        let args = [CallArg::new("asset", &ctx.config.protocol.collateral.symbol)];
        match ctx.expect_value(OracleAdapter, "is_asset_supported", &args, "true").await {
            Verdict::Pass => ctx.read(OracleAdapter, "get_price", &args).await,
            other => other,
        }
    }
    .boxed()
}

fn policy_admin(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move { ctx.expect_value(BorrowLimitPolicy, "admin", &[], &ctx.admin).await }.boxed()
}

fn safe_borrow_quote(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        ctx.read(RiskEngine, "calculate_safe_borrow", &super::risk::safe_borrow_args(ctx))
            .await
    }
    .boxed()
}
