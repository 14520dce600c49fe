//! Oracle adapter checks

use super::{TestCase, TestContext, Verdict};
use crate::contracts::ContractKind::OracleAdapter;
use crate::invoker::{CallArg, Outcome};
use futures::future::BoxFuture;
use futures::FutureExt;

const REQ: &[crate::contracts::ContractKind] = &[OracleAdapter];

pub(super) const CASES: &[TestCase] = &[
    TestCase { name: "oracle: admin is the deployer", requires: REQ, run: admin_matches },
    TestCase { name: "oracle: asset list includes collateral", requires: REQ, run: lists_collateral },
    TestCase { name: "oracle: collateral is supported", requires: REQ, run: collateral_supported },
    TestCase { name: "oracle: unknown asset is rejected", requires: REQ, run: unknown_asset_rejected },
    TestCase { name: "oracle: price is readable", requires: REQ, run: price_readable },
    TestCase { name: "oracle: volatility is readable", requires: REQ, run: volatility_readable },
    TestCase { name: "oracle: admin can push a price", requires: REQ, run: push_price },
];

fn symbol(ctx: &TestContext) -> Vec<CallArg> {
    vec![CallArg::new("asset", &ctx.config.protocol.collateral.symbol)]
}

fn admin_matches(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move { ctx.expect_value(OracleAdapter, "admin", &[], &ctx.admin).await }.boxed()
}

fn lists_collateral(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        match ctx.read_value(OracleAdapter, "get_assets", &[]).await {
            Ok(result) => {
                let wanted = format!("\"{}\"", ctx.config.protocol.collateral.symbol);
                if result.payload.contains(&wanted) {
                    Verdict::Pass
                } else {
                    Verdict::Fail(format!("{} missing from {}", wanted, result.payload))
                }
            }
            Err(verdict) => verdict,
        }
    }
    .boxed()
}

fn collateral_supported(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        ctx.expect_value(OracleAdapter, "is_asset_supported", &symbol(ctx), "true")
            .await
    }
    .boxed()
}

fn unknown_asset_rejected(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        let args = [CallArg::new("asset", "NOPE")];
        match ctx.read_raw(OracleAdapter, "get_price", &args).await {
            Ok(result) if result.outcome == Outcome::AssetNotSupported => Verdict::Pass,
            Ok(result) => Verdict::Fail(format!("expected asset_not_supported, got {}", result.outcome)),
            Err(e) => Verdict::Fail(e.to_string()),
        }
    }
    .boxed()
}

fn price_readable(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move { ctx.read(OracleAdapter, "get_price", &symbol(ctx)).await }.boxed()
}

fn volatility_readable(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move { ctx.read(OracleAdapter, "get_volatility", &symbol(ctx)).await }.boxed()
}

fn push_price(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        let args = [
            CallArg::new("caller", &ctx.admin),
            CallArg::new("asset", &ctx.config.protocol.collateral.symbol),
            CallArg::new("price", ctx.config.protocol.oracle.initial_price.to_string()),
        ];
        ctx.invoke(OracleAdapter, "update_price", &args).await
    }
    .boxed()
}
