//! Risk engine checks

use super::{TestCase, TestContext, Verdict};
use crate::contracts::ContractKind::{self, BlendAdapter, RiskEngine};
use crate::invoker::CallArg;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

const REQ: &[ContractKind] = &[RiskEngine];

pub(super) const CASES: &[TestCase] = &[
    TestCase { name: "risk: admin is the deployer", requires: REQ, run: admin_matches },
    TestCase { name: "risk: parameters match configuration", requires: REQ, run: params_match },
    TestCase {
        name: "risk: Blend adapter is the deployed adapter",
        requires: &[RiskEngine, BlendAdapter],
        run: blend_adapter,
    },
    TestCase { name: "risk: safe borrow quote", requires: REQ, run: safe_borrow },
    TestCase { name: "risk: admin position health", requires: REQ, run: position_health },
    TestCase { name: "risk: liquidator lookup", requires: REQ, run: liquidator_lookup },
];

fn admin_matches(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move { ctx.expect_value(RiskEngine, "admin", &[], &ctx.admin).await }.boxed()
}

/// Compare the numeric fields that do not depend on i128 rendering
fn params_match(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        let result = match ctx.read_value(RiskEngine, "get_params", &[]).await {
            Ok(result) => result,
            Err(verdict) => return verdict,
        };
        let params: Value = match serde_json::from_str(&result.payload) {
            Ok(v) => v,
            Err(e) => return Verdict::Fail(format!("get_params is not JSON ({}): {}", e, result.payload)),
        };

        let risk = &ctx.config.protocol.risk;
        let expected = [
            ("k_factor", risk.k_factor),
            ("time_horizon_days", risk.time_horizon_days),
            ("liquidation_penalty", risk.liquidation_penalty),
            ("protocol_fee", risk.protocol_fee),
            ("min_collateral_factor", risk.min_collateral_factor),
        ];
        for (field, want) in expected {
            if params[field].as_u64() != Some(u64::from(want)) {
                return Verdict::Fail(format!("{}: expected {}, got {}", field, want, params[field]));
            }
        }
        Verdict::Pass
    }
    .boxed()
}

fn blend_adapter(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        ctx.expect_value(RiskEngine, "get_blend_adapter", &[], ctx.address(BlendAdapter))
            .await
    }
    .boxed()
}

pub(super) fn safe_borrow_args(ctx: &TestContext) -> Vec<CallArg> {
    let collateral = &ctx.config.protocol.collateral;
    vec![
        CallArg::new("asset", &collateral.symbol),
        CallArg::new("collateral_value", ctx.config.payment_flow.deposit_amount.to_string()),
        CallArg::new("base_ltv", collateral.base_ltv.to_string()),
    ]
}

fn safe_borrow(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        ctx.read(RiskEngine, "calculate_safe_borrow", &safe_borrow_args(ctx))
            .await
    }
    .boxed()
}

fn position_health(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        ctx.read(RiskEngine, "check_position_health", &[CallArg::new("user", &ctx.admin)])
            .await
    }
    .boxed()
}

fn liquidator_lookup(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        ctx.read(RiskEngine, "is_liquidator", &[CallArg::new("address", &ctx.admin)])
            .await
    }
    .boxed()
}
