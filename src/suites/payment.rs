//! Payment flow: deposit, borrow, repay, withdraw
//!
//! Steps run in order against the admin account. A failing step is reported
//! and the remaining steps still run.

use super::{TestCase, TestContext, Verdict};
use crate::contracts::ContractKind::{self, VantisPool};
use crate::invoker::classify::codes;
use crate::invoker::CallArg;
use futures::future::BoxFuture;
use futures::FutureExt;

const REQ: &[ContractKind] = &[VantisPool];

pub(super) const CASES: &[TestCase] = &[
    TestCase { name: "payment: deposit collateral", requires: REQ, run: deposit },
    TestCase { name: "payment: pool has liquidity", requires: REQ, run: liquidity },
    TestCase { name: "payment: borrow", requires: REQ, run: borrow },
    TestCase { name: "payment: position reflects the loan", requires: REQ, run: position },
    TestCase { name: "payment: repay", requires: REQ, run: repay },
    TestCase { name: "payment: withdraw collateral", requires: REQ, run: withdraw },
];

fn user(ctx: &TestContext) -> CallArg {
    CallArg::new("user", &ctx.admin)
}

fn deposit(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        let args = [
            user(ctx),
            CallArg::new("asset", &ctx.config.assets.xlm_token),
            CallArg::new("amount", ctx.config.payment_flow.deposit_amount.to_string()),
        ];
        ctx.invoke(VantisPool, "deposit", &args).await
    }
    .boxed()
}

fn liquidity(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        match ctx.read_value(VantisPool, "get_reserves", &[]).await {
            Ok(result) => match result.value().parse::<i128>() {
                Ok(reserves) if reserves < i128::from(ctx.config.payment_flow.borrow_amount) => {
                    Verdict::Warn(format!(
                        "pool reserves {} below borrow amount {}",
                        reserves, ctx.config.payment_flow.borrow_amount
                    ))
                }
                Ok(_) => Verdict::Pass,
                Err(_) => Verdict::Fail(format!("get_reserves returned {}", result.payload)),
            },
            Err(verdict) => verdict,
        }
    }
    .boxed()
}

fn borrow(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        let args = [
            user(ctx),
            CallArg::new("amount", ctx.config.payment_flow.borrow_amount.to_string()),
        ];
        ctx.invoke(VantisPool, "borrow", &args).await
    }
    .boxed()
}

fn position(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        let args = [user(ctx)];
        match ctx.read(VantisPool, "get_borrow", &args).await {
            Verdict::Fail(reason) => Verdict::Fail(reason),
            _ => ctx.read(VantisPool, "get_health_factor", &args).await,
        }
    }
    .boxed()
}

fn repay(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        let args = [
            user(ctx),
            CallArg::new("amount", ctx.config.payment_flow.repay_amount.to_string()),
        ];
        ctx.invoke(VantisPool, "repay", &args).await
    }
    .boxed()
}

fn withdraw(ctx: &TestContext) -> BoxFuture<'_, Verdict> {
    async move {
        let args = [
            user(ctx),
            CallArg::new("asset", &ctx.config.assets.xlm_token),
            CallArg::new("amount", ctx.config.payment_flow.withdraw_amount.to_string()),
        ];
        let result = match ctx.invoke_raw(VantisPool, "withdraw", &args).await {
            Ok(result) => result,
            Err(e) => return Verdict::Fail(e.to_string()),
        };
        if result.contract_error_code() == Some(codes::pool::WITHDRAWAL_WOULD_LIQUIDATE) {
            return Verdict::Warn("withdrawal blocked by outstanding debt".to_string());
        }
        Verdict::from_result(&result)
    }
    .boxed()
}
