//! ERC-20 allowance management ahead of value moving calls.

use {
    super::{Context, Error, link, poller, submitter},
    crate::{
        domain::{amount, eth, status},
        infra::contracts::{Binding, IERC20},
    },
    alloy::sol_types::SolCall,
    serde::Deserialize,
};

/// How much allowance to request when an approval is needed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Approve exactly the amount of the pending action.
    #[default]
    Exact,
    /// Approve the maximum amount so future actions need no approval.
    Unlimited,
}

impl Policy {
    pub fn amount(self, required: eth::U256) -> eth::U256 {
        match self {
            Policy::Exact => required,
            Policy::Unlimited => eth::U256::MAX,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The existing allowance already covered the required amount.
    Sufficient,
    /// An approval transaction was confirmed.
    Approved(eth::TxHash),
}

/// The allowance an action needs.
#[derive(Clone, Copy, Debug)]
pub struct Request<'a> {
    pub owner: eth::Address,
    pub spender: eth::ContractAddress,
    pub required: eth::U256,
    pub decimals: u8,
    pub symbol: &'a str,
}

/// Makes sure `spender` may transfer at least `required` of the token from
/// `owner`.
///
/// Requests and waits for an approval when the current allowance is short,
/// then reads the allowance again. Any failure must stop the parent action.
pub async fn ensure_allowance(
    ctx: &Context<'_>,
    token: &Binding,
    request: Request<'_>,
    reporter: &mut status::Reporter,
) -> Result<Outcome, Error> {
    let allowance = read(token, &request).await?;
    if allowance >= request.required {
        tracing::debug!(%allowance, required = %request.required, "allowance sufficient");
        return Ok(Outcome::Sufficient);
    }

    let approve = ctx.config.approval.amount(request.required);
    tracing::info!(
        %allowance,
        required = %request.required,
        %approve,
        spender = %request.spender.0,
        "requesting token approval"
    );
    reporter.progress(
        status::Step::ApprovalRequired,
        format!(
            "approve {} {} for {} in your wallet",
            describe(approve, request.decimals),
            request.symbol,
            request.spender.0,
        ),
        None,
    );

    let tx = token.transaction(
        request.owner,
        IERC20::approveCall {
            spender: request.spender.0,
            amount: approve,
        }
        .abi_encode()
        .into(),
    );
    let hash = submitter::submit(ctx, token.network, tx.clone())
        .await
        .map_err(|err| match err {
            Error::SubmissionRejected => Error::ApprovalRejected,
            err => err,
        })?;
    poller::confirm(token.node(), &tx, hash, &ctx.config.polling).await?;

    let allowance = read(token, &request).await?;
    if allowance < request.required {
        return Err(Error::ApprovalInsufficient {
            allowance,
            required: request.required,
        });
    }

    reporter.progress(
        status::Step::ApprovalConfirmed,
        format!("{} approved", request.symbol),
        Some(link(ctx.bindings.registry(), token.network, hash)),
    );
    Ok(Outcome::Approved(hash))
}

async fn read(token: &Binding, request: &Request<'_>) -> Result<eth::U256, Error> {
    Ok(token
        .read(IERC20::allowanceCall {
            owner: request.owner,
            spender: request.spender.0,
        })
        .await?)
}

fn describe(units: eth::U256, decimals: u8) -> String {
    if units == eth::U256::MAX {
        "an unlimited amount of".to_owned()
    } else {
        amount::format(units, decimals)
    }
}
