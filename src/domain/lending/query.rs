use {
    super::{Error, Lending},
    crate::{
        domain::{amount, asset::AssetId, eth, registry::Role},
        infra::contracts::{IERC20, IOmniVault},
    },
    std::fmt::{self, Display, Formatter},
};

/// USD values reported by the hub use 18 decimals.
const USD_DECIMALS: u8 = 18;

/// A token amount in base units, with the decimals needed to display it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Balance {
    pub raw: eth::U256,
    pub decimals: u8,
}

impl Display for Balance {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&amount::format(self.raw, self.decimals))
    }
}

/// An asset price in USD as reported by the hub oracle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Price {
    pub usd: eth::U256,
}

impl Display for Price {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "${}", amount::format(self.usd, USD_DECIMALS))
    }
}

/// A user's position across all networks, as tracked by the hub.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Position {
    pub collateral_usd: eth::U256,
    pub debt_usd: eth::U256,
    /// `U256::MAX` when there is no debt.
    pub health_factor: eth::U256,
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "collateral ${}, debt ${}, health factor ",
            amount::format(self.collateral_usd, USD_DECIMALS),
            amount::format(self.debt_usd, USD_DECIMALS),
        )?;
        if self.health_factor == eth::U256::MAX {
            f.write_str("∞")
        } else {
            f.write_str(&amount::format(self.health_factor, USD_DECIMALS))
        }
    }
}

impl Lending {
    /// Reads how much of an asset the satellite executor on `network` may
    /// pull from `owner`.
    pub async fn read_allowance(
        &self,
        network: eth::NetworkId,
        asset: AssetId,
        owner: eth::Address,
    ) -> Result<Balance, Error> {
        let registry = self.registry();
        let deployment = registry.deployment(asset, network)?;
        let spender = registry.contract(network, Role::Executor)?;
        let token = self
            .inner
            .bindings
            .get(network, Role::Token(asset))
            .await?;
        let raw = token
            .read(IERC20::allowanceCall {
                owner,
                spender: spender.0,
            })
            .await?;
        Ok(Balance {
            raw,
            decimals: deployment.decimals,
        })
    }

    pub async fn read_balance(
        &self,
        network: eth::NetworkId,
        asset: AssetId,
        owner: eth::Address,
    ) -> Result<Balance, Error> {
        let deployment = self.registry().deployment(asset, network)?;
        let token = self
            .inner
            .bindings
            .get(network, Role::Token(asset))
            .await?;
        let raw = token.read(IERC20::balanceOfCall { owner }).await?;
        Ok(Balance {
            raw,
            decimals: deployment.decimals,
        })
    }

    pub async fn read_asset_price(&self, asset: AssetId) -> Result<Price, Error> {
        let hub = self.registry().hub().id;
        let deployment = self.registry().deployment(asset, hub)?;
        let vault = self.inner.bindings.get(hub, Role::Hub).await?;
        let usd = vault
            .read(IOmniVault::getAssetPriceUSDCall {
                asset: deployment.token.0,
            })
            .await?;
        Ok(Price { usd })
    }

    pub async fn read_position(&self, user: eth::Address) -> Result<Position, Error> {
        let hub = self.registry().hub().id;
        let vault = self.inner.bindings.get(hub, Role::Hub).await?;
        let position = vault
            .read(IOmniVault::getCrossChainPositionCall { user })
            .await?;
        Ok(Position {
            collateral_usd: position.collateralUsd,
            debt_usd: position.debtUsd,
            health_factor: position.hf,
        })
    }

    pub async fn can_be_liquidated(&self, user: eth::Address) -> Result<bool, Error> {
        let hub = self.registry().hub().id;
        let vault = self.inner.bindings.get(hub, Role::Hub).await?;
        Ok(vault
            .read(IOmniVault::canBeLiquidatedCall { user })
            .await?)
    }
}
