//! Wallet sub-client: balances, assets, test deposits.

use crate::client::CexClient;
use crate::domain::wallet::{Asset, DepositRequest, WalletBalance};
use crate::error::SdkError;
use rust_decimal::Decimal;

pub struct Wallet<'a> {
    pub(crate) client: &'a CexClient,
}

impl<'a> Wallet<'a> {
    pub async fn balances(&self) -> Result<Vec<WalletBalance>, SdkError> {
        Ok(self.client.http.get_balances().await?)
    }

    /// Balance of one asset, `None` when the user has never held it.
    pub async fn balance(&self, asset_symbol: &str) -> Result<Option<WalletBalance>, SdkError> {
        let balances = self.balances().await?;
        Ok(balances
            .into_iter()
            .find(|b| b.asset_symbol.eq_ignore_ascii_case(asset_symbol)))
    }

    pub async fn assets(&self) -> Result<Vec<Asset>, SdkError> {
        Ok(self.client.http.get_assets().await?)
    }

    /// Credit `amount` of `asset` to the current user (test deployments only).
    pub async fn deposit(&self, asset: &str, amount: Decimal) -> Result<(), SdkError> {
        if amount <= Decimal::ZERO {
            return Err(SdkError::Validation(format!(
                "deposit amount must be positive, got {}",
                amount
            )));
        }
        let request = DepositRequest {
            asset: asset.to_string(),
            amount,
        };
        Ok(self.client.http.deposit(&request).await?)
    }
}
