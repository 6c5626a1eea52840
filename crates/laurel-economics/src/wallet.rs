use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use laurel_types::{Coins, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// One wallet mutation, kept for audit display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    pub user: UserId,
    pub amount: Coins,
    pub memo: String,
    pub timestamp: DateTime<Utc>,
    pub is_credit: bool,
}

/// External currency ledger consumed as a mutation target.
#[async_trait]
pub trait WalletLedger: Send + Sync {
    async fn credit(&self, user: &UserId, amount: Coins, memo: &str) -> Result<()>;
    async fn debit(&self, user: &UserId, amount: Coins) -> Result<()>;
    async fn balance(&self, user: &UserId) -> Result<Coins>;
    async fn history(&self, user: &UserId) -> Result<Vec<WalletRecord>>;
}

/// In-memory wallet for tests and local runs.
pub struct MemoryWallet {
    balances: Arc<RwLock<HashMap<UserId, Coins>>>,
    history: Arc<RwLock<Vec<WalletRecord>>>,
}

impl MemoryWallet {
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
            history: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for MemoryWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletLedger for MemoryWallet {
    async fn credit(&self, user: &UserId, amount: Coins, memo: &str) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }

        let mut balances = self.balances.write().await;
        let current = balances.get(user).copied().unwrap_or(Coins::ZERO);
        let new_balance = current
            .checked_add(amount)
            .ok_or_else(|| anyhow::anyhow!("Balance overflow for {}", user))?;
        balances.insert(user.clone(), new_balance);

        self.history.write().await.push(WalletRecord {
            user: user.clone(),
            amount,
            memo: memo.to_string(),
            timestamp: Utc::now(),
            is_credit: true,
        });

        info!(
            user = %user,
            amount = %amount,
            balance_after = %new_balance,
            memo = memo,
            "💰 Balance credited"
        );
        Ok(())
    }

    async fn debit(&self, user: &UserId, amount: Coins) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }

        let mut balances = self.balances.write().await;
        let current = balances.get(user).copied().unwrap_or(Coins::ZERO);
        let new_balance = match current.checked_sub(amount) {
            Some(balance) => balance,
            None => bail!(
                "Insufficient balance for {}: has {}, needs {}",
                user,
                current,
                amount
            ),
        };
        balances.insert(user.clone(), new_balance);

        self.history.write().await.push(WalletRecord {
            user: user.clone(),
            amount,
            memo: String::new(),
            timestamp: Utc::now(),
            is_credit: false,
        });

        info!(
            user = %user,
            amount = %amount,
            balance_after = %new_balance,
            "💸 Balance debited"
        );
        Ok(())
    }

    async fn balance(&self, user: &UserId) -> Result<Coins> {
        let balances = self.balances.read().await;
        Ok(balances.get(user).copied().unwrap_or(Coins::ZERO))
    }

    async fn history(&self, user: &UserId) -> Result<Vec<WalletRecord>> {
        let history = self.history.read().await;
        Ok(history.iter().filter(|r| &r.user == user).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_credit_and_debit() {
        let wallet = MemoryWallet::new();
        let alice = UserId::new("alice");

        wallet
            .credit(&alice, Coins::new(100), "podium reward")
            .await
            .unwrap();
        assert_eq!(wallet.balance(&alice).await.unwrap(), Coins::new(100));

        wallet.debit(&alice, Coins::new(30)).await.unwrap();
        assert_eq!(wallet.balance(&alice).await.unwrap(), Coins::new(70));

        assert!(wallet.debit(&alice, Coins::new(1000)).await.is_err());
        assert_eq!(wallet.balance(&alice).await.unwrap(), Coins::new(70));
    }

    #[tokio::test]
    async fn test_zero_amount_is_noop() {
        let wallet = MemoryWallet::new();
        let alice = UserId::new("alice");

        wallet.credit(&alice, Coins::ZERO, "nothing").await.unwrap();
        assert!(wallet.history(&alice).await.unwrap().is_empty());
    }
}
