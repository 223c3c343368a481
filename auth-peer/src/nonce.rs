use auth_wire::WalletError;

use crate::wallet::Wallet;

/// Mints a fresh nonce bound to `wallet`'s identity.
pub async fn create_nonce(wallet: &dyn Wallet) -> Result<String, WalletError> {
    wallet.create_nonce().await
}

/// Returns true iff `wallet` could have produced `nonce` itself.
///
/// Used to reject a `yourNonce` value that was never minted by us: without
/// this check a replayed or forged nonce would be indistinguishable from a
/// legitimate echo.
pub async fn verify_nonce(wallet: &dyn Wallet, nonce: &str) -> Result<bool, WalletError> {
    wallet.verify_nonce(nonce).await
}
