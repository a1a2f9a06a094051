//! Transaction assembly: message construction, signing, signer completeness

use super::instructions::InstructionBatch;
use super::message::UnsignedMessage;
use super::output::SignedTransaction;
use crate::errors::{PipelineError, PipelineResult};
use crate::metrics::metrics;
use crate::types::{AccountLocator, FreshnessToken, Signature};
use crate::wallet::SigningIdentity;
use tracing::debug;

/// Build, serialize and sign one atomic transaction
///
/// Each identity in `signers` signs the canonical message bytes once;
/// identities with the same public locator are signed only once and signers
/// not referenced by any instruction are allowed.
///
/// # Errors
///
/// - `StaleFreshnessToken` if the token is already known to be expired
/// - `MissingSignature` naming the first `is_signer` account with no identity
///   in `signers`
/// - `Signing` if an identity fails to sign
///
/// The token is not fetched here; get it immediately before calling.
pub fn assemble(
    fee_payer: AccountLocator,
    freshness_token: FreshnessToken,
    batch: InstructionBatch,
    signers: &[&dyn SigningIdentity],
) -> PipelineResult<SignedTransaction> {
    if freshness_token.is_known_expired() {
        return Err(PipelineError::StaleFreshnessToken);
    }

    let mut signer_locators: Vec<AccountLocator> = Vec::with_capacity(signers.len());
    let mut unique_signers: Vec<&dyn SigningIdentity> = Vec::with_capacity(signers.len());
    for signer in signers {
        let locator = signer.public_locator();
        if !signer_locators.contains(&locator) {
            signer_locators.push(locator);
            unique_signers.push(*signer);
        }
    }

    if let Some(missing) = batch
        .required_signers()
        .into_iter()
        .find(|required| !signer_locators.contains(required))
    {
        return Err(PipelineError::MissingSignature(missing));
    }

    let message = UnsignedMessage::new(fee_payer, freshness_token, batch);
    let message_bytes = message.serialize()?;

    let signatures = unique_signers
        .iter()
        .map(|signer| -> PipelineResult<(AccountLocator, Signature)> {
            Ok((signer.public_locator(), signer.sign_bytes(&message_bytes)?))
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    debug!(
        fee_payer = %fee_payer,
        instructions = message.instructions().len(),
        signatures = signatures.len(),
        message_len = message_bytes.len(),
        "Assembled transaction"
    );
    metrics().transactions_assembled.inc();

    Ok(SignedTransaction::new(message, message_bytes, signatures))
}

/// Reassemble an existing transaction's instructions against a new token
pub fn reassemble(
    tx: &SignedTransaction,
    freshness_token: FreshnessToken,
    signers: &[&dyn SigningIdentity],
) -> PipelineResult<SignedTransaction> {
    let message = tx.message().clone();
    let fee_payer = *message.fee_payer();
    assemble(fee_payer, freshness_token, message.into_batch(), signers)
}
