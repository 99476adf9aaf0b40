//! Bank transfer between two distinct accounts.

use super::{pick_participants, GenerationError, TxGenerator};
use crate::accounts::AccountPool;
use crate::config::Params;
use manifest_load_types::{Account, Msg, MsgSend};
use rand::RngCore;

/// Moves `params.amount` of `params.denom` from one random account to
/// another. The first account is the sender.
#[derive(Debug, Clone, Copy, Default)]
pub struct BankSendGenerator;

impl TxGenerator for BankSendGenerator {
    fn generate<'a>(
        &self,
        pool: &'a AccountPool,
        params: &Params,
        rng: &mut dyn RngCore,
    ) -> Result<(&'a Account, Msg), GenerationError> {
        let picked = pick_participants(pool, rng, 2)?;
        let (from, to) = (picked[0], picked[1]);

        let msg = MsgSend {
            from_address: from.address().to_string(),
            to_address: to.address().to_string(),
            amount: vec![params.amount_coin()],
        };
        Ok((from, msg.into()))
    }
}
