//! Group creation with a single admin-member.

use super::{pick_participants, GenerationError, TxGenerator};
use crate::accounts::AccountPool;
use crate::config::Params;
use manifest_load_types::{Account, MemberRequest, Msg, MsgCreateGroup};
use rand::distributions::{Alphanumeric, DistString};
use rand::RngCore;

/// Member weight given to the admin.
const MEMBER_WEIGHT: &str = "1";

/// Member metadata given to the admin.
const MEMBER_METADATA: &str = "user";

/// Creates a group whose admin is also its only member, with random
/// metadata of `params.create_group_metadata_size` characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateGroupGenerator;

impl TxGenerator for CreateGroupGenerator {
    fn generate<'a>(
        &self,
        pool: &'a AccountPool,
        params: &Params,
        rng: &mut dyn RngCore,
    ) -> Result<(&'a Account, Msg), GenerationError> {
        let admin = pick_participants(pool, rng, 1)?[0];
        let address = admin.address().to_string();

        let msg = MsgCreateGroup {
            admin: address.clone(),
            members: vec![MemberRequest {
                address,
                weight: MEMBER_WEIGHT.to_string(),
                metadata: MEMBER_METADATA.to_string(),
            }],
            metadata: Alphanumeric.sample_string(rng, params.create_group_metadata_size),
        };
        Ok((admin, msg.into()))
    }
}
