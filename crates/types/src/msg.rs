//! Ledger messages the load tester knows how to build.

use crate::Coin;
use sbor::prelude::*;

/// Bank transfer from one account to another.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct MsgSend {
    pub from_address: String,
    pub to_address: String,
    pub amount: Vec<Coin>,
}

/// One member entry of a new group.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct MemberRequest {
    pub address: String,
    /// Decimal string, as the group module expects.
    pub weight: String,
    pub metadata: String,
}

/// Creation of a group with an admin and an initial member set.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct MsgCreateGroup {
    pub admin: String,
    pub members: Vec<MemberRequest>,
    pub metadata: String,
}

/// A transaction message.
///
/// Each variant has exactly one signer, which must be the account that signs
/// the enclosing transaction.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub enum Msg {
    BankSend(MsgSend),
    CreateGroup(MsgCreateGroup),
}

impl Msg {
    /// Protobuf type URL of the message on the ledger.
    pub fn type_url(&self) -> &'static str {
        match self {
            Msg::BankSend(_) => "/cosmos.bank.v1beta1.MsgSend",
            Msg::CreateGroup(_) => "/cosmos.group.v1.MsgCreateGroup",
        }
    }

    /// Address that has to sign this message.
    pub fn signer(&self) -> &str {
        match self {
            Msg::BankSend(msg) => &msg.from_address,
            Msg::CreateGroup(msg) => &msg.admin,
        }
    }
}

impl From<MsgSend> for Msg {
    fn from(msg: MsgSend) -> Self {
        Msg::BankSend(msg)
    }
}

impl From<MsgCreateGroup> for Msg {
    fn from(msg: MsgCreateGroup) -> Self {
        Msg::CreateGroup(msg)
    }
}
