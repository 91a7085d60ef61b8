//! FIX Wire Support
//!
//! Tag and message-type constants plus the order-preserving message value
//! used by the socket engine. Only the handful of tags this client
//! populates or inspects are defined here.

pub mod encode;

pub use encode::{FixMessage, ParseError};

/// FIX tags used by this client.
pub mod tag {
    /// Account (empty, carried for counterparty compatibility).
    pub const ACCOUNT: u32 = 1;
    /// BeginString - protocol version, start of every frame.
    pub const BEGIN_STRING: u32 = 8;
    /// BodyLength.
    pub const BODY_LENGTH: u32 = 9;
    /// CheckSum - end of every frame.
    pub const CHECKSUM: u32 = 10;
    /// MsgSeqNum.
    pub const MSG_SEQ_NUM: u32 = 34;
    /// MsgType.
    pub const MSG_TYPE: u32 = 35;
    /// SenderCompID.
    pub const SENDER_COMP_ID: u32 = 49;
    /// SendingTime.
    pub const SENDING_TIME: u32 = 52;
    /// Symbol - the instrument pair code, repeated per group entry.
    pub const SYMBOL: u32 = 55;
    /// TargetCompID.
    pub const TARGET_COMP_ID: u32 = 56;
    /// Text - free-form reason on logout.
    pub const TEXT: u32 = 58;
    /// SettlType - settlement type wire code.
    pub const SETTL_TYPE: u32 = 63;
    /// EncryptMethod - always 0.
    pub const ENCRYPT_METHOD: u32 = 98;
    /// HeartBtInt - heartbeat interval in seconds.
    pub const HEART_BT_INT: u32 = 108;
    /// TestReqID - echoed back in the heartbeat answering a test request.
    pub const TEST_REQ_ID: u32 = 112;
    /// ResetSeqNumFlag.
    pub const RESET_SEQ_NUM_FLAG: u32 = 141;
    /// NoRelatedSym - repeating group count.
    pub const NO_RELATED_SYM: u32 = 146;
    /// MDReqID - client-assigned request identifier.
    pub const MD_REQ_ID: u32 = 262;
    /// SubscriptionRequestType - subscription mode wire code.
    pub const SUBSCRIPTION_REQUEST_TYPE: u32 = 263;
    /// MDEntrySize - size band quantity, repeated per group entry.
    pub const MD_ENTRY_SIZE: u32 = 271;
    /// PartyID - price stream identifier.
    pub const PARTY_ID: u32 = 448;
    /// Username for logon.
    pub const USERNAME: u32 = 553;
    /// Password for logon.
    pub const PASSWORD: u32 = 554;
    /// ApplSeqNum - counterparty-assigned dedup index echoed on
    /// unsubscription.
    pub const APPL_SEQ_NUM: u32 = 1181;
}

/// FIX message types used by this client.
pub mod msg_type {
    /// Heartbeat.
    pub const HEARTBEAT: &str = "0";
    /// Test Request.
    pub const TEST_REQUEST: &str = "1";
    /// Logout.
    pub const LOGOUT: &str = "5";
    /// Logon.
    pub const LOGON: &str = "A";
    /// Market Data Request.
    pub const MARKET_DATA_REQUEST: &str = "V";
}
