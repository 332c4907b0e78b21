//! Chain vocabulary consumed by the pipeline: event identifiers, built-in
//! function names and well-known payloads.

/// Event raised by the VM when a contract call fails.
pub const EVENT_SIGNAL_ERROR: &str = "signalError";

/// Event raised on successful contract deployment.
pub const EVENT_SC_DEPLOY: &str = "SCDeploy";

/// Event raised on direct value transfers performed by contracts.
pub const EVENT_TRANSFER_VALUE_ONLY: &str = "transferValueOnly";

pub const EVENT_ESDT_TRANSFER: &str = "ESDTTransfer";
pub const EVENT_ESDT_NFT_TRANSFER: &str = "ESDTNFTTransfer";
pub const EVENT_MULTI_ESDT_NFT_TRANSFER: &str = "MultiESDTNFTTransfer";
pub const EVENT_ESDT_NFT_CREATE: &str = "ESDTNFTCreate";
pub const EVENT_ESDT_NFT_BURN: &str = "ESDTNFTBurn";
pub const EVENT_ESDT_NFT_ADD_QUANTITY: &str = "ESDTNFTAddQuantity";
pub const EVENT_ESDT_LOCAL_BURN: &str = "ESDTLocalBurn";
pub const EVENT_ESDT_LOCAL_MINT: &str = "ESDTLocalMint";
pub const EVENT_ESDT_WIPE: &str = "ESDTWipe";

/// `signalError` topics marking a rejected meta-transaction.
pub const EVENT_TOPIC_INVALID_META_TRANSACTION: &str = "meta transaction is invalid";
pub const EVENT_TOPIC_INVALID_META_TRANSACTION_NOT_ENOUGH_GAS: &str =
    "meta transaction is invalid: not enough gas";

/// Built-in function names, matched against the first `@`-separated token of
/// a transaction's data field.
pub const BUILT_IN_FUNCTIONS: &[&str] = &[
    "ESDTTransfer",
    "ESDTNFTTransfer",
    "MultiESDTNFTTransfer",
    "ESDTLocalBurn",
    "ESDTLocalMint",
    "ESDTWipe",
    "ClaimDeveloperRewards",
    "SetGuardian",
    "GuardAccount",
    "UnGuardAccount",
    "SaveKeyValue",
];

pub const BUILT_IN_FUNCTION_CLAIM_DEVELOPER_REWARDS: &str = "ClaimDeveloperRewards";

/// Payload of the receipt that returns unspent gas to the fee payer.
pub const REFUND_GAS_MESSAGE: &str = "refundedGas";

pub const ARGUMENTS_SEPARATOR: char = '@';

/// Data prefix of the `signalError` event raised when value is sent to a
/// non-payable contract: `"@" + hex("sending value to non payable contract")`.
pub fn sending_value_to_non_payable_contract_data_prefix() -> String {
    format!(
        "{}{}",
        ARGUMENTS_SEPARATOR,
        hex::encode("sending value to non payable contract")
    )
}
