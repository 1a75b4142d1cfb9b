//! Reward contract ABI
//!
//! Every wallet action maps to one function of the deployed EVM reward
//! contract. We encode calldata here (4-byte Keccak selector followed by
//! 32-byte words) and hand it to the JS wallet layer, which signs and sends.

use sha3::{Digest, Keccak256};
use thiserror::Error;

/// ABI encoding/decoding failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("invalid address {0:?}")]
    InvalidAddress(String),
    #[error("return data is {len} bytes, expected at least {expected}")]
    Truncated { len: usize, expected: usize },
    #[error("word {index} does not fit in 128 bits")]
    Overflow { index: usize },
    #[error("return data is not hex: {0:?}")]
    InvalidHex(String),
}

/// 20-byte EVM account address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Parse `0x`-prefixed (or bare) 40-digit hex
    pub fn parse(s: &str) -> Result<Self, AbiError> {
        let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let bytes = decode_hex(hex).ok_or_else(|| AbiError::InvalidAddress(s.to_string()))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| AbiError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", encode_hex(&self.0))
    }
}

/// A single ABI argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    /// uint256 (values above u128 never occur in this game)
    Uint(u128),
    Address(Address),
    Bool(bool),
    String(String),
}

impl AbiValue {
    fn is_dynamic(&self) -> bool {
        matches!(self, AbiValue::String(_))
    }

    /// Static head word
    fn word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        match self {
            AbiValue::Uint(v) => word[16..].copy_from_slice(&v.to_be_bytes()),
            AbiValue::Address(a) => word[12..].copy_from_slice(&a.0),
            AbiValue::Bool(b) => word[31] = *b as u8,
            AbiValue::String(_) => {}
        }
        word
    }
}

fn uint_word(v: usize) -> [u8; 32] {
    AbiValue::Uint(v as u128).word()
}

/// Standard head/tail encoding of an argument list
pub fn encode_args(args: &[AbiValue]) -> Vec<u8> {
    let head_len = args.len() * 32;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for arg in args {
        if arg.is_dynamic() {
            head.extend_from_slice(&uint_word(head_len + tail.len()));
            if let AbiValue::String(s) = arg {
                let bytes = s.as_bytes();
                tail.extend_from_slice(&uint_word(bytes.len()));
                tail.extend_from_slice(bytes);
                let pad = (32 - bytes.len() % 32) % 32;
                tail.extend(std::iter::repeat_n(0u8, pad));
            }
        } else {
            head.extend_from_slice(&arg.word());
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// First four bytes of Keccak-256 of the canonical signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calls into the reward contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    SubmitGameScore { score: u64 },
    ClaimQuestReward { quest_id: u64 },
    BuyLifeline,
    UseLifeline,
    GetUserStats { user: Address },
    GetAvailableLives { user: Address },
    GetTokenBalance { user: Address },
    GetQuest { quest_id: u64 },
    GetQuestProgress { quest_id: u64, user: Address },
    GetTotalQuests,
    LifelineCost,
    // Admin
    CreateQuest {
        title: String,
        description: String,
        target: u64,
        reward: u128,
    },
    SetLifelineCost { cost: u128 },
    SetHtsToken { token: Address, enabled: bool },
}

impl ContractCall {
    pub fn function_name(&self) -> &'static str {
        match self {
            ContractCall::SubmitGameScore { .. } => "submitGameScore",
            ContractCall::ClaimQuestReward { .. } => "claimQuestReward",
            ContractCall::BuyLifeline => "buyLifeline",
            ContractCall::UseLifeline => "useLifeline",
            ContractCall::GetUserStats { .. } => "getUserStats",
            ContractCall::GetAvailableLives { .. } => "getAvailableLives",
            ContractCall::GetTokenBalance { .. } => "getTokenBalance",
            ContractCall::GetQuest { .. } => "getQuest",
            ContractCall::GetQuestProgress { .. } => "getQuestProgress",
            ContractCall::GetTotalQuests => "getTotalQuests",
            ContractCall::LifelineCost => "lifelineCost",
            ContractCall::CreateQuest { .. } => "createQuest",
            ContractCall::SetLifelineCost { .. } => "setLifelineCost",
            ContractCall::SetHtsToken { .. } => "setHTSToken",
        }
    }

    /// Canonical signature, e.g. `submitGameScore(uint256)`
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self
            .args()
            .iter()
            .map(|a| match a {
                AbiValue::Uint(_) => "uint256",
                AbiValue::Address(_) => "address",
                AbiValue::Bool(_) => "bool",
                AbiValue::String(_) => "string",
            })
            .collect();
        format!("{}({})", self.function_name(), params.join(","))
    }

    pub fn args(&self) -> Vec<AbiValue> {
        match self {
            ContractCall::SubmitGameScore { score } => vec![AbiValue::Uint(*score as u128)],
            ContractCall::ClaimQuestReward { quest_id } | ContractCall::GetQuest { quest_id } => {
                vec![AbiValue::Uint(*quest_id as u128)]
            }
            ContractCall::BuyLifeline
            | ContractCall::UseLifeline
            | ContractCall::GetTotalQuests
            | ContractCall::LifelineCost => Vec::new(),
            ContractCall::GetUserStats { user }
            | ContractCall::GetAvailableLives { user }
            | ContractCall::GetTokenBalance { user } => vec![AbiValue::Address(*user)],
            ContractCall::GetQuestProgress { quest_id, user } => {
                vec![AbiValue::Uint(*quest_id as u128), AbiValue::Address(*user)]
            }
            ContractCall::CreateQuest {
                title,
                description,
                target,
                reward,
            } => vec![
                AbiValue::String(title.clone()),
                AbiValue::String(description.clone()),
                AbiValue::Uint(*target as u128),
                AbiValue::Uint(*reward),
            ],
            ContractCall::SetLifelineCost { cost } => vec![AbiValue::Uint(*cost)],
            ContractCall::SetHtsToken { token, enabled } => {
                vec![AbiValue::Address(*token), AbiValue::Bool(*enabled)]
            }
        }
    }

    /// Read-only calls need no signature or gas
    pub fn is_view(&self) -> bool {
        matches!(
            self,
            ContractCall::GetUserStats { .. }
                | ContractCall::GetAvailableLives { .. }
                | ContractCall::GetTokenBalance { .. }
                | ContractCall::GetQuest { .. }
                | ContractCall::GetQuestProgress { .. }
                | ContractCall::GetTotalQuests
                | ContractCall::LifelineCost
        )
    }

    /// Payable call (lifelines are bought with native currency)
    pub fn is_payable(&self) -> bool {
        matches!(self, ContractCall::BuyLifeline)
    }

    pub fn selector(&self) -> [u8; 4] {
        selector(&self.signature())
    }

    /// Selector followed by the encoded arguments
    pub fn encode(&self) -> Vec<u8> {
        let mut data = self.selector().to_vec();
        data.extend_from_slice(&encode_args(&self.args()));
        data
    }

    pub fn calldata_hex(&self) -> String {
        format!("0x{}", encode_hex(&self.encode()))
    }
}

/// Raw bytes of a `0x`-prefixed (or bare) hex result string
pub fn decode_return_hex(s: &str) -> Result<Vec<u8>, AbiError> {
    let trimmed = s.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    decode_hex(hex).ok_or_else(|| AbiError::InvalidHex(s.to_string()))
}

/// Split return data into uint words
pub fn decode_uint_words(data: &[u8], count: usize) -> Result<Vec<u128>, AbiError> {
    let expected = count * 32;
    if data.len() < expected {
        return Err(AbiError::Truncated {
            len: data.len(),
            expected,
        });
    }
    data.chunks_exact(32)
        .take(count)
        .enumerate()
        .map(|(index, word)| {
            if word[..16].iter().any(|&b| b != 0) {
                return Err(AbiError::Overflow { index });
            }
            let mut low = [0u8; 16];
            low.copy_from_slice(&word[16..]);
            Ok(u128::from_be_bytes(low))
        })
        .collect()
}

/// Result of `getUserStats(address)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserStats {
    pub high_score: u128,
    pub games_played: u128,
    pub tokens_earned: u128,
    pub lifelines: u128,
}

impl UserStats {
    /// Decode the hex string a wallet layer returns for the view call
    pub fn from_return_hex(s: &str) -> Result<Self, AbiError> {
        Self::decode(&decode_return_hex(s)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let w = decode_uint_words(data, 4)?;
        Ok(Self {
            high_score: w[0],
            games_played: w[1],
            tokens_earned: w[2],
            lifelines: w[3],
        })
    }
}

pub fn encode_hex(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(DIGITS[(b >> 4) as usize] as char);
        out.push(DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}

/// Decode hex (optional `0x` is the caller's job); None on odd length or bad digit
pub fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    let nibble = |c: u8| -> Option<u8> {
        match c {
            b'0'..=b'9' => Some(c - b'0'),
            b'a'..=b'f' => Some(c - b'a' + 10),
            b'A'..=b'F' => Some(c - b'A' + 10),
            _ => None,
        }
    };
    s.as_bytes()
        .chunks_exact(2)
        .map(|pair| Some(nibble(pair[0])? << 4 | nibble(pair[1])?))
        .collect()
}
