use indexmap::IndexMap;
use lazy_static::lazy_static;
use primitive_types::U256;
use tokenbench_common::{
    abi::{self, selector, Abi, ParamType, Selector, Value, SELECTOR_SIZE},
    crypto::{keccak256, Address, Hash},
    error::AbiError,
};

use super::{CallContext, ContractArtifact, NativeContract};
use crate::core::error::ExecutionError;

pub const TOKEN_NAME: &str = "My Hardhat Token";
pub const TOKEN_SYMBOL: &str = "MHT";
pub const TOKEN_TOTAL_SUPPLY: u64 = 1_000_000;

const ARTIFACT_NAME: &str = "Token";

const DECLARATIONS: &[&str] = &[
    "function name() view returns (string)",
    "function symbol() view returns (string)",
    "function totalSupply() view returns (uint256)",
    "function owner() view returns (address)",
    "function balanceOf(address account) view returns (uint256)",
    "function transfer(address to, uint256 amount)",
    "event Transfer(address indexed from, address indexed to, uint256 value)",
];

lazy_static! {
    static ref NAME: Selector = selector("name()");
    static ref SYMBOL: Selector = selector("symbol()");
    static ref TOTAL_SUPPLY: Selector = selector("totalSupply()");
    static ref OWNER: Selector = selector("owner()");
    static ref BALANCE_OF: Selector = selector("balanceOf(address)");
    static ref TRANSFER: Selector = selector("transfer(address,uint256)");
    static ref TRANSFER_TOPIC: Hash = keccak256(b"Transfer(address,address,uint256)");
}

/// Fixed-supply, non-mintable token.
///
/// The deployer becomes the owner and receives the whole supply.
/// There are no allowances: only the holder can move its balance.
#[derive(Debug, Clone)]
pub struct Token {
    name: String,
    symbol: String,
    total_supply: U256,
    owner: Address,
    balances: IndexMap<Address, U256>,
}

impl Token {
    pub fn artifact() -> Result<ContractArtifact, AbiError> {
        Ok(ContractArtifact::new(
            ARTIFACT_NAME,
            Abi::parse(DECLARATIONS)?,
            Vec::new(),
            Self::construct,
        ))
    }

    fn construct(
        ctx: &mut CallContext<'_>,
        args: &[u8],
    ) -> Result<Box<dyn NativeContract>, ExecutionError> {
        ctx.require_non_payable()?;
        if !args.is_empty() {
            return Err(ExecutionError::Revert(Vec::new()));
        }

        let owner = *ctx.caller();
        let total_supply = U256::from(TOKEN_TOTAL_SUPPLY);
        // name, symbol, totalSupply, owner and the owner balance
        for _ in 0..5 {
            ctx.sstore(true)?;
        }

        let mut balances = IndexMap::new();
        balances.insert(owner, total_supply);

        Ok(Box::new(Self {
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            total_supply,
            owner,
            balances,
        }))
    }

    pub fn balance_of(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn set_balance(&mut self, account: Address, balance: U256) {
        if balance.is_zero() {
            self.balances.shift_remove(&account);
        } else {
            self.balances.insert(account, balance);
        }
    }

    fn transfer(
        &mut self,
        ctx: &mut CallContext<'_>,
        to: Address,
        amount: U256,
    ) -> Result<Vec<u8>, ExecutionError> {
        let from = *ctx.caller();

        ctx.sload()?;
        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(ExecutionError::reason("Not enough tokens"));
        }

        ctx.sstore(from_balance.is_zero())?;
        self.set_balance(from, from_balance - amount);

        ctx.sload()?;
        let to_balance = self.balance_of(&to);
        ctx.sstore(to_balance.is_zero())?;
        self.set_balance(to, to_balance + amount);

        ctx.emit(
            vec![*TRANSFER_TOPIC, from.to_word(), to.to_word()],
            amount.to_big_endian().to_vec(),
        )?;

        Ok(Vec::new())
    }
}

// Malformed arguments revert without data, like a failed ABI decode in the EVM
fn decode_args(types: &[ParamType], data: &[u8]) -> Result<Vec<Value>, ExecutionError> {
    abi::decode(types, data).map_err(|_| ExecutionError::Revert(Vec::new()))
}

impl NativeContract for Token {
    fn artifact_name(&self) -> &'static str {
        ARTIFACT_NAME
    }

    fn call(&mut self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, ExecutionError> {
        if input.len() < SELECTOR_SIZE {
            return Err(ExecutionError::Revert(Vec::new()));
        }
        ctx.require_non_payable()?;

        let (head, args) = input.split_at(SELECTOR_SIZE);
        let mut selector = [0u8; SELECTOR_SIZE];
        selector.copy_from_slice(head);

        if selector == *NAME {
            ctx.sload()?;
            Ok(abi::encode(&[Value::from(self.name.as_str())]))
        } else if selector == *SYMBOL {
            ctx.sload()?;
            Ok(abi::encode(&[Value::from(self.symbol.as_str())]))
        } else if selector == *TOTAL_SUPPLY {
            ctx.sload()?;
            Ok(abi::encode(&[Value::Uint(self.total_supply)]))
        } else if selector == *OWNER {
            ctx.sload()?;
            Ok(abi::encode(&[Value::Address(self.owner)]))
        } else if selector == *BALANCE_OF {
            let account = decode_args(&[ParamType::Address], args)?
                .pop()
                .and_then(|value| value.as_address())
                .ok_or_else(|| ExecutionError::Revert(Vec::new()))?;
            ctx.sload()?;
            Ok(abi::encode(&[Value::Uint(self.balance_of(&account))]))
        } else if selector == *TRANSFER {
            let mut values = decode_args(&[ParamType::Address, ParamType::Uint(256)], args)?;
            let amount = values.pop().and_then(|value| value.as_uint());
            let to = values.pop().and_then(|value| value.as_address());
            match (to, amount) {
                (Some(to), Some(amount)) => self.transfer(ctx, to, amount),
                _ => Err(ExecutionError::Revert(Vec::new())),
            }
        } else {
            Err(ExecutionError::Revert(Vec::new()))
        }
    }

    fn box_clone(&self) -> Box<dyn NativeContract> {
        Box::new(self.clone())
    }
}
