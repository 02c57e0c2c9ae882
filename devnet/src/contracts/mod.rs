//! Contracts executed natively by the devnet.
//!
//! A contract is deployed by sending a creation transaction whose data is the
//! artifact bytecode (`NATIVE_CODE_MAGIC` followed by the keccak256 of the
//! artifact name) with the ABI-encoded constructor arguments appended. The
//! registry resolves the bytecode back to the artifact and runs its
//! constructor. Calls then go through [`NativeContract::call`] with the raw
//! calldata, so callers only ever see ABI-encoded inputs, outputs, logs and
//! revert payloads.

mod token;

use indexmap::IndexMap;
use log::debug;
use primitive_types::U256;
use std::{fmt, sync::Arc};
use tokenbench_common::{
    abi::{self, Abi, ParamType, Value},
    config::{
        LOG_DATA_GAS, LOG_GAS, LOG_TOPIC_GAS, NATIVE_CODE_MAGIC, STORAGE_READ_GAS,
        STORAGE_SET_GAS, STORAGE_UPDATE_GAS,
    },
    crypto::{keccak256, Address, Hash},
    error::AbiError,
    transaction::Log,
};

use crate::core::{error::ExecutionError, gas::GasMeter};

pub use token::{Token, TOKEN_NAME, TOKEN_SYMBOL, TOKEN_TOTAL_SUPPLY};

/// Length of the bytecode of a native artifact
pub const NATIVE_CODE_SIZE: usize = NATIVE_CODE_MAGIC.len() + 32;

/// Environment of a single contract invocation.
///
/// Storage accesses and logs are metered through the context so a contract
/// cannot forget to pay for them.
pub struct CallContext<'a> {
    caller: Address,
    address: Address,
    value: U256,
    gas: &'a mut GasMeter,
    logs: &'a mut Vec<Log>,
}

impl<'a> CallContext<'a> {
    pub fn new(
        caller: Address,
        address: Address,
        value: U256,
        gas: &'a mut GasMeter,
        logs: &'a mut Vec<Log>,
    ) -> Self {
        Self {
            caller,
            address,
            value,
            gas,
            logs,
        }
    }

    pub fn caller(&self) -> &Address {
        &self.caller
    }

    /// Address of the executing contract
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn charge(&mut self, gas: u64) -> Result<(), ExecutionError> {
        self.gas.charge(gas)
    }

    pub fn sload(&mut self) -> Result<(), ExecutionError> {
        self.gas.charge(STORAGE_READ_GAS)
    }

    // Writing a zero slot costs more than updating a live one
    pub fn sstore(&mut self, was_zero: bool) -> Result<(), ExecutionError> {
        self.gas.charge(if was_zero {
            STORAGE_SET_GAS
        } else {
            STORAGE_UPDATE_GAS
        })
    }

    pub fn emit(&mut self, topics: Vec<Hash>, data: Vec<u8>) -> Result<(), ExecutionError> {
        let cost = LOG_GAS + LOG_TOPIC_GAS * topics.len() as u64 + LOG_DATA_GAS * data.len() as u64;
        self.gas.charge(cost)?;
        self.logs.push(Log::new(self.address, topics, data));
        Ok(())
    }

    /// Revert unless the call carries no native coin
    pub fn require_non_payable(&self) -> Result<(), ExecutionError> {
        if self.value.is_zero() {
            Ok(())
        } else {
            Err(ExecutionError::Revert(Vec::new()))
        }
    }
}

/// Deployed contract instance living in the world state
pub trait NativeContract: Send + Sync {
    fn artifact_name(&self) -> &'static str;

    /// Execute raw calldata and return the ABI-encoded output.
    /// Any error discards the changes made by the call.
    fn call(&mut self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, ExecutionError>;

    fn box_clone(&self) -> Box<dyn NativeContract>;
}

impl Clone for Box<dyn NativeContract> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

impl fmt::Debug for dyn NativeContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeContract({})", self.artifact_name())
    }
}

pub type Constructor =
    fn(&mut CallContext<'_>, &[u8]) -> Result<Box<dyn NativeContract>, ExecutionError>;

/// Compiled form of a contract: its interface and how to construct it
#[derive(Clone)]
pub struct ContractArtifact {
    name: &'static str,
    abi: Arc<Abi>,
    constructor_inputs: Vec<ParamType>,
    constructor: Constructor,
}

impl ContractArtifact {
    pub fn new(
        name: &'static str,
        abi: Abi,
        constructor_inputs: Vec<ParamType>,
        constructor: Constructor,
    ) -> Self {
        Self {
            name,
            abi: Arc::new(abi),
            constructor_inputs,
            constructor,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn abi(&self) -> &Arc<Abi> {
        &self.abi
    }

    pub fn code_hash(&self) -> Hash {
        keccak256(self.name.as_bytes())
    }

    pub fn bytecode(&self) -> Vec<u8> {
        let mut code = NATIVE_CODE_MAGIC.to_vec();
        code.extend_from_slice(self.code_hash().as_bytes());
        code
    }

    /// Data of a creation transaction for this artifact
    pub fn deployment_data(&self, args: &[Value]) -> Result<Vec<u8>, AbiError> {
        if args.len() != self.constructor_inputs.len() {
            return Err(AbiError::ArgumentCount {
                expected: self.constructor_inputs.len(),
                got: args.len(),
            });
        }
        for (index, (value, kind)) in args.iter().zip(&self.constructor_inputs).enumerate() {
            if !value.matches(kind) {
                return Err(AbiError::TypeMismatch {
                    index,
                    expected: kind.to_string(),
                });
            }
        }

        let mut data = self.bytecode();
        data.extend(abi::encode(args));
        Ok(data)
    }

    pub fn construct(
        &self,
        ctx: &mut CallContext<'_>,
        args: &[u8],
    ) -> Result<Box<dyn NativeContract>, ExecutionError> {
        (self.constructor)(ctx, args)
    }
}

impl fmt::Debug for ContractArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractArtifact")
            .field("name", &self.name)
            .field("code_hash", &self.code_hash())
            .finish()
    }
}

/// Artifacts the devnet can deploy, keyed by code hash
#[derive(Debug, Clone, Default)]
pub struct ArtifactRegistry {
    artifacts: IndexMap<Hash, ContractArtifact>,
}

impl ArtifactRegistry {
    /// Registry holding every contract shipped with the devnet
    pub fn builtin() -> Result<Self, AbiError> {
        let mut registry = Self::default();
        registry.register(Token::artifact()?);
        Ok(registry)
    }

    pub fn register(&mut self, artifact: ContractArtifact) {
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Registering artifact {} with code hash {}",
                artifact.name(),
                artifact.code_hash()
            );
        }
        self.artifacts.insert(artifact.code_hash(), artifact);
    }

    pub fn get(&self, name: &str) -> Option<&ContractArtifact> {
        self.artifacts.get(&keccak256(name.as_bytes()))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.artifacts.values().map(|artifact| artifact.name())
    }

    /// Split creation data into its artifact and the encoded constructor arguments
    pub fn resolve<'a>(&self, data: &'a [u8]) -> Option<(&ContractArtifact, &'a [u8])> {
        if data.len() < NATIVE_CODE_SIZE || data[..NATIVE_CODE_MAGIC.len()] != NATIVE_CODE_MAGIC {
            return None;
        }

        let code_hash = Hash::from_slice(&data[NATIVE_CODE_MAGIC.len()..NATIVE_CODE_SIZE]).ok()?;
        self.artifacts
            .get(&code_hash)
            .map(|artifact| (artifact, &data[NATIVE_CODE_SIZE..]))
    }
}
