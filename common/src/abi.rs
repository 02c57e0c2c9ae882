//! Contract ABI encoding
//!
//! Covers the subset of the Solidity ABI the devnet contracts need: static
//! `address`, `uintN` and `bool` words plus dynamic `string` and `bytes`,
//! function selectors, event topics and `Error(string)` revert payloads.
//!
//! Declarations use the human-readable form:
//!
//! ```text
//! function transfer(address to, uint256 amount)
//! function balanceOf(address account) view returns (uint256)
//! event Transfer(address indexed from, address indexed to, uint256 value)
//! ```

use lazy_static::lazy_static;
use primitive_types::U256;
use std::fmt::{self, Display, Formatter};

use crate::{
    crypto::{keccak256, Address, Hash},
    error::AbiError,
};

pub const WORD_SIZE: usize = 32;
pub const SELECTOR_SIZE: usize = 4;

pub type Selector = [u8; SELECTOR_SIZE];

lazy_static! {
    /// Selector of `Error(string)`, the standard revert payload
    pub static ref ERROR_SELECTOR: Selector = selector("Error(string)");
}

/// First four bytes of the keccak256 of a canonical signature
pub fn selector(signature: &str) -> Selector {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; SELECTOR_SIZE];
    out.copy_from_slice(&hash.as_bytes()[..SELECTOR_SIZE]);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Uint(usize),
    Bool,
    String,
    Bytes,
}

impl ParamType {
    pub fn parse(s: &str) -> Result<Self, AbiError> {
        let kind = match s {
            "address" => ParamType::Address,
            "bool" => ParamType::Bool,
            "string" => ParamType::String,
            "bytes" => ParamType::Bytes,
            "uint" => ParamType::Uint(256),
            other => {
                let bits = other
                    .strip_prefix("uint")
                    .and_then(|bits| bits.parse::<usize>().ok())
                    .filter(|bits| *bits > 0 && *bits <= 256 && bits % 8 == 0)
                    .ok_or_else(|| AbiError::UnknownType(other.to_string()))?;
                ParamType::Uint(bits)
            }
        };
        Ok(kind)
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, ParamType::String | ParamType::Bytes)
    }
}

impl Display for ParamType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Address => write!(f, "address"),
            ParamType::Uint(bits) => write!(f, "uint{}", bits),
            ParamType::Bool => write!(f, "bool"),
            ParamType::String => write!(f, "string"),
            ParamType::Bytes => write!(f, "bytes"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Address(Address),
    Uint(U256),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn matches(&self, kind: &ParamType) -> bool {
        match (self, kind) {
            (Value::Address(_), ParamType::Address) => true,
            (Value::Uint(value), ParamType::Uint(bits)) => value.bits() <= *bits,
            (Value::Bool(_), ParamType::Bool) => true,
            (Value::String(_), ParamType::String) => true,
            (Value::Bytes(_), ParamType::Bytes) => true,
            _ => false,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            Value::Address(address) => Some(*address),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Value::Uint(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Address(address) => write!(f, "{}", address),
            Value::Uint(value) => write!(f, "{}", value),
            Value::Bool(value) => write!(f, "{}", value),
            Value::String(value) => write!(f, "{:?}", value),
            Value::Bytes(value) => write!(f, "0x{}", hex::encode(value)),
        }
    }
}

impl From<Address> for Value {
    fn from(value: Address) -> Self {
        Value::Address(value)
    }
}

impl From<U256> for Value {
    fn from(value: U256) -> Self {
        Value::Uint(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Uint(U256::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

// ===== ENCODING =====

fn uint_word(value: U256) -> [u8; WORD_SIZE] {
    value.to_big_endian()
}

fn static_word(value: &Value) -> [u8; WORD_SIZE] {
    match value {
        Value::Address(address) => address.to_word().to_bytes(),
        Value::Uint(value) => uint_word(*value),
        Value::Bool(value) => uint_word(U256::from(*value as u8)),
        // Dynamic values never reach the head as a static word
        Value::String(_) | Value::Bytes(_) => [0u8; WORD_SIZE],
    }
}

fn encode_dynamic(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&uint_word(U256::from(bytes.len())));
    out.extend_from_slice(bytes);
    let padding = (WORD_SIZE - bytes.len() % WORD_SIZE) % WORD_SIZE;
    out.extend(std::iter::repeat(0u8).take(padding));
}

/// Head/tail encode a list of values
pub fn encode(values: &[Value]) -> Vec<u8> {
    let head_size = values.len() * WORD_SIZE;
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for value in values {
        match value {
            Value::String(s) => {
                head.extend_from_slice(&uint_word(U256::from(head_size + tail.len())));
                encode_dynamic(s.as_bytes(), &mut tail);
            }
            Value::Bytes(b) => {
                head.extend_from_slice(&uint_word(U256::from(head_size + tail.len())));
                encode_dynamic(b, &mut tail);
            }
            other => head.extend_from_slice(&static_word(other)),
        }
    }

    head.extend(tail);
    head
}

// ===== DECODING =====

fn read_word(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    data.get(offset..offset + WORD_SIZE)
        .ok_or(AbiError::DataTooShort {
            need: offset + WORD_SIZE,
            have: data.len(),
        })
}

fn word_to_usize(word: &[u8], position: usize) -> Result<usize, AbiError> {
    let value = U256::from_big_endian(word);
    if value > U256::from(u32::MAX) {
        return Err(AbiError::InvalidOffset(position));
    }
    Ok(value.as_usize())
}

fn decode_static(kind: &ParamType, word: &[u8]) -> Result<Value, AbiError> {
    match kind {
        ParamType::Address => {
            if word[..12].iter().any(|b| *b != 0) {
                return Err(AbiError::OutOfRange(kind.to_string()));
            }
            let address = Address::from_slice(&word[12..])
                .map_err(|_| AbiError::OutOfRange(kind.to_string()))?;
            Ok(Value::Address(address))
        }
        ParamType::Uint(bits) => {
            let value = U256::from_big_endian(word);
            if value.bits() > *bits {
                return Err(AbiError::OutOfRange(kind.to_string()));
            }
            Ok(Value::Uint(value))
        }
        ParamType::Bool => {
            let value = U256::from_big_endian(word);
            if value > U256::one() {
                return Err(AbiError::OutOfRange(kind.to_string()));
            }
            Ok(Value::Bool(value == U256::one()))
        }
        ParamType::String | ParamType::Bytes => Err(AbiError::OutOfRange(kind.to_string())),
    }
}

fn decode_dynamic(kind: &ParamType, data: &[u8], head_position: usize) -> Result<Value, AbiError> {
    let offset = word_to_usize(read_word(data, head_position)?, head_position)?;
    let len = word_to_usize(read_word(data, offset)?, offset)?;
    let start = offset + WORD_SIZE;
    let bytes = data.get(start..start + len).ok_or(AbiError::DataTooShort {
        need: start + len,
        have: data.len(),
    })?;

    match kind {
        ParamType::String => String::from_utf8(bytes.to_vec())
            .map(Value::String)
            .map_err(|_| AbiError::InvalidUtf8),
        _ => Ok(Value::Bytes(bytes.to_vec())),
    }
}

/// Decode head/tail encoded data against the expected types
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Value>, AbiError> {
    types
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let position = i * WORD_SIZE;
            if kind.is_dynamic() {
                decode_dynamic(kind, data, position)
            } else {
                decode_static(kind, read_word(data, position)?)
            }
        })
        .collect()
}

// ===== REVERT REASONS =====

/// Encode a reason string as `Error(string)` revert data
pub fn encode_revert_reason(reason: &str) -> Vec<u8> {
    let mut out = ERROR_SELECTOR.to_vec();
    out.extend(encode(&[Value::String(reason.to_string())]));
    out
}

/// Extract the reason string from `Error(string)` revert data
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if data.len() < SELECTOR_SIZE || data[..SELECTOR_SIZE] != ERROR_SELECTOR[..] {
        return None;
    }

    decode(&[ParamType::String], &data[SELECTOR_SIZE..])
        .ok()?
        .pop()?
        .into_string()
}

// ===== DECLARATIONS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamType,
    pub indexed: bool,
}

// Split `name(params) rest` into its three parts
fn split_declaration(decl: &str) -> Result<(&str, &str, &str), AbiError> {
    let invalid = || AbiError::InvalidDeclaration(decl.to_string());
    let open = decl.find('(').ok_or_else(invalid)?;
    let close = decl[open..].find(')').map(|i| open + i).ok_or_else(invalid)?;

    let name = decl[..open].trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(invalid());
    }

    Ok((name, &decl[open + 1..close], decl[close + 1..].trim()))
}

fn parse_params(list: &str, allow_indexed: bool) -> Result<Vec<Param>, AbiError> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }

    list.split(',')
        .map(|part| {
            let mut tokens = part.split_whitespace();
            let kind = tokens
                .next()
                .ok_or_else(|| AbiError::InvalidDeclaration(list.to_string()))
                .and_then(ParamType::parse)?;

            let mut indexed = false;
            let mut name = String::new();
            for token in tokens {
                match token {
                    "indexed" if allow_indexed => indexed = true,
                    "memory" | "calldata" => {}
                    other if name.is_empty() => name = other.to_string(),
                    _ => return Err(AbiError::InvalidDeclaration(part.trim().to_string())),
                }
            }

            Ok(Param {
                name,
                kind,
                indexed,
            })
        })
        .collect()
}

fn canonical_signature(name: &str, params: &[Param]) -> String {
    let types: Vec<String> = params.iter().map(|p| p.kind.to_string()).collect();
    format!("{}({})", name, types.join(","))
}

fn check_args(params: &[Param], args: &[Value]) -> Result<(), AbiError> {
    if params.len() != args.len() {
        return Err(AbiError::ArgumentCount {
            expected: params.len(),
            got: args.len(),
        });
    }

    for (index, (param, arg)) in params.iter().zip(args).enumerate() {
        if !arg.matches(&param.kind) {
            return Err(AbiError::TypeMismatch {
                index,
                expected: param.kind.to_string(),
            });
        }
    }
    Ok(())
}

fn kinds(params: &[Param]) -> Vec<ParamType> {
    params.iter().map(|p| p.kind).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    pub state_mutability: StateMutability,
}

impl Function {
    pub fn parse(decl: &str) -> Result<Self, AbiError> {
        let decl = decl.trim();
        let body = decl.strip_prefix("function ").unwrap_or(decl);
        let (name, params, rest) = split_declaration(body)?;
        let inputs = parse_params(params, false)?;

        let (modifiers, outputs) = match rest.find("returns") {
            Some(at) => {
                let invalid = || AbiError::InvalidDeclaration(decl.to_string());
                let list = &rest[at + "returns".len()..];
                let open = list.find('(').ok_or_else(invalid)?;
                let close = list.rfind(')').filter(|c| *c > open).ok_or_else(invalid)?;
                (&rest[..at], parse_params(&list[open + 1..close], false)?)
            }
            None => (rest, Vec::new()),
        };

        let mut state_mutability = StateMutability::NonPayable;
        for token in modifiers.split_whitespace() {
            state_mutability = match token {
                "view" => StateMutability::View,
                "pure" => StateMutability::Pure,
                "payable" => StateMutability::Payable,
                "nonpayable" => StateMutability::NonPayable,
                "external" | "public" => state_mutability,
                _ => return Err(AbiError::InvalidDeclaration(decl.to_string())),
            };
        }

        Ok(Self {
            name: name.to_string(),
            inputs,
            outputs,
            state_mutability,
        })
    }

    pub fn signature(&self) -> String {
        canonical_signature(&self.name, &self.inputs)
    }

    pub fn selector(&self) -> Selector {
        selector(&self.signature())
    }

    pub fn is_read_only(&self) -> bool {
        matches!(
            self.state_mutability,
            StateMutability::View | StateMutability::Pure
        )
    }

    /// Selector followed by the encoded arguments
    pub fn encode_input(&self, args: &[Value]) -> Result<Vec<u8>, AbiError> {
        check_args(&self.inputs, args)?;
        let mut out = self.selector().to_vec();
        out.extend(encode(args));
        Ok(out)
    }

    /// Decode call arguments, `data` excludes the selector
    pub fn decode_input(&self, data: &[u8]) -> Result<Vec<Value>, AbiError> {
        decode(&kinds(&self.inputs), data)
    }

    pub fn encode_output(&self, values: &[Value]) -> Result<Vec<u8>, AbiError> {
        check_args(&self.outputs, values)?;
        Ok(encode(values))
    }

    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<Value>, AbiError> {
        decode(&kinds(&self.outputs), data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub inputs: Vec<Param>,
}

impl Event {
    pub fn parse(decl: &str) -> Result<Self, AbiError> {
        let decl = decl.trim();
        let body = decl.strip_prefix("event ").unwrap_or(decl);
        let (name, params, rest) = split_declaration(body)?;
        if !rest.is_empty() {
            return Err(AbiError::InvalidDeclaration(decl.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            inputs: parse_params(params, true)?,
        })
    }

    pub fn signature(&self) -> String {
        canonical_signature(&self.name, &self.inputs)
    }

    /// First topic of every log emitted for this event
    pub fn topic(&self) -> Hash {
        keccak256(self.signature().as_bytes())
    }

    /// Split values into topics and data.
    /// Indexed dynamic values are stored as the keccak256 of their content.
    pub fn encode_log(&self, values: &[Value]) -> Result<(Vec<Hash>, Vec<u8>), AbiError> {
        check_args(&self.inputs, values)?;

        let mut topics = vec![self.topic()];
        let mut data = Vec::new();
        for (param, value) in self.inputs.iter().zip(values) {
            if param.indexed {
                let topic = match value {
                    Value::String(s) => keccak256(s.as_bytes()),
                    Value::Bytes(b) => keccak256(b),
                    other => Hash::new(static_word(other)),
                };
                topics.push(topic);
            } else {
                data.push(value.clone());
            }
        }

        Ok((topics, encode(&data)))
    }

    /// Decode a log back into values in declaration order
    pub fn decode_log(&self, topics: &[Hash], data: &[u8]) -> Result<Vec<Value>, AbiError> {
        let indexed = self.inputs.iter().filter(|p| p.indexed).count();
        if topics.len() != indexed + 1 || topics[0] != self.topic() {
            return Err(AbiError::LogMismatch(self.signature()));
        }

        let data_kinds: Vec<ParamType> = self
            .inputs
            .iter()
            .filter(|p| !p.indexed)
            .map(|p| p.kind)
            .collect();
        let mut data_values = decode(&data_kinds, data)?.into_iter();
        let mut topic_values = topics[1..].iter();

        self.inputs
            .iter()
            .map(|param| {
                if param.indexed {
                    let topic = topic_values
                        .next()
                        .ok_or_else(|| AbiError::LogMismatch(self.signature()))?;
                    if param.kind.is_dynamic() {
                        Ok(Value::Bytes(topic.as_bytes().to_vec()))
                    } else {
                        decode_static(&param.kind, topic.as_bytes())
                    }
                } else {
                    data_values
                        .next()
                        .ok_or_else(|| AbiError::LogMismatch(self.signature()))
                }
            })
            .collect()
    }
}

/// Set of function and event declarations of a contract
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Abi {
    functions: Vec<Function>,
    events: Vec<Event>,
}

impl Abi {
    pub fn parse(decls: &[&str]) -> Result<Self, AbiError> {
        let mut abi = Abi::default();
        for decl in decls {
            let trimmed = decl.trim();
            if trimmed.starts_with("event ") {
                abi.events.push(Event::parse(trimmed)?);
            } else if trimmed.starts_with("function ") {
                abi.functions.push(Function::parse(trimmed)?);
            } else {
                return Err(AbiError::InvalidDeclaration(trimmed.to_string()));
            }
        }
        Ok(abi)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn function(&self, name: &str) -> Result<&Function, AbiError> {
        self.functions
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| AbiError::UnknownFunction(name.to_string()))
    }

    pub fn function_by_selector(&self, selector: &Selector) -> Result<&Function, AbiError> {
        self.functions
            .iter()
            .find(|f| f.selector() == *selector)
            .ok_or(AbiError::UnknownSelector(*selector))
    }

    pub fn event(&self, name: &str) -> Result<&Event, AbiError> {
        self.events
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| AbiError::UnknownEvent(name.to_string()))
    }

    pub fn encode_function_data(&self, name: &str, args: &[Value]) -> Result<Vec<u8>, AbiError> {
        self.function(name)?.encode_input(args)
    }

    pub fn decode_function_result(&self, name: &str, data: &[u8]) -> Result<Vec<Value>, AbiError> {
        self.function(name)?.decode_output(data)
    }
}
