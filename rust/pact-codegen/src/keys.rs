//! Wire key allocation.
//!
//! Every generated message type gets an integer key that discriminates it on
//! the wire. Keys are a pure function of the contract's operation list:
//!
//! - keys `1..=8` are the system messages, in [`SystemMessage::ALL`] order;
//! - keys `9..=15` are reserved;
//! - from [`CodegenOptions::first_operation_key`] on, every declared operation
//!   gets a contiguous block, in declaration order.
//!
//! A one-way block is one key. A request/response block holds the request,
//! response and fault keys, then one page key per declared stream direction
//! (input before output). Operations skipped by validation still consume their
//! block so that one broken operation never renumbers its siblings.

use std::fmt;

use pact_contract::{ContractDeclaration, OperationDeclaration};

use crate::{CodegenOptions, CompileError};

/// Highest key reserved for system messages.
pub const RESERVED_SYSTEM_KEYS: u32 = 15;

/// Wire discriminator of a generated message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageKey(pub u32);

impl MessageKey {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection-lifecycle and stream-control messages, shared by every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemMessage {
    Login,
    Logout,
    Heartbeat,
    CancelRequest,
    PageAck,
    StreamCancel,
    StreamClose,
    StreamCloseAck,
}

impl SystemMessage {
    pub const ALL: [SystemMessage; 8] = [
        SystemMessage::Login,
        SystemMessage::Logout,
        SystemMessage::Heartbeat,
        SystemMessage::CancelRequest,
        SystemMessage::PageAck,
        SystemMessage::StreamCancel,
        SystemMessage::StreamClose,
        SystemMessage::StreamCloseAck,
    ];

    pub fn key(self) -> MessageKey {
        let key = match self {
            SystemMessage::Login => 1,
            SystemMessage::Logout => 2,
            SystemMessage::Heartbeat => 3,
            SystemMessage::CancelRequest => 4,
            SystemMessage::PageAck => 5,
            SystemMessage::StreamCancel => 6,
            SystemMessage::StreamClose => 7,
            SystemMessage::StreamCloseAck => 8,
        };
        MessageKey(key)
    }

    /// Generated type name.
    pub fn name(self) -> &'static str {
        match self {
            SystemMessage::Login => "Login",
            SystemMessage::Logout => "Logout",
            SystemMessage::Heartbeat => "Heartbeat",
            SystemMessage::CancelRequest => "CancelRequest",
            SystemMessage::PageAck => "PageAck",
            SystemMessage::StreamCancel => "StreamCancel",
            SystemMessage::StreamClose => "StreamClose",
            SystemMessage::StreamCloseAck => "StreamCloseAck",
        }
    }

    /// The four messages driving the stream window and teardown handshake.
    pub fn is_stream_control(self) -> bool {
        matches!(
            self,
            SystemMessage::PageAck
                | SystemMessage::StreamCancel
                | SystemMessage::StreamClose
                | SystemMessage::StreamCloseAck
        )
    }
}

/// Keys granted to one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKeys {
    OneWay {
        message: MessageKey,
    },
    RequestResponse {
        request: MessageKey,
        response: MessageKey,
        fault: MessageKey,
        input_page: Option<MessageKey>,
        output_page: Option<MessageKey>,
    },
}

impl OperationKeys {
    /// Keys of this block in ascending order.
    pub fn keys(&self) -> Vec<MessageKey> {
        match *self {
            OperationKeys::OneWay { message } => vec![message],
            OperationKeys::RequestResponse {
                request,
                response,
                fault,
                input_page,
                output_page,
            } => {
                let mut keys = vec![request, response, fault];
                keys.extend(input_page);
                keys.extend(output_page);
                keys
            }
        }
    }

    /// The key a caller sends: the one-way message or the request.
    pub fn outbound(&self) -> MessageKey {
        match *self {
            OperationKeys::OneWay { message } => message,
            OperationKeys::RequestResponse { request, .. } => request,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationKeyBlock {
    pub operation: String,
    pub first: MessageKey,
    pub keys: OperationKeys,
}

impl OperationKeyBlock {
    /// Number of keys in the block.
    pub fn size(&self) -> u32 {
        self.keys.keys().len() as u32
    }
}

/// Every key allocated for a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTable {
    operations: Vec<OperationKeyBlock>,
}

impl KeyTable {
    pub fn system(&self, message: SystemMessage) -> MessageKey {
        message.key()
    }

    /// Block of the operation at `index` in declaration order.
    pub fn operation(&self, index: usize) -> Option<&OperationKeyBlock> {
        self.operations.get(index)
    }

    pub fn operations(&self) -> &[OperationKeyBlock] {
        &self.operations
    }

    /// Every allocated key, system block first, ascending.
    pub fn all(&self) -> Vec<MessageKey> {
        SystemMessage::ALL
            .iter()
            .map(|m| m.key())
            .chain(self.operations.iter().flat_map(|b| b.keys.keys()))
            .collect()
    }

    /// Highest allocated key.
    pub fn last(&self) -> MessageKey {
        self.all()
            .into_iter()
            .max()
            .unwrap_or(SystemMessage::StreamCloseAck.key())
    }
}

/// Number of keys an operation's block needs.
fn block_len(operation: &OperationDeclaration) -> u32 {
    if operation.kind().is_one_way() {
        1
    } else {
        3 + operation.stream_directions() as u32
    }
}

/// Allocate keys for every operation of `contract`.
pub fn allocate(
    contract: &ContractDeclaration,
    options: &CodegenOptions,
) -> Result<KeyTable, CompileError> {
    let mut next = u64::from(options.effective_first_operation_key());
    let limit = options.key_space_limit;
    let mut operations = Vec::with_capacity(contract.operations().len());

    for operation in contract.operations() {
        let len = block_len(operation);
        let last = next + u64::from(len) - 1;
        if last > u64::from(limit) {
            return Err(CompileError::KeySpaceExhausted {
                operation: operation.name().to_string(),
                needed: last,
                limit,
            });
        }

        // Bounded by `limit` above.
        let first = next as u32;
        let keys = if operation.kind().is_one_way() {
            OperationKeys::OneWay {
                message: MessageKey(first),
            }
        } else {
            let mut slot = first + 3;
            let mut page = |present: bool| {
                present.then(|| {
                    let key = MessageKey(slot);
                    slot += 1;
                    key
                })
            };
            let input_page = page(operation.input_stream().is_some());
            let output_page = page(operation.output_stream().is_some());
            OperationKeys::RequestResponse {
                request: MessageKey(first),
                response: MessageKey(first + 1),
                fault: MessageKey(first + 2),
                input_page,
                output_page,
            }
        };

        tracing::trace!(operation = operation.name(), first, len, "allocated key block");
        operations.push(OperationKeyBlock {
            operation: operation.name().to_string(),
            first: MessageKey(first),
            keys,
        });
        next = last + 1;
    }

    tracing::debug!(
        operations = operations.len(),
        next_free = next,
        "key allocation complete"
    );
    Ok(KeyTable { operations })
}

#[cfg(test)]
mod tests {
    use pact_contract::{ContractDeclaration, OperationDeclaration, TypeRef};

    use super::*;

    fn contract() -> ContractDeclaration {
        ContractDeclaration::builder("acme", "Chat")
            .stream_item(TypeRef::I32)
            .operation(OperationDeclaration::one_way("Notify").arg(TypeRef::I32))
            .operation(
                OperationDeclaration::request("Echo")
                    .arg(TypeRef::String)
                    .returns(TypeRef::String),
            )
            .operation(
                OperationDeclaration::request("Count")
                    .output_stream(TypeRef::I32)
                    .returns(TypeRef::U64),
            )
            .operation(OperationDeclaration::one_way("Bye"))
            .build()
    }

    #[test]
    fn blocks_are_contiguous_and_sized_by_need() {
        let table = allocate(&contract(), &CodegenOptions::default()).unwrap();
        let firsts: Vec<u32> = table.operations().iter().map(|b| b.first.get()).collect();
        assert_eq!(firsts, vec![16, 17, 20, 24]);

        assert_eq!(
            table.operation(2).unwrap().keys,
            OperationKeys::RequestResponse {
                request: MessageKey(20),
                response: MessageKey(21),
                fault: MessageKey(22),
                input_page: None,
                output_page: Some(MessageKey(23)),
            }
        );
        assert_eq!(table.last(), MessageKey(24));
    }

    #[test]
    fn system_keys_are_fixed() {
        let keys: Vec<u32> = SystemMessage::ALL.iter().map(|m| m.key().get()).collect();
        assert_eq!(keys, (1..=8).collect::<Vec<_>>());
        assert_eq!(
            SystemMessage::ALL
                .iter()
                .filter(|m| m.is_stream_control())
                .count(),
            4
        );
    }

    #[test]
    fn reserved_range_is_respected() {
        let options = CodegenOptions {
            first_operation_key: 3,
            ..CodegenOptions::default()
        };
        let table = allocate(&contract(), &options).unwrap();
        assert_eq!(table.operations()[0].first, MessageKey(16));
    }

    #[test]
    fn overflow_is_fatal() {
        let options = CodegenOptions {
            key_space_limit: 19,
            ..CodegenOptions::default()
        };
        let err = allocate(&contract(), &options).unwrap_err();
        assert_eq!(
            err,
            CompileError::KeySpaceExhausted {
                operation: "Count".into(),
                needed: 23,
                limit: 19,
            }
        );
    }
}
