use pact_contract::SerializerKind;

use crate::keys::RESERVED_SYSTEM_KEYS;

/// Options for [`compile`](crate::compile).
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// First key handed to operation blocks.
    ///
    /// Values inside the reserved system range are raised to the first key after it.
    pub first_operation_key: u32,

    /// Highest key the allocator may hand out.
    ///
    /// Generated code carries keys as `u32`, but the wire format most runtimes
    /// speak reserves two bytes for them, hence the default.
    pub key_space_limit: u32,

    /// Overrides the contract's own default serializer.
    pub default_serializer: Option<SerializerKind>,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            first_operation_key: RESERVED_SYSTEM_KEYS + 1,
            key_space_limit: u32::from(u16::MAX),
            default_serializer: None,
        }
    }
}

impl CodegenOptions {
    pub(crate) fn effective_first_operation_key(&self) -> u32 {
        self.first_operation_key.max(RESERVED_SYSTEM_KEYS + 1)
    }
}
