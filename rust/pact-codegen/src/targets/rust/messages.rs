//! Message types, fault data unions and the message-base union.

use std::fmt;

use crate::cw_writeln;
use crate::render::{const_name, field_name, hex_key};
use crate::schema::{MessageNode, MethodKind, MethodSchema};

use super::{Ctx, Writer};

impl Ctx<'_> {
    pub(super) fn message_keys(self, w: &mut Writer<'_>) -> fmt::Result {
        let mut messages: Vec<&MessageNode> = self.catalog().messages().collect();
        messages.sort_by_key(|node| node.key());

        w.doc("Wire keys of every message in this contract.")?;
        w.block("pub mod message_key", |w| {
            for node in &messages {
                if let Some(key) = node.key() {
                    cw_writeln!(
                        w,
                        "pub const {}: u32 = {};",
                        const_name(node.name()),
                        hex_key(key)
                    )?;
                }
            }
            Ok(())
        })
    }

    /// One struct per concrete node. Union markers become enums instead.
    pub(super) fn messages(self, w: &mut Writer<'_>) -> fmt::Result {
        let mut first = true;
        for node in self.catalog().nodes() {
            if node.role().is_marker() {
                continue;
            }
            if !first {
                w.blank_line()?;
            }
            first = false;
            self.message_struct(w, node)?;
        }
        Ok(())
    }

    fn message_struct(self, w: &mut Writer<'_>, node: &MessageNode) -> fmt::Result {
        match node.doc() {
            Some(doc) => w.doc(doc)?,
            None => w.doc(&format!("`{}`.", node.display_name()))?,
        }
        w.attr("derive(Debug, Clone, facet::Facet)")?;
        w.block(&format!("pub struct {}", node.name()), |w| {
            for field in node.fields() {
                cw_writeln!(w, "#[facet(rename = \"{}\")]", field.name)?;
                cw_writeln!(
                    w,
                    "pub {}: {},",
                    field_name(&field.name),
                    self.field_type(&field.ty)
                )?;
            }
            Ok(())
        })?;
        w.blank_line()?;
        w.block(&format!("impl {}", node.name()), |w| {
            cw_writeln!(
                w,
                "pub const NAME: &'static str = \"{}\";",
                node.qualified_name()
            )?;
            if node.key().is_some() {
                cw_writeln!(
                    w,
                    "pub const KEY: u32 = message_key::{};",
                    const_name(node.name())
                )?;
            }
            if let Some(fault_key) = node.fault_key() {
                cw_writeln!(w, "pub const FAULT_KEY: u32 = {fault_key};")?;
            }
            for method in node.methods() {
                w.blank_line()?;
                self.message_method(w, node, method)?;
            }
            Ok(())
        })
    }

    fn message_method(
        self,
        w: &mut Writer<'_>,
        node: &MessageNode,
        method: &MethodSchema,
    ) -> fmt::Result {
        let rt = self.rt();
        match method.kind {
            MethodKind::PageFactory | MethodKind::StreamControl => {
                let args = node
                    .fields()
                    .iter()
                    .map(|f| format!("{}: {}", field_name(&f.name), self.field_type(&f.ty)))
                    .collect::<Vec<_>>()
                    .join(", ");
                let fields = node
                    .fields()
                    .iter()
                    .map(|f| field_name(&f.name))
                    .collect::<Vec<_>>()
                    .join(", ");
                w.block(&format!("pub fn {}({args}) -> Self", method.name), |w| {
                    cw_writeln!(w, "Self {{ {fields} }}")
                })
            }
            MethodKind::FaultPayload => {
                let payload = self.payload_type(node);
                w.block(
                    &format!("pub fn {}(&self) -> &{payload}", method.name),
                    |w| w.writeln("&self.payload"),
                )
            }
            MethodKind::IntoFault => {
                let payload = self.payload_type(node);
                w.doc("The typed fault this carrier was built from.")?;
                w.block(
                    &format!(
                        "pub fn {}(self, text: impl Into<::std::string::String>) -> {rt}::CustomFault<{payload}>",
                        method.name
                    ),
                    |w| {
                        cw_writeln!(
                            w,
                            "{rt}::CustomFault::new(Self::FAULT_KEY, self.payload, text.into())"
                        )
                    },
                )
            }
        }
    }

    fn payload_type(self, node: &MessageNode) -> String {
        node.field("Payload")
            .map(|field| self.field_type(&field.ty))
            .unwrap_or_else(|| "()".to_string())
    }

    /// One enum per fault data union, tagged by fault key.
    pub(super) fn fault_data(self, w: &mut Writer<'_>) -> fmt::Result {
        let Some(adapter) = self.unions() else {
            return Ok(());
        };
        let rt = self.rt();

        for (i, union) in adapter.fault_unions.iter().enumerate() {
            if i > 0 {
                w.blank_line()?;
            }
            let marker = self.catalog().node(union.root);
            if let Some(doc) = marker.doc() {
                w.doc(doc)?;
            }
            w.attr("derive(Debug, Clone, facet::Facet)")?;
            w.attr("repr(u32)")?;
            w.block(&format!("pub enum {}", union.name), |w| {
                for member in &union.members {
                    cw_writeln!(
                        w,
                        "{}({}) = {},",
                        self.fault_variant(member.node),
                        member.name,
                        member.tag
                    )?;
                }
                Ok(())
            })?;
            w.blank_line()?;
            w.block(&format!("impl {}", union.name), |w| {
                w.block("pub fn fault_key(&self) -> u32", |w| {
                    w.block("match self", |w| {
                        for member in &union.members {
                            cw_writeln!(
                                w,
                                "Self::{}(_) => {}::FAULT_KEY,",
                                self.fault_variant(member.node),
                                member.name
                            )?;
                        }
                        Ok(())
                    })
                })?;
                w.blank_line()?;
                w.block(
                    &format!(
                        "pub fn into_fault(self, text: impl Into<::std::string::String>) -> {rt}::Fault"
                    ),
                    |w| {
                        w.block("match self", |w| {
                            for member in &union.members {
                                cw_writeln!(
                                    w,
                                    "Self::{}(carrier) => carrier.into_fault(text).into(),",
                                    self.fault_variant(member.node)
                                )?;
                            }
                            Ok(())
                        })
                    },
                )
            })?;
        }
        Ok(())
    }

    /// The message-base union: every keyed message, tagged by its key.
    pub(super) fn message_base_union(self, w: &mut Writer<'_>) -> fmt::Result {
        let Some(adapter) = self.unions() else {
            return Ok(());
        };
        let union = &adapter.message_union;
        let base = self.catalog().node(union.root);

        if let Some(doc) = base.doc() {
            w.doc(doc)?;
        }
        w.attr("derive(Debug, Clone, facet::Facet)")?;
        w.attr("repr(u32)")?;
        w.block(&format!("pub enum {}", union.name), |w| {
            for member in &union.members {
                cw_writeln!(
                    w,
                    "{0}({0}) = message_key::{1},",
                    member.name,
                    const_name(&member.name)
                )?;
            }
            Ok(())
        })?;
        w.blank_line()?;
        w.block(&format!("impl {}", union.name), |w| {
            w.doc("Wire key of the wrapped message.")?;
            w.block("pub fn key(&self) -> u32", |w| {
                w.block("match self", |w| {
                    for member in &union.members {
                        cw_writeln!(w, "Self::{0}(_) => {0}::KEY,", member.name)?;
                    }
                    Ok(())
                })
            })?;
            w.blank_line()?;
            w.block("pub fn name(&self) -> &'static str", |w| {
                w.block("match self", |w| {
                    for member in &union.members {
                        cw_writeln!(w, "Self::{0}(_) => {0}::NAME,", member.name)?;
                    }
                    Ok(())
                })
            })
        })?;
        for member in &union.members {
            w.blank_line()?;
            w.block(
                &format!("impl From<{}> for {}", member.name, union.name),
                |w| {
                    w.block(&format!("fn from(message: {}) -> Self", member.name), |w| {
                        cw_writeln!(w, "Self::{}(message)", member.name)
                    })
                },
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pact_contract::{ContractDeclaration, OperationDeclaration, TypeRef};

    use super::super::generate_message_keys;
    use crate::{CodegenOptions, compile};

    #[test]
    fn message_keys_in_key_order() {
        let contract = ContractDeclaration::builder("acme", "Chat")
            .operation(OperationDeclaration::one_way("Notify").arg(TypeRef::I32))
            .operation(OperationDeclaration::request("Echo").arg(TypeRef::String))
            .build();
        let compiled = compile(&contract, &CodegenOptions::default()).unwrap();

        insta::assert_snapshot!(generate_message_keys(&compiled).unwrap(), @r"
        /// Wire keys of every message in this contract.
        pub mod message_key {
            pub const LOGIN: u32 = 0x0001;
            pub const LOGOUT: u32 = 0x0002;
            pub const HEARTBEAT: u32 = 0x0003;
            pub const CANCEL_REQUEST: u32 = 0x0004;
            pub const PAGE_ACK: u32 = 0x0005;
            pub const STREAM_CANCEL: u32 = 0x0006;
            pub const STREAM_CLOSE: u32 = 0x0007;
            pub const STREAM_CLOSE_ACK: u32 = 0x0008;
            pub const NOTIFY_MESSAGE: u32 = 0x0010;
            pub const ECHO_REQUEST: u32 = 0x0011;
            pub const ECHO_RESPONSE: u32 = 0x0012;
            pub const ECHO_FAULT: u32 = 0x0013;
        }
        ");
    }
}
