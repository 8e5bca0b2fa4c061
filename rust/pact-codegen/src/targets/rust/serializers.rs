//! Serializer adapters and the chooser.

use std::fmt;

use crate::cw_writeln;
use crate::serializers::SerializerAdapter;

use super::{Ctx, Writer};

impl Ctx<'_> {
    fn adapter(self, w: &mut Writer<'_>, adapter: &SerializerAdapter) -> fmt::Result {
        let rt = self.rt();
        let base = &adapter.message_union.name;
        let codec = adapter.serializer.identity();

        w.doc(&format!(
            "`{}` encoding of every `{}` message.",
            adapter.serializer,
            self.compiled.contract().qualified_name()
        ))?;
        cw_writeln!(w, "pub struct {};", adapter.name)?;
        w.blank_line()?;
        w.block(
            &format!("impl {rt}::SerializerAdapter for {}", adapter.name),
            |w| {
                cw_writeln!(w, "type Message = {base};")?;
                cw_writeln!(
                    w,
                    "const KIND: SerializerKind = SerializerKind::{:?};",
                    adapter.serializer
                )?;
                w.blank_line()?;

                w.doc("Message-base union, as `(key, type)`.")?;
                w.block_with_close(
                    "const MESSAGES: &'static [(u32, &'static str)] = &[",
                    "];",
                    |w| {
                        for member in &adapter.message_union.members {
                            cw_writeln!(w, "({}, \"{}\"),", member.tag, member.name)?;
                        }
                        Ok(())
                    },
                )?;
                w.blank_line()?;

                w.doc("Fault data unions, as `(union, [(fault key, type)])`.")?;
                w.block_with_close(
                    "const FAULTS: &'static [(&'static str, &'static [(u32, &'static str)])] = &[",
                    "];",
                    |w| {
                        for union in &adapter.fault_unions {
                            let members = union
                                .members
                                .iter()
                                .map(|m| format!("({}, \"{}\")", m.tag, m.name))
                                .collect::<Vec<_>>()
                                .join(", ");
                            cw_writeln!(w, "(\"{}\", &[{members}]),", union.name)?;
                        }
                        Ok(())
                    },
                )?;
                w.blank_line()?;

                w.block(
                    &format!(
                        "fn encode(&self, message: &{base}) -> Result<::std::vec::Vec<u8>, {rt}::EncodeError>"
                    ),
                    |w| cw_writeln!(w, "{rt}::codec::{codec}::encode(message)"),
                )?;
                w.blank_line()?;
                w.block(
                    &format!("fn decode(&self, bytes: &[u8]) -> Result<{base}, {rt}::DecodeError>"),
                    |w| cw_writeln!(w, "{rt}::codec::{codec}::decode(bytes)"),
                )
            },
        )
    }

    pub(super) fn serializers(self, w: &mut Writer<'_>) -> fmt::Result {
        let rt = self.rt();
        let binding = self.compiled.serializers();
        let chooser = &binding.chooser;
        let base = self.message_base();
        let contract = self.compiled.contract().qualified_name();

        for adapter in &binding.adapters {
            self.adapter(w, adapter)?;
            w.blank_line()?;
        }

        w.doc(&format!("Serializers configured for `{contract}`."))?;
        cw_writeln!(w, "pub struct {};", chooser.name)?;
        w.blank_line()?;
        w.block(&format!("impl {}", chooser.name), |w| {
            let configured = chooser
                .configured()
                .iter()
                .map(|kind| format!("SerializerKind::{kind:?}"))
                .collect::<Vec<_>>()
                .join(", ");
            cw_writeln!(w, "pub const CONFIGURED: &'static [SerializerKind] = &[{configured}];")?;
            cw_writeln!(
                w,
                "pub const DEFAULT: SerializerKind = SerializerKind::{:?};",
                chooser.default_kind()
            )?;
            w.blank_line()?;

            w.doc("The serializer to use for `requested`, or the default for `None`.")?;
            w.block(
                &format!(
                    "pub fn resolve(requested: Option<SerializerKind>) -> Result<SerializerKind, {rt}::ConfigError>"
                ),
                |w| {
                    w.writeln("let kind = requested.unwrap_or(Self::DEFAULT);")?;
                    w.block("if !Self::CONFIGURED.contains(&kind)", |w| {
                        cw_writeln!(
                            w,
                            "return Err({rt}::ConfigError::SerializerNotConfigured {{ requested: kind, contract: \"{contract}\" }});"
                        )
                    })?;
                    w.writeln("Ok(kind)")
                },
            )?;
            w.blank_line()?;

            w.block(
                &format!(
                    "pub fn adapter(kind: SerializerKind) -> Result<::std::boxed::Box<dyn {rt}::DynAdapter<{base}>>, {rt}::ConfigError>"
                ),
                |w| {
                    w.block("match Self::resolve(Some(kind))?", |w| {
                        for adapter in &binding.adapters {
                            cw_writeln!(
                                w,
                                "SerializerKind::{:?} => Ok(::std::boxed::Box::new({})),",
                                adapter.serializer,
                                adapter.name
                            )?;
                        }
                        cw_writeln!(
                            w,
                            "other => Err({rt}::ConfigError::SerializerNotConfigured {{ requested: other, contract: \"{contract}\" }}),"
                        )
                    })
                },
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use pact_contract::{ContractDeclaration, OperationDeclaration, SerializerKind, TypeRef};

    use crate::targets::rust::{RustCodegenOptions, generate};
    use crate::{CodegenOptions, compile};

    #[test]
    fn one_adapter_per_configured_serializer() {
        let contract = ContractDeclaration::builder("acme", "Chat")
            .serializer(SerializerKind::Postcard)
            .serializer(SerializerKind::Json)
            .default_serializer(SerializerKind::Json)
            .operation(OperationDeclaration::one_way("Notify").arg(TypeRef::I32))
            .build();
        let compiled = compile(&contract, &CodegenOptions::default()).unwrap();
        let code = generate(&compiled, &RustCodegenOptions::default()).unwrap();

        assert!(code.contains("impl ::pact_runtime::SerializerAdapter for ChatPostcardAdapter"));
        assert!(code.contains("impl ::pact_runtime::SerializerAdapter for ChatJsonAdapter"));
        assert!(!code.contains("ChatBincodeAdapter"));
        assert!(code.contains("::pact_runtime::codec::json::encode(message)"));
        assert!(code.contains(
            "pub const CONFIGURED: &'static [SerializerKind] = &[SerializerKind::Postcard, SerializerKind::Json];"
        ));
        assert!(code.contains("pub const DEFAULT: SerializerKind = SerializerKind::Json;"));
        assert!(code.contains("(16, \"NotifyMessage\"),"));
    }
}
