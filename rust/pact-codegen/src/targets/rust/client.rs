//! Client surfaces, facades, stream wiring and prebuild helpers.

use std::fmt;

use heck::ToUpperCamelCase;
use pact_contract::TypeRef;

use crate::client::{CallStyle, ClientSurface, Facade, ReturnShape, Side, StreamOpener, StubMethod};
use crate::cw_writeln;
use crate::render::{field_name, rust_type};
use crate::schema::{NodeId, OperationMessages};

use super::{Ctx, Param, Writer, forward, inits, join_args, signature};

impl Ctx<'_> {
    fn return_type(self, shape: &ReturnShape) -> String {
        match shape {
            ReturnShape::Unit => "Result<(), CallError>".to_string(),
            ReturnShape::Value(ty) => format!("Result<{}, CallError>", rust_type(ty)),
            ReturnShape::Outcome(ty) => format!(
                "Outcome<{}>",
                ty.as_ref().map(rust_type).unwrap_or_else(|| "()".into())
            ),
            ReturnShape::Awaitable(inner) => self.return_type(inner),
        }
    }

    fn has_fault_data(self, fault: NodeId) -> bool {
        self.catalog().node(fault).field("FaultData").is_some()
    }

    /// Match arm turning a fault message into a `CallError`.
    fn fault_arm(self, w: &mut Writer<'_>, fault: NodeId, open: &str, close: &str) -> fmt::Result {
        let base = self.message_base();
        let name = self.name(fault);
        if self.has_fault_data(fault) {
            w.block(&format!("{base}::{name}(fault) =>"), |w| {
                w.writeln(
                    "let custom = fault.fault_data.map(|data| data.into_fault(fault.text.clone()));",
                )?;
                cw_writeln!(w, "{open}CallError::remote(fault.code, fault.text, custom){close}")
            })
        } else {
            cw_writeln!(
                w,
                "{base}::{name}(fault) => {open}CallError::remote(fault.code, fault.text, None){close},"
            )
        }
    }

    fn result_field(self, operation: usize) -> Option<String> {
        self.compiled.contract().operations()[operation]
            .result()
            .map(|r| field_name(r.wire_name()))
    }

    fn method_params(self, method: &StubMethod) -> Vec<Param> {
        if method.prebuilt {
            vec![Param {
                ident: "message".into(),
                field: String::new(),
                ty: format!("&{}::Prebuilt<{}>", self.rt(), self.name(method.message)),
            }]
        } else {
            self.params(&method.params)
        }
    }

    fn stub_method(self, w: &mut Writer<'_>, method: &StubMethod) -> fmt::Result {
        let params = self.method_params(method);
        let asyncness = if method.returns.is_awaitable() { "async " } else { "" };

        if let Some(doc) = &method.doc {
            w.doc(doc)?;
        }
        let header = format!(
            "pub {asyncness}fn {}({}) -> {}",
            method.name,
            join_args("&self", &signature(&params)),
            self.return_type(&method.returns)
        );
        let args = forward(&params);
        let async_name = CallStyle::Async.method_name(&method.base_name);
        let blocking_name = CallStyle::Blocking.method_name(&method.base_name);

        w.block(&header, |w| match method.style {
            CallStyle::Blocking => {
                cw_writeln!(w, "{}::block_on(self.{async_name}({args}))", self.rt())
            }
            CallStyle::Try => cw_writeln!(w, "Outcome::from(self.{blocking_name}({args}))"),
            CallStyle::TryAsync => {
                cw_writeln!(w, "Outcome::from(self.{async_name}({args}).await)")
            }
            CallStyle::Async => self.send_body(w, method, &params),
        })
    }

    fn send_body(self, w: &mut Writer<'_>, method: &StubMethod, params: &[Param]) -> fmt::Result {
        let message = self.name(method.message);
        if method.prebuilt {
            w.block("if message.serializer() != self.serializer", |w| {
                w.writeln(
                    "return Err(CallError::SerializerMismatch { surface: self.serializer, prebuilt: message.serializer() });",
                )
            })?;
            return w.writeln("self.channel.send_prebuilt(message).await");
        }
        if method.one_way {
            return cw_writeln!(
                w,
                "self.channel.send(self.serializer, {message} {{ {} }}.into()).await",
                inits(params)
            );
        }

        let Some(messages) = self.catalog().operation(method.operation) else {
            return Ok(());
        };
        let OperationMessages::RequestResponse {
            response, fault, ..
        } = *messages
        else {
            return Ok(());
        };
        let base = self.message_base();

        w.writeln("let call_id = self.channel.next_call_id();")?;
        cw_writeln!(
            w,
            "let request = {message} {{ {} }};",
            join_args("call_id, options: CallOptions::default()", &inits(params))
        )?;
        w.block(
            "match self.channel.call(self.serializer, request.into()).await?",
            |w| {
                match self.result_field(method.operation) {
                    Some(result) => cw_writeln!(
                        w,
                        "{base}::{}(response) => Ok(response.{result}),",
                        self.name(response)
                    )?,
                    None => cw_writeln!(w, "{base}::{}(_) => Ok(()),", self.name(response))?,
                }
                self.fault_arm(w, fault, "Err(", ")")?;
                w.writeln("other => Err(CallError::UnexpectedMessage { key: other.key() }),")
            },
        )
    }

    fn stream_wiring_name(self, opener: &StreamOpener) -> String {
        let operation = self.compiled.contract().operations()[opener.operation].name();
        format!("{}Stream", operation.to_upper_camel_case())
    }

    /// `StreamWiring` impl binding an operation's pages and the shared
    /// stream-control messages.
    fn stream_wiring(self, w: &mut Writer<'_>, opener: &StreamOpener) -> fmt::Result {
        let rt = self.rt();
        let base = self.message_base();
        let name = self.stream_wiring_name(opener);
        let operation = self.compiled.contract().operations()[opener.operation].name();
        let item = |ty: &Option<TypeRef>| {
            ty.as_ref().map(rust_type).unwrap_or_else(|| "()".into())
        };

        w.doc(&format!("Stream plumbing of `{operation}`."))?;
        cw_writeln!(w, "pub struct {name};")?;
        w.blank_line()?;
        w.block(&format!("impl {rt}::StreamWiring for {name}"), |w| {
            cw_writeln!(w, "type Message = {base};")?;
            cw_writeln!(w, "type Input = {};", item(&opener.input_item))?;
            cw_writeln!(w, "type Output = {};", item(&opener.output_item))?;
            cw_writeln!(w, "type Result = {};", item(&opener.result))?;
            w.blank_line()?;

            w.block(
                &format!(
                    "fn input_page(call_id: u64, items: ::std::vec::Vec<Self::Input>) -> ::std::option::Option<{base}>"
                ),
                |w| match opener.input_page {
                    Some(page) => cw_writeln!(w, "Some({}::page(call_id, items).into())", self.name(page)),
                    None => w.writeln("None"),
                },
            )?;
            w.blank_line()?;

            w.block(
                &format!(
                    "fn output_items(message: {base}) -> ::std::result::Result<::std::vec::Vec<Self::Output>, {base}>"
                ),
                |w| match opener.output_page {
                    Some(page) => w.block("match message", |w| {
                        cw_writeln!(w, "{base}::{}(page) => Ok(page.items),", self.name(page))?;
                        w.writeln("other => Err(other),")
                    }),
                    None => w.writeln("Err(message)"),
                },
            )?;
            w.blank_line()?;

            w.block(
                &format!(
                    "fn settle(message: {base}) -> ::std::result::Result<Result<Self::Result, CallError>, {base}>"
                ),
                |w| {
                    w.block("match message", |w| {
                        match self.result_field(opener.operation) {
                            Some(result) => cw_writeln!(
                                w,
                                "{base}::{}(response) => Ok(Ok(response.{result})),",
                                self.name(opener.response)
                            )?,
                            None => cw_writeln!(
                                w,
                                "{base}::{}(_) => Ok(Ok(())),",
                                self.name(opener.response)
                            )?,
                        }
                        self.fault_arm(w, opener.fault, "Ok(Err(", "))")?;
                        w.writeln("other => Err(other),")
                    })
                },
            )?;

            let control = [
                ("page_ack", opener.control.page_ack),
                ("cancel", opener.control.cancel),
                ("close", opener.control.close),
                ("close_ack", opener.control.close_ack),
            ];
            for (wiring_fn, node) in control {
                let node = self.catalog().node(node);
                let Some(factory) = node.methods().first() else {
                    continue;
                };
                let args = node
                    .fields()
                    .iter()
                    .map(|f| format!("{}: {}", field_name(&f.name), self.field_type(&f.ty)))
                    .collect::<Vec<_>>()
                    .join(", ");
                let names = node
                    .fields()
                    .iter()
                    .map(|f| field_name(&f.name))
                    .collect::<Vec<_>>()
                    .join(", ");
                w.blank_line()?;
                w.block(&format!("fn {wiring_fn}({args}) -> {base}"), |w| {
                    cw_writeln!(w, "{}::{}({names}).into()", node.name(), factory.name)
                })?;
            }
            Ok(())
        })
    }

    fn stream_opener(self, w: &mut Writer<'_>, opener: &StreamOpener) -> fmt::Result {
        let rt = self.rt();
        let params = self.params(&opener.params);
        let request = self.name(opener.request);
        let wiring = self.stream_wiring_name(opener);

        if let Some(doc) = &opener.doc {
            w.doc(doc)?;
        }
        w.block(
            &format!(
                "pub async fn {}({}) -> Result<{rt}::StreamCall<'_, C, {wiring}>, CallError>",
                opener.name,
                join_args("&self", &join_args(&signature(&params), "window_size: u32"))
            ),
            |w| {
                w.writeln("let call_id = self.channel.next_call_id();")?;
                cw_writeln!(
                    w,
                    "let request = {request} {{ {} }};",
                    join_args(
                        "call_id, options: CallOptions::default()",
                        &join_args(&inits(&params), "window_size")
                    )
                )?;
                cw_writeln!(
                    w,
                    "{rt}::StreamCall::open(&self.channel, self.serializer, call_id, request.into(), window_size).await"
                )
            },
        )
    }

    fn facade(self, w: &mut Writer<'_>, surface: &ClientSurface, facade: &Facade) -> fmt::Result {
        let rt = self.rt();
        let base = self.message_base();
        let style = match facade.style {
            CallStyle::Blocking => "blocking",
            CallStyle::Async => "async",
            CallStyle::Try => "try",
            CallStyle::TryAsync => "try-async",
        };

        w.doc(&format!(
            "`{}` calls in the {style} style, under their plain names.",
            surface.name
        ))?;
        cw_writeln!(w, "pub struct {}<'a, C>(&'a {}<C>);", facade.name, surface.name)?;
        w.blank_line()?;
        cw_writeln!(w, "impl<C> {}<'_, C>", facade.name)?;
        w.writeln("where")?;
        {
            let _indent = w.indent();
            cw_writeln!(w, "C: {rt}::Channel<{base}>,")?;
        }
        w.block("", |w| {
            let mut first = true;
            for entry in &facade.methods {
                let Some(target) = surface.method(&entry.target) else {
                    continue;
                };
                if !first {
                    w.blank_line()?;
                }
                first = false;

                let params = self.method_params(target);
                let asyncness = if target.returns.is_awaitable() { "async " } else { "" };
                let await_suffix = if target.returns.is_awaitable() { ".await" } else { "" };
                w.block(
                    &format!(
                        "pub {asyncness}fn {}({}) -> {}",
                        entry.name,
                        join_args("&self", &signature(&params)),
                        self.return_type(&target.returns)
                    ),
                    |w| {
                        cw_writeln!(
                            w,
                            "self.0.{}({}){await_suffix}",
                            entry.target,
                            forward(&params)
                        )
                    },
                )?;
            }
            Ok(())
        })
    }

    /// Surface struct with its style methods, stream openers and facades.
    pub(super) fn surface(self, w: &mut Writer<'_>, surface: &ClientSurface) -> fmt::Result {
        let rt = self.rt();
        let base = self.message_base();
        let chooser = &self.compiled.serializers().chooser.name;
        let contract = self.compiled.contract().qualified_name();

        for opener in &surface.streams {
            self.stream_wiring(w, opener)?;
            w.blank_line()?;
        }

        match surface.side {
            Side::Client => w.doc(&format!("Calls `{contract}` operations on the server."))?,
            Side::Server => w.doc(&format!("Calls back into the client of `{contract}`."))?,
        }
        w.block(&format!("pub struct {}<C>", surface.name), |w| {
            w.writeln("channel: C,")?;
            w.writeln("serializer: SerializerKind,")
        })?;
        w.blank_line()?;

        cw_writeln!(w, "impl<C> {}<C>", surface.name)?;
        w.writeln("where")?;
        {
            let _indent = w.indent();
            cw_writeln!(w, "C: {rt}::Channel<{base}>,")?;
        }
        w.block("", |w| {
            w.doc("Uses the contract's default serializer.")?;
            w.block("pub fn new(channel: C) -> Self", |w| {
                cw_writeln!(w, "Self {{ channel, serializer: {chooser}::DEFAULT }}")
            })?;
            w.blank_line()?;
            w.doc("Fails when `serializer` is not configured for this contract.")?;
            w.block(
                &format!(
                    "pub fn with_serializer(channel: C, serializer: SerializerKind) -> Result<Self, {rt}::ConfigError>"
                ),
                |w| {
                    cw_writeln!(w, "let serializer = {chooser}::resolve(Some(serializer))?;")?;
                    w.writeln("Ok(Self { channel, serializer })")
                },
            )?;
            w.blank_line()?;
            w.block("pub fn serializer(&self) -> SerializerKind", |w| {
                w.writeln("self.serializer")
            })?;
            w.blank_line()?;
            w.block("pub fn channel(&self) -> &C", |w| w.writeln("&self.channel"))?;

            for facade in &surface.facades {
                let accessor = match facade.style {
                    CallStyle::Blocking => continue,
                    CallStyle::Async => "as_async",
                    CallStyle::Try => "as_try",
                    CallStyle::TryAsync => "as_try_async",
                };
                w.blank_line()?;
                w.block(
                    &format!("pub fn {accessor}(&self) -> {}<'_, C>", facade.name),
                    |w| cw_writeln!(w, "{}(self)", facade.name),
                )?;
            }

            for method in &surface.methods {
                w.blank_line()?;
                self.stub_method(w, method)?;
            }
            for opener in &surface.streams {
                w.blank_line()?;
                self.stream_opener(w, opener)?;
            }
            Ok(())
        })?;

        for facade in &surface.facades {
            w.blank_line()?;
            self.facade(w, surface, facade)?;
        }
        Ok(())
    }

    /// Free functions serializing one-way messages ahead of time.
    pub(super) fn prebuild_helpers(self, w: &mut Writer<'_>) -> fmt::Result {
        let rt = self.rt();
        let helpers = self
            .compiled
            .client()
            .prebuild
            .iter()
            .chain(&self.compiled.callback_proxy().prebuild);

        let mut first = true;
        for helper in helpers {
            if !first {
                w.blank_line()?;
            }
            first = false;

            let params = self.params(&helper.params);
            let message = self.name(helper.message);
            w.doc(&format!(
                "Serializes a `{message}` once with `{}`, for repeated sends.",
                helper.serializer
            ))?;
            w.block(
                &format!(
                    "pub fn {}({}) -> Result<{rt}::Prebuilt<{message}>, {rt}::EncodeError>",
                    helper.name,
                    signature(&params)
                ),
                |w| {
                    cw_writeln!(
                        w,
                        "{rt}::Prebuilt::encode(SerializerKind::{:?}, {message} {{ {} }})",
                        helper.serializer,
                        inits(&params)
                    )
                },
            )?;
        }
        Ok(())
    }
}
