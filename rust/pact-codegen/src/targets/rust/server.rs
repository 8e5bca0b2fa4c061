//! Handler traits and dispatchers.

use std::fmt;

use codegen::Block;
use pact_contract::TypeRef;

use crate::cw_writeln;
use crate::render::{field_name, rust_type, section};
use crate::server::{ContextKind, DispatchPlan, FaultBranch, HandlerMethod, InboundArm, RequestArm};

use super::{Ctx, RustGenerator, Writer, join_args};

impl<'a> Ctx<'a> {
    fn inbound_message(self, arm: &InboundArm) -> &'a str {
        match arm {
            InboundArm::OneWay { message, .. } => self.name(*message),
            InboundArm::Request(arm) => self.name(arm.request),
        }
    }

    /// The decoded-message enum a dispatcher matches on.
    fn inbound_enum(self, w: &mut Writer<'_>, plan: &DispatchPlan) -> fmt::Result {
        let base = self.message_base();

        w.doc(&format!("Inbound messages `{}` handles.", plan.handler_trait))?;
        w.attr("derive(Debug, Clone)")?;
        w.block(&format!("pub enum {}", plan.inbound), |w| {
            for arm in &plan.arms {
                cw_writeln!(w, "{}({}),", arm.variant(), self.inbound_message(arm))?;
            }
            w.doc("A key outside this table.")?;
            w.writeln("Unknown { key: u32 },")
        })?;
        w.blank_line()?;
        w.block(&format!("impl {}", plan.inbound), |w| {
            w.block(&format!("pub fn from_message(message: {base}) -> Self"), |w| {
                w.block("match message", |w| {
                    for arm in &plan.arms {
                        cw_writeln!(
                            w,
                            "{base}::{}(message) => Self::{}(message),",
                            self.inbound_message(arm),
                            arm.variant()
                        )?;
                    }
                    w.writeln("other => Self::Unknown { key: other.key() },")
                })
            })?;
            w.blank_line()?;
            w.block("pub fn key(&self) -> u32", |w| {
                w.block("match self", |w| {
                    for arm in &plan.arms {
                        cw_writeln!(
                            w,
                            "Self::{}(_) => {}::KEY,",
                            arm.variant(),
                            self.inbound_message(arm)
                        )?;
                    }
                    w.writeln("Self::Unknown { key } => *key,")
                })
            })
        })
    }

    fn context_type(self, handler: &HandlerMethod) -> String {
        let rt = self.rt();
        if handler.input_item.is_some() || handler.output_item.is_some() {
            let item = |ty: Option<&TypeRef>| ty.map(rust_type).unwrap_or_else(|| "()".into());
            format!(
                "&{rt}::StreamContext<{}, {}>",
                item(handler.input_item.as_ref()),
                item(handler.output_item.as_ref())
            )
        } else {
            format!("&{rt}::CallContext")
        }
    }

    fn handler_output(self, handler: &HandlerMethod) -> String {
        if handler.one_way {
            return "()".to_string();
        }
        let result = handler
            .result
            .as_ref()
            .map(rust_type)
            .unwrap_or_else(|| "()".into());
        format!("Result<{result}, {}::Fault>", self.rt())
    }

    fn trace_line(self, w: &mut Writer<'_>, arm: &InboundArm, key_const: &str) -> fmt::Result {
        if !self.options.tracing {
            return Ok(());
        }
        let contract = self.compiled.contract().qualified_name();
        let operation = self.compiled.contract().operations()[arm.operation()].name();
        cw_writeln!(
            w,
            "::tracing::debug!(contract = \"{contract}\", operation = \"{operation}\", key = {key_const}, \"dispatch\");"
        )
    }

    fn one_way_body(self, w: &mut Writer<'_>, arm: &InboundArm, message: &str) -> fmt::Result {
        let operation = &self.compiled.contract().operations()[arm.operation()];
        let args = self
            .params(operation.params())
            .iter()
            .map(|p| format!("message.{}", p.field))
            .collect::<Vec<_>>()
            .join(", ");
        self.trace_line(w, arm, &format!("{message}::KEY"))?;
        cw_writeln!(w, "self.handler.{}({args}).await;", arm.handler())?;
        w.writeln("Ok(())")
    }

    /// Run the handler, close its context once, then send exactly one of
    /// response, custom fault, declared fault or unexpected fault.
    fn request_body(self, w: &mut Writer<'_>, inbound: &InboundArm, arm: &RequestArm) -> fmt::Result {
        let rt = self.rt();
        let operation = &self.compiled.contract().operations()[arm.operation];
        let request = self.name(arm.request);
        let response = self.name(arm.response);
        let fault = self.name(arm.fault);
        let has_fault_data = self.catalog().node(arm.fault).field("FaultData").is_some();

        let args = self
            .params(operation.params())
            .iter()
            .map(|p| format!("request.{}", p.field))
            .collect::<Vec<_>>()
            .join(", ");

        w.writeln("let call_id = request.call_id;")?;
        self.trace_line(w, inbound, &format!("{request}::KEY"))?;
        match arm.context {
            ContextKind::Plain => {
                cw_writeln!(w, "let call = {rt}::CallContext::new(call_id, request.options);")?
            }
            ContextKind::Streaming { .. } => cw_writeln!(
                w,
                "let call = {rt}::StreamContext::open(call_id, request.options, request.window_size);"
            )?,
        }
        cw_writeln!(
            w,
            "let outcome = {rt}::catch_unwind(self.handler.{}({})).await;",
            arm.handler,
            join_args("&call", &args)
        )?;
        if arm.context.is_streaming() {
            w.writeln("call.close().await;")?;
        } else {
            w.writeln("call.close();")?;
        }

        let no_data = if has_fault_data { ", fault_data: None" } else { "" };
        w.block("match outcome", |w| {
            if arm.has_result {
                let result = operation
                    .result()
                    .map(|r| field_name(r.wire_name()))
                    .unwrap_or_else(|| "result".into());
                w.block("Ok(Ok(result)) =>", |w| {
                    match &arm.post_send_hook {
                        Some(hook) => {
                            cw_writeln!(
                                w,
                                "replies.send({response} {{ call_id, {result}: result.clone() }}.into()).await?;"
                            )?;
                            cw_writeln!(w, "self.handler.{hook}(&result);")?;
                        }
                        None => cw_writeln!(
                            w,
                            "replies.send({response} {{ call_id, {result}: result }}.into()).await?;"
                        )?,
                    }
                    w.writeln("Ok(())")
                })?;
            } else {
                w.block("Ok(Ok(())) =>", |w| {
                    cw_writeln!(w, "replies.send({response} {{ call_id }}.into()).await?;")?;
                    w.writeln("Ok(())")
                })?;
            }

            w.block("Ok(Err(fault)) =>", |w| {
                for branch in &arm.catch_chain {
                    match branch {
                        FaultBranch::Custom {
                            payload, adapter, ..
                        } => {
                            let carrier = self.name(*adapter);
                            let marker = self
                                .catalog()
                                .node(*adapter)
                                .base()
                                .map(|id| self.name(id))
                                .unwrap_or_default();
                            let variant = self.fault_variant(*adapter);
                            w.block_with_close(
                                &format!(
                                    "let fault = match fault.into_custom::<{}>({carrier}::FAULT_KEY)",
                                    rust_type(payload)
                                ),
                                "};",
                                |w| {
                                    w.block("Ok(custom) =>", |w| {
                                        cw_writeln!(
                                            w,
                                            "let data = {marker}::{variant}({carrier} {{ payload: custom.payload }});"
                                        )?;
                                        cw_writeln!(
                                            w,
                                            "replies.send({fault} {{ call_id, text: custom.text, code: FaultCode::Custom, fault_data: Some(data) }}.into()).await?;"
                                        )?;
                                        w.writeln("return Ok(());")
                                    })?;
                                    w.writeln("Err(fault) => fault,")
                                },
                            )?;
                        }
                        FaultBranch::Declared => {
                            cw_writeln!(
                                w,
                                "replies.send({fault} {{ call_id, text: fault.to_string(), code: FaultCode::Declared{no_data} }}.into()).await?;"
                            )?;
                            w.writeln("Ok(())")?;
                        }
                        FaultBranch::Unexpected => {}
                    }
                }
                Ok(())
            })?;

            w.block("Err(panic) =>", |w| {
                cw_writeln!(
                    w,
                    "replies.send({fault} {{ call_id, text: panic.to_string(), code: FaultCode::Unexpected{no_data} }}.into()).await?;"
                )?;
                w.writeln("Ok(())")
            })
        })
    }
}

impl RustGenerator<'_> {
    /// Inbound enum, handler trait and dispatcher for one side.
    pub(super) fn generate_dispatch(&mut self, plan: &DispatchPlan) -> fmt::Result {
        let ctx = self.ctx;
        let rt = ctx.rt();
        let base = ctx.message_base();

        self.raw(section(1, |w| ctx.inbound_enum(w, plan))?);

        let trait_def = self.scope.new_trait(&plan.handler_trait);
        trait_def.vis("pub");
        trait_def.bound("Self", "Send + Sync");
        trait_def.doc(&format!(
            "Operations of `{}` this side implements.",
            ctx.compiled.contract().qualified_name()
        ));

        for handler in &plan.handlers {
            let params = ctx.params(&handler.params);
            let fn_def = trait_def.new_fn(&handler.name);
            fn_def.arg_ref_self();
            if !handler.one_way {
                fn_def.arg("call", ctx.context_type(handler));
            }
            for param in &params {
                fn_def.arg(&param.ident, &param.ty);
            }
            fn_def.ret(format!(
                "impl ::std::future::Future<Output = {}> + Send",
                ctx.handler_output(handler)
            ));
            if let Some(doc) = &handler.doc {
                fn_def.doc(doc);
            }

            if let (Some(hook), Some(result)) = (&handler.post_send_hook, &handler.result) {
                let hook_fn = trait_def.new_fn(hook);
                hook_fn.arg_ref_self();
                hook_fn.arg("result", format!("&{}", rust_type(result)));
                hook_fn.doc(&format!(
                    "Called with the result of `{}` once its response was sent.",
                    handler.name
                ));
                hook_fn.line("let _ = result;");
            }
        }

        self.raw(section(1, |w| {
            w.doc(&format!("Routes decoded `{}` messages to a handler.", plan.inbound))?;
            w.block(&format!("pub struct {}<H>", plan.dispatcher), |w| {
                w.writeln("handler: H,")
            })
        })?);

        let impl_block = self.scope.new_impl(&plan.dispatcher);
        impl_block.generic("H");
        impl_block
            .target_generic("H")
            .bound("H", format!("{} + 'static", plan.handler_trait));

        let new_fn = impl_block.new_fn("new");
        new_fn.vis("pub");
        new_fn.arg("handler", "H");
        new_fn.ret("Self");
        new_fn.line("Self { handler }");

        let handler_fn = impl_block.new_fn("handler");
        handler_fn.vis("pub");
        handler_fn.arg_ref_self();
        handler_fn.ret("&H");
        handler_fn.line("&self.handler");

        let dispatch_fn = impl_block.new_fn("dispatch");
        dispatch_fn.vis("pub");
        dispatch_fn.set_async(true);
        dispatch_fn.generic("R");
        dispatch_fn.arg_ref_self();
        dispatch_fn.arg("inbound", plan.inbound.as_str());
        dispatch_fn.arg("replies", "&R");
        dispatch_fn.ret(format!("Result<(), {rt}::DispatchError>"));
        dispatch_fn.bound("R", format!("{rt}::Replies<{base}>"));
        let mut dispatch_body = Block::new("match inbound");
        for arm in &plan.arms {
            match arm {
                InboundArm::OneWay {
                    variant, handler, ..
                } => dispatch_body.line(format!(
                    "{}::{variant}(message) => self.dispatch_{handler}(message).await,",
                    plan.inbound
                )),
                InboundArm::Request(arm) => dispatch_body.line(format!(
                    "{}::{}(request) => self.dispatch_{}(request, replies).await,",
                    plan.inbound, arm.variant, arm.handler
                )),
            };
        }
        dispatch_body.line(format!(
            "{}::Unknown {{ key }} => Err({rt}::DispatchError::UnknownKey(key)),",
            plan.inbound
        ));
        dispatch_fn.push_block(dispatch_body);

        let message_fn = impl_block.new_fn("dispatch_message");
        message_fn.vis("pub");
        message_fn.set_async(true);
        message_fn.generic("R");
        message_fn.arg_ref_self();
        message_fn.arg("message", base);
        message_fn.arg("replies", "&R");
        message_fn.ret(format!("Result<(), {rt}::DispatchError>"));
        message_fn.bound("R", format!("{rt}::Replies<{base}>"));
        message_fn.line(format!(
            "self.dispatch({}::from_message(message), replies).await",
            plan.inbound
        ));

        for arm in &plan.arms {
            let arm_fn = impl_block.new_fn(&format!("dispatch_{}", arm.handler()));
            arm_fn.set_async(true);
            arm_fn.arg_ref_self();
            arm_fn.ret(format!("Result<(), {rt}::DispatchError>"));
            let body = match arm {
                InboundArm::OneWay { message, .. } => {
                    let message = ctx.name(*message);
                    arm_fn.arg("message", message);
                    section(0, |w| ctx.one_way_body(w, arm, message))?
                }
                InboundArm::Request(request) => {
                    arm_fn.generic("R");
                    arm_fn.arg("request", ctx.name(request.request));
                    arm_fn.arg("replies", "&R");
                    arm_fn.bound("R", format!("{rt}::Replies<{base}>"));
                    section(0, |w| ctx.request_body(w, arm, request))?
                }
            };
            for line in body.lines() {
                arm_fn.line(line);
            }
        }
        Ok(())
    }
}
