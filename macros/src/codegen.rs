//! Code generation logic
//!
//! Emits the `HandlerSet` implementation for an analysed `impl` block. The
//! original block is passed through untouched.

use quote::{format_ident, quote};
use syn::ItemImpl;

use crate::analysis::{HandlerMethod, ImplAnalysisContext};

/// Handles all code generation for `#[event_handlers]`
pub struct CodeGenerator {
	context: ImplAnalysisContext,
}

impl CodeGenerator {
	/// Create a new code generator with the given analysis context
	pub fn new(context: ImplAnalysisContext) -> Self {
		Self { context }
	}

	/// Original impl block followed by the generated `HandlerSet` impl
	pub fn generate_complete_implementation(
		&self,
		input_impl: &ItemImpl,
	) -> proc_macro2::TokenStream {
		let handler_set_impl = self.generate_handler_set_impl(input_impl);
		quote! {
			#input_impl
			#handler_set_impl
		}
	}

	/// `impl HandlerSet<T> for Type`, generic over `T` when no handler
	/// names a payload type
	fn generate_handler_set_impl(
		&self,
		input_impl: &ItemImpl,
	) -> proc_macro2::TokenStream {
		let self_ty = &input_impl.self_ty;
		let mut generics = input_impl.generics.clone();

		let payload = match &self.context.payload_type {
			| Some(payload) => quote! { #payload },
			| None => {
				let param = format_ident!("__EventPayload");
				generics.params.push(syn::parse_quote! {
					#param: ::std::marker::Send + ::std::marker::Sync + 'static
				});
				quote! { #param }
			}
		};
		generics.make_where_clause().predicates.push(syn::parse_quote! {
			#self_ty: ::std::marker::Send + ::std::marker::Sync + 'static
		});
		let (impl_generics, _, where_clause) = generics.split_for_impl();

		let handler_count = self.context.handler_count();
		let subscriptions = self
			.context
			.handlers
			.iter()
			.map(|handler| Self::generate_subscription(handler, &payload));

		quote! {
			impl #impl_generics ::wildcard_bus::HandlerSet<#payload> for #self_ty
			#where_clause
			{
				fn subscribe_to(
					self: ::std::sync::Arc<Self>,
					bus: &::wildcard_bus::Bus<#payload>,
				) -> ::std::vec::Vec<::wildcard_bus::Subscriber> {
					let mut subscribers =
						::std::vec::Vec::with_capacity(#handler_count);
					#(#subscriptions)*
					subscribers
				}
			}
		}
	}

	/// One `bus.subscribe*` call forwarding events into `handler`
	fn generate_subscription(
		handler: &HandlerMethod,
		payload: &proc_macro2::TokenStream,
	) -> proc_macro2::TokenStream {
		let method = &handler.ident;
		let topic = &handler.topic;
		let call_args = if handler.takes_event {
			quote! { event }
		} else {
			quote! {}
		};
		let event_binding = if handler.takes_event {
			quote! { event }
		} else {
			quote! { _event }
		};

		let callback = if handler.is_async {
			quote! {
				move |#event_binding: ::wildcard_bus::Event<#payload>| {
					let this = ::std::sync::Arc::clone(&this);
					async move { this.#method(#call_args).await }
				}
			}
		} else {
			quote! {
				move |#event_binding: ::wildcard_bus::Event<#payload>| {
					this.#method(#call_args)
				}
			}
		};
		let subscribe = if handler.is_async {
			quote! { subscribe }
		} else {
			quote! { subscribe_blocking }
		};

		quote! {
			{
				let this = ::std::sync::Arc::clone(&self);
				subscribers.push(bus.#subscribe(#topic, #callback));
			}
		}
	}
}
