//! Impl block analysis and validation logic
//!
//! Finds the handler methods of an `impl` block, checks their signatures and
//! works out the topic and payload type each one subscribes with.

use quote::ToTokens;
use syn::{
	FnArg, GenericArgument, ImplItem, ImplItemFn, ItemImpl, PathArguments,
	ReturnType, Type,
};

use crate::MacroArgs;

/// One method to subscribe
#[derive(Debug, Clone)]
pub struct HandlerMethod {
	/// Method identifier
	pub ident: syn::Ident,
	/// Topic pattern: prefix + method name without suffix
	pub topic: String,
	/// `async fn` handlers are spawned, others run on the blocking pool
	pub is_async: bool,
	/// Whether the method takes the `Event` parameter
	pub takes_event: bool,
}

/// Everything code generation needs to know about the `impl` block
#[derive(Debug)]
pub struct ImplAnalysisContext {
	/// Handler methods in declaration order
	pub handlers: Vec<HandlerMethod>,
	/// Payload type shared by all `Event<T>` parameters, if any handler has one
	pub payload_type: Option<Type>,
}

impl ImplAnalysisContext {
	/// Analyze the impl block, returning a context for code generation
	/// # Validation Rules
	/// 1. Must be an inherent impl, not a trait impl
	/// 2. Handler methods take `&self` and have no generic parameters
	/// 3. Handler methods return nothing
	/// 4. Handler methods take no parameter or exactly one `Event<T>`
	/// 5. Every `Event<T>` parameter uses the same `T`
	pub fn analyze(
		input_impl: &ItemImpl,
		macro_args: &MacroArgs,
	) -> Result<Self, syn::Error> {
		if let Some((_, trait_path, _)) = &input_impl.trait_ {
			return Err(syn::Error::new_spanned(
				trait_path,
				"event_handlers can only be applied to inherent impl blocks",
			));
		}

		let mut context = Self {
			handlers: Vec::new(),
			payload_type: None,
		};

		for item in &input_impl.items {
			let ImplItem::Fn(method) = item else {
				continue;
			};
			let name = method.sig.ident.to_string();
			let Some(event_name) = name.strip_suffix(&macro_args.suffix) else {
				continue;
			};

			let topic = format!("{}{}", macro_args.prefix, event_name);
			if topic.is_empty() {
				return Err(syn::Error::new_spanned(
					&method.sig.ident,
					format!(
						"handler `{name}` derives an empty topic: set a prefix \
						 or rename the method"
					),
				));
			}

			Self::validate_signature(method)?;
			let event_payload = Self::extract_event_payload(method)?;
			if let Some(payload) = &event_payload {
				context.merge_payload_type(method, payload)?;
			}

			context.handlers.push(HandlerMethod {
				ident: method.sig.ident.clone(),
				topic,
				is_async: method.sig.asyncness.is_some(),
				takes_event: event_payload.is_some(),
			});
		}

		Ok(context)
	}

	/// Check receiver, generics and return type of a handler method
	fn validate_signature(method: &ImplItemFn) -> Result<(), syn::Error> {
		let sig = &method.sig;
		let name = &sig.ident;

		let takes_shared_self = matches!(
			sig.inputs.first(),
			Some(FnArg::Receiver(receiver))
				if receiver.reference.is_some() && receiver.mutability.is_none()
		);
		if !takes_shared_self {
			return Err(syn::Error::new_spanned(
				sig,
				format!("handler `{name}` must take `&self`"),
			));
		}

		if !sig.generics.params.is_empty() {
			return Err(syn::Error::new_spanned(
				&sig.generics,
				format!("handler `{name}` must not have generic parameters"),
			));
		}

		if !Self::returns_unit(&sig.output) {
			return Err(syn::Error::new_spanned(
				&sig.output,
				format!("handler `{name}` must not return a value"),
			));
		}
		Ok(())
	}

	fn returns_unit(output: &ReturnType) -> bool {
		match output {
			| ReturnType::Default => true,
			| ReturnType::Type(_, ty) => {
				matches!(ty.as_ref(), Type::Tuple(tuple) if tuple.elems.is_empty())
			}
		}
	}

	/// Payload type of the `Event<T>` parameter, `None` for no parameter
	fn extract_event_payload(
		method: &ImplItemFn,
	) -> Result<Option<Type>, syn::Error> {
		let name = &method.sig.ident;
		let params: Vec<_> = method.sig.inputs.iter().skip(1).collect();

		match params.as_slice() {
			| [] => Ok(None),
			| [FnArg::Typed(param)] => {
				Self::event_payload_type(&param.ty).map(Some).ok_or_else(|| {
					syn::Error::new_spanned(
						&param.ty,
						format!(
							"handler `{name}` parameter must be `Event<T>`, got \
							 `{}`",
							param.ty.to_token_stream()
						),
					)
				})
			}
			| _ => Err(syn::Error::new_spanned(
				&method.sig.inputs,
				format!(
					"handler `{name}` takes {} parameters, expected none or a \
					 single `Event<T>`",
					params.len()
				),
			)),
		}
	}

	/// `T` from a type spelled `Event<T>` (any path prefix)
	fn event_payload_type(ty: &Type) -> Option<Type> {
		let Type::Path(type_path) = ty else {
			return None;
		};
		let segment = type_path.path.segments.last()?;
		if segment.ident != "Event" {
			return None;
		}
		let PathArguments::AngleBracketed(args) = &segment.arguments else {
			return None;
		};
		if args.args.len() != 1 {
			return None;
		}
		match args.args.first()? {
			| GenericArgument::Type(payload) => Some(payload.clone()),
			| _ => None,
		}
	}

	fn merge_payload_type(
		&mut self,
		method: &ImplItemFn,
		payload: &Type,
	) -> Result<(), syn::Error> {
		match &self.payload_type {
			| None => {
				self.payload_type = Some(payload.clone());
				Ok(())
			}
			| Some(existing)
				if existing.to_token_stream().to_string()
					== payload.to_token_stream().to_string() =>
			{
				Ok(())
			}
			| Some(existing) => Err(syn::Error::new_spanned(
				payload,
				format!(
					"handler `{}` expects `Event<{}>` but an earlier handler \
					 expects `Event<{}>`",
					method.sig.ident,
					payload.to_token_stream(),
					existing.to_token_stream()
				),
			)),
		}
	}

	/// Number of methods that will be subscribed
	pub fn handler_count(&self) -> usize {
		self.handlers.len()
	}
}
