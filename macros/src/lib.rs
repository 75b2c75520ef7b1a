//! # Wildcard Bus Macros
//!
//! `#[event_handlers]` turns the methods of an inherent `impl` block into bus
//! subscriptions by naming convention:
//!
//! ```rust,ignore
//! struct Audit;
//!
//! #[event_handlers(prefix = "user.")]
//! impl Audit {
//!     // subscribed to "user.created", runs as an async task
//!     async fn created_handler(&self, event: Event<String>) { /* ... */ }
//!
//!     // subscribed to "user.deleted", runs on the blocking pool
//!     fn deleted_handler(&self) { /* ... */ }
//! }
//!
//! let subscribers = bus.subscribe_set(Arc::new(Audit));
//! ```
//!
//! Methods whose name does not end with the suffix are left alone.

mod analysis;
mod codegen;


use proc_macro::TokenStream;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Expr, ExprLit, ItemImpl, Lit, MetaNameValue, Token, parse_macro_input};

use crate::analysis::ImplAnalysisContext;
use crate::codegen::CodeGenerator;

/// Suffix marking handler methods when none is given
const DEFAULT_SUFFIX: &str = "_handler";

/// Subscribes the handler methods of an `impl` block to a bus.
///
/// # Arguments
/// - `prefix = "..."`: prepended to every derived topic (default empty)
/// - `suffix = "..."`: marks handler methods, stripped from the topic
///   (default `_handler`)
///
/// Every method ending with the suffix must take `&self`, return nothing and
/// accept either no parameter or a single `Event<T>`. `async fn` handlers run
/// as tasks, plain `fn` handlers on the blocking pool.
///
/// Generates `impl HandlerSet<T> for Type`, with `T` taken from the `Event`
/// parameters, or generic when no handler takes one.
#[proc_macro_attribute]
pub fn event_handlers(args: TokenStream, input: TokenStream) -> TokenStream {
	let macro_args = parse_macro_input!(args as MacroArgs);
	let input_impl = parse_macro_input!(input as ItemImpl);

	match expand(macro_args, &input_impl) {
		| Ok(tokens) => tokens.into(),
		| Err(err) => err.to_compile_error().into(),
	}
}

fn expand(
	macro_args: MacroArgs,
	input_impl: &ItemImpl,
) -> Result<proc_macro2::TokenStream, syn::Error> {
	let context = ImplAnalysisContext::analyze(input_impl, &macro_args)?;
	let generator = CodeGenerator::new(context);
	Ok(generator.generate_complete_implementation(input_impl))
}

/// Parsed `#[event_handlers(...)]` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
struct MacroArgs {
	prefix: String,
	suffix: String,
}

impl Default for MacroArgs {
	fn default() -> Self {
		Self {
			prefix: String::new(),
			suffix: DEFAULT_SUFFIX.to_string(),
		}
	}
}

impl Parse for MacroArgs {
	fn parse(input: ParseStream) -> syn::Result<Self> {
		let mut args = Self::default();
		let pairs =
			Punctuated::<MetaNameValue, Token![,]>::parse_terminated(input)?;

		for pair in pairs {
			let value = match &pair.value {
				| Expr::Lit(ExprLit {
					lit: Lit::Str(value),
					..
				}) => value.value(),
				| other => {
					return Err(syn::Error::new_spanned(
						other,
						"event_handlers arguments take string literals",
					));
				}
			};

			if pair.path.is_ident("prefix") {
				args.prefix = value;
			} else if pair.path.is_ident("suffix") {
				if value.is_empty() {
					return Err(syn::Error::new_spanned(
						&pair.value,
						"suffix must not be empty",
					));
				}
				args.suffix = value;
			} else {
				return Err(syn::Error::new_spanned(
					&pair.path,
					"unknown event_handlers argument, expected `prefix` or \
					 `suffix`",
				));
			}
		}
		Ok(args)
	}
}
