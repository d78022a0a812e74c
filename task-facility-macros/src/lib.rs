//! Procedural macros for task-facility
//!
//! This crate provides the `#[task_facility::test]` attribute macro, which
//! installs a scheduler in the process-wide registry for the duration of a
//! test and resets the registry afterward.
//!
//! # Example
//!
//! ```rust,ignore
//! use task_facility::prelude::*;
//!
//! #[task_facility::test]
//! fn delivers_inline(scheduler: SynchronousScheduler) {
//!     let probe = CallProbe::new();
//!     run_after_delay(7, probe.continuation());
//!     assert_eq!(probe.values(), vec![7]);
//!     assert_eq!(scheduler.executed(), 1);
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input, FnArg, Ident, ItemFn, Lit, Pat, Token, Type,
};

/// Which scheduler variant a test runs under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Variant {
    Synchronous,
    Concurrent,
}

impl Variant {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "synchronous" | "sync" => Some(Variant::Synchronous),
            "concurrent" => Some(Variant::Concurrent),
            _ => None,
        }
    }

    fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "SynchronousScheduler" => Some(Variant::Synchronous),
            "ConcurrentScheduler" => Some(Variant::Concurrent),
            _ => None,
        }
    }

    fn path(self) -> TokenStream2 {
        match self {
            Variant::Synchronous => quote! { ::task_facility::scheduler::SynchronousScheduler },
            Variant::Concurrent => quote! { ::task_facility::scheduler::ConcurrentScheduler },
        }
    }
}

/// Configuration options for the test macro.
#[derive(Default)]
struct TestConfig {
    /// Scheduler variant to install (default: synchronous)
    scheduler: Option<Variant>,
}

impl Parse for TestConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut config = TestConfig::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "scheduler" => {
                    let lit: Lit = input.parse()?;
                    let Lit::Str(s) = &lit else {
                        return Err(syn::Error::new_spanned(lit, "expected a string"));
                    };
                    let variant = Variant::from_name(&s.value()).ok_or_else(|| {
                        syn::Error::new(
                            s.span(),
                            format!(
                                "unsupported scheduler: {}. Use \"synchronous\" or \"concurrent\"",
                                s.value()
                            ),
                        )
                    })?;
                    config.scheduler = Some(variant);
                }
                _ => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {ident}"),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(config)
    }
}

/// Determines which scheduler variant a parameter asks for, if any.
fn scheduler_param(arg: &FnArg) -> Option<(Variant, &Pat)> {
    if let FnArg::Typed(pat_type) = arg {
        if let Type::Path(type_path) = &*pat_type.ty {
            if let Some(segment) = type_path.path.segments.last() {
                return Variant::from_type_name(&segment.ident.to_string())
                    .map(|variant| (variant, &*pat_type.pat));
            }
        }
    }
    None
}

/// Test attribute macro that runs the body with a scheduler installed.
///
/// The registry guard serializes against other tests that install
/// schedulers and resets the registry when the test ends, including when
/// it panics.
///
/// # Configuration Options
///
/// - `scheduler = "synchronous"` (default) or `scheduler = "concurrent"`
///
/// A parameter typed `SynchronousScheduler` or `ConcurrentScheduler`
/// receives the installed instance and selects the variant.
///
/// ```rust,ignore
/// #[task_facility::test(scheduler = "concurrent")]
/// fn runs_detached() {
///     let probe = CallProbe::new();
///     run_after_delay(3, probe.continuation());
///     assert!(probe.wait_for_calls(1, Duration::from_secs(5)));
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let config = parse_macro_input!(attr as TestConfig);
    let input = parse_macro_input!(item as ItemFn);

    expand_test(&config, &input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_test(config: &TestConfig, input: &ItemFn) -> syn::Result<TokenStream2> {
    let name = &input.sig.ident;
    let body = &input.block;
    let attrs = &input.attrs;
    let vis = &input.vis;
    let output = &input.sig.output;

    if input.sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            &input.sig,
            "test function must not be async",
        ));
    }

    let mut requested = None;
    for arg in &input.sig.inputs {
        match scheduler_param(arg) {
            Some(param) if requested.is_none() => requested = Some(param),
            Some(_) => {
                return Err(syn::Error::new_spanned(
                    arg,
                    "only one scheduler parameter is supported",
                ))
            }
            None => {
                return Err(syn::Error::new_spanned(
                    arg,
                    "test parameters must be a SynchronousScheduler or ConcurrentScheduler",
                ))
            }
        }
    }

    let variant = match (config.scheduler, requested.map(|(variant, _)| variant)) {
        (Some(configured), Some(param)) if configured != param => {
            return Err(syn::Error::new_spanned(
                &input.sig.inputs,
                "scheduler parameter type does not match the `scheduler` option",
            ));
        }
        (_, Some(param)) => param,
        (Some(configured), None) => configured,
        (None, None) => Variant::Synchronous,
    };
    let scheduler_type = variant.path();

    let scheduler_init = if let Some((_, pat)) = requested {
        quote! {
            let #pat = #scheduler_type::new();
            let __task_facility_guard = ::task_facility::registry::install(
                ::std::sync::Arc::new(::std::clone::Clone::clone(&#pat)),
            );
        }
    } else {
        quote! {
            let __task_facility_guard = ::task_facility::registry::install(
                ::std::sync::Arc::new(#scheduler_type::new()),
            );
        }
    };

    Ok(quote! {
        #[::core::prelude::v1::test]
        #(#attrs)*
        #vis fn #name() #output {
            #scheduler_init
            #body
        }
    })
}
