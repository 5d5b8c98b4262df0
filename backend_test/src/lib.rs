use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Turn an asynchronous API test into a synchronous one running against a
/// fresh server, and inject dependencies.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`] and
/// the `ManualClock` driving the server's ledger.
///
/// By default only the test admin may create elections; pass `unrestricted`
/// to let anyone.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract type information and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    let unrestricted = match parse_macro_input!(args as Option<Ident>) {
        None => false,
        Some(arg) if arg == "unrestricted" => true,
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected no argument or `unrestricted`")
                .into_compile_error()
                .into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Rewrite the test function.
    quote! {
        #[rocket::async_test]
        async fn #name() {
            /// The test itself.
            #item_fn

            #[allow(unused_variables)]
            let (rocket_client, clock) = crate::test_support::setup(#unrestricted).await;

            #new_name(#(#test_args),*).await;
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_clock = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let (Pat::Ident(_), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty) {
                if let Some(type_ident) = type_path.path.segments.last().map(|s| &s.ident) {
                    if type_ident == "Client" {
                        if has_client {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `rocket::local::asynchronous::Client`",
                            ));
                        }
                        has_client = true;
                        args.push(quote! { rocket_client });
                        continue;
                    } else if type_ident == "ManualClock" {
                        if has_clock {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `ManualClock`",
                            ));
                        }
                        has_clock = true;
                        args.push(quote! { clock.clone() });
                        continue;
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client` or `clock_ident: ManualClock`",
        ));
    }

    Ok(args)
}
