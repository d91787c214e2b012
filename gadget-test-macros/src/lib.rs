use darling::ast::NestedMeta;
use darling::FromMeta;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, FnArg, Ident, ItemFn, Pat};

/// A local Postgres test instance, selected by major version.
#[derive(Debug, FromMeta)]
enum Instance {
    Postgres(u16),
}

impl Instance {
    const SUPPORTED_VERSIONS: std::ops::RangeInclusive<u16> = 12..=17;

    fn port(&self) -> darling::Result<u16> {
        match self {
            Instance::Postgres(v) if Self::SUPPORTED_VERSIONS.contains(v) => Ok(5400 + v),
            Instance::Postgres(v) => Err(darling::Error::custom(format!(
                "No test instance for postgres {v}, supported versions are {}..={}",
                Self::SUPPORTED_VERSIONS.start(),
                Self::SUPPORTED_VERSIONS.end()
            ))),
        }
    }

    fn label(&self) -> String {
        match self {
            Instance::Postgres(v) => format!("postgres_{v}"),
        }
    }
}

#[derive(Debug, FromMeta)]
struct PgTestArgs {
    #[darling(multiple, rename = "arg")]
    instances: Vec<Instance>,
}

/// Runs the annotated function against fresh databases on the local test instances.
///
/// Every `arg(postgres = N)` creates a database on the instance for Postgres `N`
/// (port `54NN`) and passes a `&TestHelper` for it. `test_helpers` has to be in
/// scope where the attribute is used. The generated tests are ignored by default,
/// run them with `cargo test -- --ignored` once the instances are up.
#[proc_macro_attribute]
pub fn pg_test(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    match expand(args.into(), input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.write_errors().into(),
    }
}

fn expand(args: TokenStream2, input: ItemFn) -> darling::Result<TokenStream2> {
    let meta = NestedMeta::parse_meta_list(args)?;
    let args = PgTestArgs::from_list(&meta)?;

    let inputs = &input.sig.inputs;
    if inputs.len() != args.instances.len() {
        return Err(darling::Error::custom(format!(
            "`{}` takes {} helpers, but {} instances are listed",
            input.sig.ident,
            inputs.len(),
            args.instances.len()
        )));
    }

    let helpers = inputs.iter().map(helper_ident).collect::<darling::Result<Vec<_>>>()?;

    let mut setup = Vec::with_capacity(helpers.len());
    for (helper, instance) in helpers.iter().zip(&args.instances) {
        let port = instance.port()?;
        let helper_name = helper.to_string();
        setup.push(quote! {
            let #helper = test_helpers::get_test_helper_on_port(#helper_name, #port).await;
        });
    }

    // Helpers are stopped in reverse order of creation.
    let teardown = helpers.iter().rev().map(|helper| quote! { #helper.stop().await; });

    let function_name = &input.sig.ident;
    let labels = args.instances.iter().map(Instance::label).collect::<Vec<_>>();
    let test_name = format_ident!("{}_{}", labels.join("_"), function_name);

    let call = quote! { #function_name(#(&#helpers),*) };
    let call = if input.sig.asyncness.is_some() {
        quote! { #call.await; }
    } else {
        quote! { #call; }
    };

    Ok(quote! {
        #input

        #[tokio::test]
        #[ignore = "needs the local postgres test instances"]
        async fn #test_name() {
            #(#setup)*

            #call

            #(#teardown)*
        }
    })
}

fn helper_ident(arg: &FnArg) -> darling::Result<Ident> {
    match arg {
        FnArg::Typed(typed) => match &*typed.pat {
            Pat::Ident(pat) => Ok(pat.ident.clone()),
            _ => Err(darling::Error::custom("Helper arguments have to be plain identifiers")),
        },
        FnArg::Receiver(_) => Err(darling::Error::custom("pg_test does not support methods")),
    }
}
