use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, ItemStruct, LitStr};

use crate::schema_extraction::{
    collect_doc_comments, collect_field_docs, ensure_named_struct, infer_description,
    infer_schema_name, parse_completion_schema_args,
};

pub fn completion_schema(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match parse_completion_schema_args(attr) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };

    let item_struct = parse_macro_input!(item as ItemStruct);

    if let Err(err) = check_supported(&item_struct) {
        return err.to_compile_error().into();
    }

    let schema_name = infer_schema_name(&item_struct, args.name.as_ref());
    let description = infer_description(
        args.description.as_ref(),
        collect_doc_comments(&item_struct.attrs),
    );
    let handle_init = handle_initializer(&item_struct, &schema_name, description.as_ref());
    let ident = &item_struct.ident;

    let expanded = quote! {
        #item_struct

        impl trip_planner_rs::schemas::CompletionSchema for #ident {
            fn schema() -> &'static trip_planner_rs::schemas::SchemaHandle {
                static HANDLE: std::sync::OnceLock<trip_planner_rs::schemas::SchemaHandle> =
                    std::sync::OnceLock::new();
                HANDLE.get_or_init(|| #handle_init)
            }
        }
    };

    expanded.into()
}

fn check_supported(item: &ItemStruct) -> syn::Result<()> {
    ensure_named_struct(item)?;

    if !item.generics.params.is_empty() {
        return Err(syn::Error::new(
            item.generics.span(),
            "`#[completion_schema]` does not support generic structs",
        ));
    }

    Ok(())
}

/// Builds the block that generates, annotates and wraps the root schema.
fn handle_initializer(
    item: &ItemStruct,
    schema_name: &LitStr,
    description: Option<&LitStr>,
) -> TokenStream2 {
    let description_tokens = match description {
        Some(lit) => quote! { Some(#lit) },
        None => quote! { None },
    };

    let field_doc_tokens: Vec<_> = collect_field_docs(item)
        .into_iter()
        .map(|(field, doc)| {
            let field_lit = LitStr::new(&field, Span::call_site());
            let doc_lit = LitStr::new(&doc, Span::call_site());
            quote! { (#field_lit, #doc_lit) }
        })
        .collect();

    let type_name = LitStr::new(&item.ident.to_string(), Span::call_site());

    quote! {{
        let mut root = schemars::schema_for!(Self);
        trip_planner_rs::schemas::apply_doc_comments(
            &mut root,
            #schema_name,
            #description_tokens,
            &[#(#field_doc_tokens),*],
        );
        trip_planner_rs::schemas::SchemaHandle::from_root_schema::<Self>(
            #schema_name,
            #type_name,
            root,
        )
    }}
}
