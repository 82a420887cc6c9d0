use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Path};

/// Derive macro describing a struct to the recast engine.
///
/// Implements `recast_engine::Reflect` and `recast_engine::ReflectRecord`.
/// The record identity is the struct name plus `module_path!()`.
///
/// Field attributes:
///
/// - `#[recast(rename(Other = "name"))]`: when converting to or from a record
///   named `Other`, this field is matched against the field `name`. The key
///   may be the short type name or a module-qualified path
///   (`my_crate::models::Other = "name"`); qualified keys take precedence.
/// - `#[recast(skip)]`: the engine never writes this field.
///
/// # Example
///
/// ```ignore
/// #[derive(Reflect)]
/// pub struct TwoIntsA {
///     pub first: i64,
///     #[recast(rename(TwoIntsB = "second_b"))]
///     pub second: i64,
/// }
/// ```
///
/// Supports structs with named fields and unit structs, without generics.
#[proc_macro_derive(Reflect, attributes(recast))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.unraw().to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Reflect does not support generic structs",
        ));
    }

    let data = match &input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Reflect only supports structs",
            ))
        }
    };

    let fields = match &data.fields {
        Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                name,
                "Reflect only supports structs with named fields",
            ))
        }
    };

    let mut decl_tokens = Vec::new();
    let mut to_value_tokens = Vec::new();
    let mut from_value_tokens = Vec::new();

    for field in &fields {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected named field"))?;
        let field_name_str = field_name.unraw().to_string();
        let field_ty = &field.ty;

        // Parse #[recast(...)] attributes.
        let mut readonly = false;
        let mut renames: Vec<(String, String)> = Vec::new();

        for attr in &field.attrs {
            if !attr.path().is_ident("recast") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    readonly = true;
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    meta.parse_nested_meta(|entry| {
                        let other = path_string(&entry.path);
                        let target: LitStr = entry.value()?.parse()?;
                        renames.push((other, target.value()));
                        Ok(())
                    })
                } else {
                    Err(meta.error("unknown recast attribute (expected `skip` or `rename(...)`)"))
                }
            })?;
        }

        let readonly_expr = if readonly {
            quote! { .readonly() }
        } else {
            quote! {}
        };
        let rename_exprs = renames
            .iter()
            .map(|(other, target)| quote! { .rename(#other, #target) });

        decl_tokens.push(quote! {
            ::recast_engine::FieldDecl::new(
                #field_name_str,
                <#field_ty as ::recast_engine::Reflect>::type_desc(),
            )
            #readonly_expr
            #(#rename_exprs)*
        });
        to_value_tokens.push(quote! {
            ::recast_engine::Reflect::to_value(&self.#field_name)
        });
        from_value_tokens.push(quote! {
            #field_name: __reader.take(#field_name_str)?
        });
    }

    let construct = match &data.fields {
        Fields::Unit => quote! { #name },
        _ => quote! { #name { #(#from_value_tokens),* } },
    };

    let expanded = quote! {
        impl ::recast_engine::ReflectRecord for #name {
            fn record_type() -> ::recast_engine::RecordType {
                ::recast_engine::RecordType::new(
                    ::recast_engine::TypeIdentity::new(
                        #name_str,
                        ::std::concat!(::std::module_path!(), "::", #name_str),
                    ),
                    || ::std::vec![#(#decl_tokens),*],
                )
            }
        }

        impl ::recast_engine::Reflect for #name {
            fn type_desc() -> ::recast_engine::TypeDesc {
                ::recast_engine::TypeDesc::Record(
                    <Self as ::recast_engine::ReflectRecord>::record_type(),
                )
            }

            fn to_value(&self) -> ::recast_engine::Value {
                ::recast_engine::Value::Record(::recast_engine::RecordValue::new(
                    <Self as ::recast_engine::ReflectRecord>::record_type(),
                    ::std::vec![#(#to_value_tokens),*],
                ))
            }

            fn from_value(__value: ::recast_engine::Value) -> ::recast_engine::Result<Self> {
                #[allow(unused_mut, unused_variables)]
                let mut __reader = ::recast_engine::reflect::expect_record::<Self>(__value)?;
                ::std::result::Result::Ok(#construct)
            }
        }
    };

    Ok(expanded)
}

/// Render a path as `a::b::C`, the form rename keys are matched in.
fn path_string(path: &Path) -> String {
    path.segments
        .iter()
        .map(|seg| seg.ident.unraw().to_string())
        .collect::<Vec<_>>()
        .join("::")
}
