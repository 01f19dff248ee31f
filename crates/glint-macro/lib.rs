use darling::FromField;
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

/// Per-field options parsed from `#[glint(...)]`.
///
/// `name` renames the wire field (the Rust field name is the default);
/// `skip` excludes the field from the wire entirely. The remaining options
/// select an alternative field codec: `delta` for integer slices, `zigzag`
/// for `i64`/`Vec<i64>`, `stringer` for Display/FromStr round-trips,
/// `encoder` for binary-marshalled blobs. `copy` is accepted for tag
/// compatibility; decoded strings are always owned copies here.
#[derive(Debug, FromField)]
#[darling(attributes(glint))]
struct GlintField {
    ident: Option<syn::Ident>,
    ty: syn::Type,
    #[darling(default)]
    name: Option<String>,
    #[darling(default)]
    skip: bool,
    #[darling(default)]
    copy: bool,
    #[darling(default)]
    delta: bool,
    #[darling(default)]
    zigzag: bool,
    #[darling(default)]
    stringer: bool,
    #[darling(default)]
    encoder: bool,
}

#[proc_macro_derive(Glint, attributes(glint))]
pub fn derive_glint(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[derive(Glint)] does not support generic types",
        ));
    }
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            ident,
            "#[derive(Glint)] only supports structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            ident,
            "#[derive(Glint)] requires named fields",
        ));
    };

    let mut defs = Vec::new();
    for field in &fields.named {
        let parsed = match GlintField::from_field(field) {
            Ok(p) => p,
            Err(e) => return Ok(e.write_errors()),
        };
        if parsed.skip {
            continue;
        }
        let f_ident = parsed.ident.as_ref().expect("named field");
        let f_ty = &parsed.ty;
        let wire_name = parsed.name.clone().unwrap_or_else(|| f_ident.to_string());
        if wire_name.len() > 255 {
            return Err(syn::Error::new_spanned(
                field,
                "glint field names are limited to 255 bytes",
            ));
        }
        let picked = [parsed.delta, parsed.zigzag, parsed.stringer, parsed.encoder]
            .iter()
            .filter(|b| **b)
            .count();
        if picked > 1 {
            return Err(syn::Error::new_spanned(
                field,
                "glint options delta, zigzag, stringer, and encoder are mutually exclusive",
            ));
        }
        // `copy` changes nothing at this layer.
        let _ = parsed.copy;

        let ctor = if parsed.delta {
            quote!(glintx::codec::delta_field)
        } else if parsed.zigzag {
            quote!(glintx::codec::zigzag_field)
        } else if parsed.stringer {
            quote!(glintx::codec::stringer_field)
        } else if parsed.encoder {
            quote!(glintx::codec::binary_field)
        } else {
            quote!(glintx::codec::value_field)
        };

        defs.push(quote! {
            glintx::FieldDef::new(
                #wire_name,
                #ctor::<Self, #f_ty>(
                    {
                        fn get(t: &#ident) -> &#f_ty {
                            &t.#f_ident
                        }
                        get
                    },
                    {
                        fn get_mut(t: &mut #ident) -> &mut #f_ty {
                            &mut t.#f_ident
                        }
                        get_mut
                    },
                ),
            )
        });
    }

    Ok(quote! {
        impl glintx::Record for #ident {
            fn fields() -> ::std::vec::Vec<glintx::FieldDef<Self>> {
                <[_]>::into_vec(::std::boxed::Box::new([#(#defs),*]))
            }

            fn shape() -> &'static glintx::Shape<Self> {
                static SHAPE: ::std::sync::OnceLock<glintx::Shape<#ident>> =
                    ::std::sync::OnceLock::new();
                SHAPE.get_or_init(glintx::Shape::<#ident>::build)
            }
        }

        impl glintx::ElementCodec for #ident {
            fn wire() -> glintx::WireType {
                glintx::WireType::STRUCT
            }

            fn append_schema(out: &mut ::std::vec::Vec<u8>) {
                glintx::codec::struct_schema::<Self>(out);
            }

            fn encode(&self, buf: &mut glintx::Buffer) {
                glintx::codec::struct_encode::<Self>(self, buf);
            }

            fn reader(ty: &glintx::SchemaType) -> glintx::Result<glintx::codec::ReadFn<Self>> {
                glintx::codec::struct_reader::<Self>(ty)
            }

            fn field_instr<T: 'static>(
                get: glintx::codec::FieldMut<T, Self>,
                ty: &glintx::SchemaType,
            ) -> glintx::Result<glintx::Instr<T>> {
                glintx::codec::struct_field_instr::<T, Self>(get, ty)
            }
        }
    })
}
