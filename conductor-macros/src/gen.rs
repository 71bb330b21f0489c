//! Implementation of `#[controller]`; `lib.rs` only declares the macro
//! entry point.
//!
//! The expansion is one `const _: ()` block per controller struct holding
//! plain `fn` items (capability casts, dependency ids, build, inject) and
//! the `inventory::submit!` of the assembled `Registration`.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, GenericArgument, Item, ItemStruct, Meta, Path, PathArguments, Token, Type};

pub(crate) fn controller_entry(args: TokenStream, input: TokenStream) -> TokenStream {
    let args_ts = proc_macro2::TokenStream::from(args);
    let item = parse_macro_input!(input as Item);
    match item {
        Item::Struct(item) => controller_for_struct(item, args_ts),
        other => syn::Error::new_spanned(other, "#[controller] only supports struct definitions")
            .to_compile_error()
            .into(),
    }
}

struct ControllerArgs {
    implements: Vec<Path>,
    after: Option<Path>,
    create: Option<Vec<CreateArg>>,
}

enum CreateArg {
    /// `Shared<dyn Cap>`: registry dependency, ordering-relevant.
    Dep(Type),
    /// `View<V>`: presentation dependency, slot 0.
    View(Type),
    /// `Host`: the frame driver handle.
    Host,
    /// `BuildContext`: hands the constructor the build context itself
    /// (direct creation from inside a constructor).
    Builder,
}

fn parse_args(
    args: proc_macro2::TokenStream,
    errors: &mut Vec<proc_macro2::TokenStream>,
) -> ControllerArgs {
    let mut out = ControllerArgs {
        implements: Vec::new(),
        after: None,
        create: None,
    };
    let metas = match Punctuated::<Meta, Token![,]>::parse_terminated.parse2(args) {
        Ok(metas) => metas,
        Err(e) => {
            errors.push(e.to_compile_error());
            return out;
        }
    };
    for meta in metas {
        match &meta {
            Meta::List(list) if list.path.is_ident("implements") => {
                match list.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated) {
                    Ok(paths) => out.implements = paths.into_iter().collect(),
                    Err(e) => errors.push(e.to_compile_error()),
                }
            }
            Meta::List(list) if list.path.is_ident("after") => {
                if out.after.is_some() {
                    errors.push(
                        syn::Error::new_spanned(list, "at most one after(..) target is supported")
                            .to_compile_error(),
                    );
                    continue;
                }
                match list.parse_args::<Path>() {
                    Ok(path) => out.after = Some(path),
                    Err(e) => errors.push(e.to_compile_error()),
                }
            }
            Meta::List(list) if list.path.is_ident("create") => {
                match list.parse_args_with(Punctuated::<Type, Token![,]>::parse_terminated) {
                    Ok(types) => {
                        let mut create = Vec::new();
                        for ty in &types {
                            match classify_create_arg(ty) {
                                Some(arg) => create.push(arg),
                                None => errors.push(
                                    syn::Error::new_spanned(
                                        ty,
                                        "constructor parameters must be Shared<dyn Cap>, View<V>, Host, or BuildContext",
                                    )
                                    .to_compile_error(),
                                ),
                            }
                        }
                        out.create = Some(create);
                    }
                    Err(e) => errors.push(e.to_compile_error()),
                }
            }
            other => errors.push(
                syn::Error::new_spanned(
                    other,
                    "unsupported #[controller] argument; expected implements(..), after(..) or create(..)",
                )
                .to_compile_error(),
            ),
        }
    }
    out
}

fn generic_inner(segment: &syn::PathSegment) -> Option<&Type> {
    if let PathArguments::AngleBracketed(args) = &segment.arguments {
        for arg in &args.args {
            if let GenericArgument::Type(ty) = arg {
                return Some(ty);
            }
        }
    }
    None
}

fn classify_create_arg(ty: &Type) -> Option<CreateArg> {
    if let Type::Reference(reference) = ty {
        // only the build context makes sense behind a reference
        return match classify_create_arg(&reference.elem) {
            Some(CreateArg::Builder) => Some(CreateArg::Builder),
            _ => None,
        };
    }
    let Type::Path(path) = ty else { return None };
    let segment = path.path.segments.last()?;
    match segment.ident.to_string().as_str() {
        "Shared" => generic_inner(segment).cloned().map(CreateArg::Dep),
        "View" => generic_inner(segment).cloned().map(CreateArg::View),
        "Host" => Some(CreateArg::Host),
        "BuildContext" => Some(CreateArg::Builder),
        _ => None,
    }
}

enum SlotKind {
    Single(Type),
    Collection(Type),
    ViewOne(Type),
    ViewMany(Type),
    Host,
}

/// Injection is declared by the field's slot type; the type name is the
/// annotation, matched by its last path segment.
fn slot_kind(ty: &Type) -> Option<SlotKind> {
    let Type::Path(path) = ty else { return None };
    let segment = path.path.segments.last()?;
    match segment.ident.to_string().as_str() {
        "Dep" => generic_inner(segment).cloned().map(SlotKind::Single),
        "Deps" => generic_inner(segment).cloned().map(SlotKind::Collection),
        "View" => generic_inner(segment).cloned().map(SlotKind::ViewOne),
        "Views" => generic_inner(segment).cloned().map(SlotKind::ViewMany),
        "HostRef" => Some(SlotKind::Host),
        _ => None,
    }
}

fn controller_for_struct(item: ItemStruct, args: proc_macro2::TokenStream) -> TokenStream {
    let mut errors: Vec<proc_macro2::TokenStream> = Vec::new();
    let args = parse_args(args, &mut errors);
    let ident = &item.ident;

    if !item.generics.params.is_empty() {
        errors.push(
            syn::Error::new_spanned(&item.generics, "#[controller] does not support generic controllers")
                .to_compile_error(),
        );
    }

    if !errors.is_empty() {
        let expanded = quote! {
            #item
            #(#errors)*
        };
        return expanded.into();
    }

    // capability vtable: id + name + concrete-to-capability cast per trait
    let mut cap_fns = Vec::new();
    let mut cap_rows = Vec::new();
    for (index, cap) in args.implements.iter().enumerate() {
        let id_fn = format_ident!("__cap_id_{}", index);
        let name_fn = format_ident!("__cap_name_{}", index);
        let cast_fn = format_ident!("__cap_cast_{}", index);
        cap_fns.push(quote! {
            fn #id_fn() -> ::std::any::TypeId {
                ::std::any::TypeId::of::<dyn #cap>()
            }
            fn #name_fn() -> &'static str {
                ::std::any::type_name::<dyn #cap>()
            }
            fn #cast_fn(cell: &conductor::holder::ControllerCell) -> ::std::boxed::Box<dyn ::std::any::Any> {
                let shared: conductor::component::Shared<dyn #cap> = cell.__concrete::<#ident>();
                ::std::boxed::Box::new(shared)
            }
        });
        cap_rows.push(quote! {
            conductor::registry::CapabilityVtable { id: #id_fn, name: #name_fn, cast: #cast_fn }
        });
    }

    // constructor: dependency refs for the orderer plus the build body
    let mut dep_fns = Vec::new();
    let mut dep_rows = Vec::new();
    let mut build_lets = Vec::new();
    let mut call_args = Vec::new();
    let uses_cx = args.create.as_ref().is_some_and(|create| !create.is_empty());
    if let Some(create) = &args.create {
        for (index, arg) in create.iter().enumerate() {
            let var = format_ident!("__arg_{}", index);
            match arg {
                CreateArg::Dep(inner) => {
                    let id_fn = format_ident!("__dep_id_{}", index);
                    let name_fn = format_ident!("__dep_name_{}", index);
                    dep_fns.push(quote! {
                        fn #id_fn() -> ::std::any::TypeId {
                            ::std::any::TypeId::of::<#inner>()
                        }
                        fn #name_fn() -> &'static str {
                            ::std::any::type_name::<#inner>()
                        }
                    });
                    dep_rows.push(quote! {
                        conductor::registry::CapabilityRef { id: #id_fn, name: #name_fn }
                    });
                    build_lets.push(quote! { let #var = cx.dep::<#inner>()?; });
                    call_args.push(quote! { #var });
                }
                CreateArg::View(inner) => {
                    build_lets.push(quote! { let #var = cx.view::<#inner>()?; });
                    call_args.push(quote! { #var });
                }
                CreateArg::Host => {
                    build_lets.push(quote! { let #var = cx.host(); });
                    call_args.push(quote! { #var });
                }
                CreateArg::Builder => {
                    call_args.push(quote! { cx });
                }
            }
        }
    }
    let cx_param = if uses_cx {
        format_ident!("cx")
    } else {
        format_ident!("_cx")
    };
    let build_body = if args.create.is_some() {
        quote! {
            #(#build_lets)*
            let built = <#ident>::new(#(#call_args),*);
        }
    } else {
        quote! {
            let built = <#ident as ::core::default::Default>::default();
        }
    };
    // explicit Default assertion when no create(..) is declared: a missing
    // Default impl surfaces here with a readable message
    let default_assert = if args.create.is_none() {
        let assert_ident = format_ident!("__AssertDefaultFor{}", ident);
        Some(quote! {
            #[allow(non_camel_case_types, dead_code)]
            trait #assert_ident {
                fn __assert_default() {
                    let _ = <#ident as ::core::default::Default>::default();
                }
            }
        })
    } else {
        None
    };

    // field injection from slot-typed fields
    let mut inject_stmts = Vec::new();
    if let syn::Fields::Named(named) = &item.fields {
        for field in &named.named {
            let Some(kind) = slot_kind(&field.ty) else {
                continue;
            };
            let field_ident = field.ident.as_ref().expect("named field");
            let field_name = field_ident.to_string();
            let stmt = match kind {
                SlotKind::Single(inner) => quote! {
                    this.#field_ident.__bind(
                        cx.__single::<#inner>(::std::any::type_name::<#ident>(), #field_name)?,
                    );
                },
                SlotKind::Collection(inner) => quote! {
                    this.#field_ident.__bind_all(cx.__collection::<#inner>());
                },
                SlotKind::ViewOne(inner) => quote! {
                    this.#field_ident.__bind(
                        cx.__view::<#inner>(::std::any::type_name::<#ident>(), #field_name)?,
                    );
                },
                SlotKind::ViewMany(inner) => quote! {
                    this.#field_ident.__bind_all(cx.__views::<#inner>());
                },
                SlotKind::Host => quote! {
                    this.#field_ident.__bind(cx.__host());
                },
            };
            inject_stmts.push(stmt);
        }
    }
    let inject_body = if inject_stmts.is_empty() {
        quote! {
            let _ = (cell, cx);
            ::core::result::Result::Ok(())
        }
    } else {
        quote! {
            let shared = cell.__concrete::<#ident>();
            let this = shared.borrow();
            #(#inject_stmts)*
            ::core::result::Result::Ok(())
        }
    };

    let after_fns = args.after.as_ref().map(|target| {
        quote! {
            fn __after_id() -> ::std::any::TypeId {
                ::std::any::TypeId::of::<#target>()
            }
            fn __after_name() -> &'static str {
                ::std::any::type_name::<#target>()
            }
        }
    });
    let after_value = if args.after.is_some() {
        quote! {
            ::core::option::Option::Some(conductor::registry::AfterRef {
                id: __after_id,
                name: __after_name,
            })
        }
    } else {
        quote! { ::core::option::Option::None }
    };

    let expanded = quote! {
        #item

        #default_assert

        #[doc(hidden)]
        const _: () = {
            #(#cap_fns)*
            #(#dep_fns)*
            #after_fns

            static __CAPS: &[conductor::registry::CapabilityVtable] = &[#(#cap_rows),*];
            static __DEPS: &[conductor::registry::CapabilityRef] = &[#(#dep_rows),*];

            fn __type_name() -> &'static str {
                ::std::any::type_name::<#ident>()
            }
            fn __type_id() -> ::std::any::TypeId {
                ::std::any::TypeId::of::<#ident>()
            }
            fn __caps() -> &'static [conductor::registry::CapabilityVtable] {
                __CAPS
            }
            fn __deps() -> &'static [conductor::registry::CapabilityRef] {
                __DEPS
            }
            fn __build(
                #cx_param: &mut conductor::app::BuildContext<'_>,
            ) -> conductor::error::Result<conductor::holder::ControllerCell> {
                #build_body
                ::core::result::Result::Ok(conductor::holder::ControllerCell::of(built))
            }
            fn __inject(
                cell: &conductor::holder::ControllerCell,
                cx: &conductor::app::InjectContext<'_>,
            ) -> conductor::error::Result<()> {
                #inject_body
            }

            inventory::submit! {
                conductor::registry::Registration {
                    type_name: __type_name,
                    type_id: __type_id,
                    after: #after_value,
                    capabilities: __caps,
                    dependencies: __deps,
                    build: __build,
                    inject: __inject,
                }
            };
        };
    };
    expanded.into()
}
