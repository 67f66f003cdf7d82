//! Emitting loaded tables as Rust source.
//!
//! Tables come out as sorted `static` slices, which a consumer can search
//! with `binary_search_by_key` without running any of the loaders.

use itertools::Itertools;
use proc_macro2::{Span, TokenStream};
use quote::{quote, ToTokens};

use crate::collation::CollationElement;
use crate::loader::LoadedProperty;

/// A value that can be written into a generated table.
pub trait TableValue: ToTokens {
    /// The Rust type of the emitted value.
    fn value_type() -> TokenStream;

    /// Whether the value has a literal form; `NaN` and infinities do not.
    fn is_literal(&self) -> bool {
        true
    }
}

impl TableValue for f64 {
    fn value_type() -> TokenStream {
        quote! { f64 }
    }

    fn is_literal(&self) -> bool {
        self.is_finite()
    }
}

macro_rules! primitive_table_value {
    ($($ty:ident),+) => {
        $(
            impl TableValue for $ty {
                fn value_type() -> TokenStream {
                    quote! { $ty }
                }
            }
        )+
    };
}

primitive_table_value!(u8, u16, u32, bool);

fn table_ident(name: &str) -> syn::Result<syn::Ident> {
    syn::parse_str(&name.to_uppercase().replace([' ', '-'], "_"))
}

/// `pub static NAME: &[(u32, V)]`, one entry per single-code-point key, in
/// code point order.  Sequence keys are left out.  A value with no literal
/// form is an error.
pub fn property_table_source<V: TableValue>(
    name: &str,
    loaded: &LoadedProperty<V>,
) -> syn::Result<syn::File> {
    let ident = table_ident(name)?;
    if let Some((key, _)) = loaded.table().iter().find(|(_, value)| !value.is_literal()) {
        return Err(syn::Error::new(
            Span::call_site(),
            format!("value for {key} in {name} has no literal form"),
        ));
    }
    let value_type = V::value_type();
    let entries = loaded
        .table()
        .iter()
        .filter(|(key, _)| key.is_single())
        .sorted_by_key(|(key, _)| key.first())
        .map(|(key, value)| {
            let code = key.first();
            quote! { (#code, #value) }
        });

    syn::parse2(quote! {
        pub static #ident: &[(u32, #value_type)] = &[#(#entries),*];
    })
}

/// `pub static NAME: &[(&[u32], &[(u16, u16, u16, bool)])]`, sorted by key
/// sequence.  Each weight is `(primary, secondary, tertiary, variable)`.
pub fn collation_table_source(
    name: &str,
    loaded: &LoadedProperty<CollationElement>,
) -> syn::Result<syn::File> {
    let ident = table_ident(name)?;
    let entries = loaded
        .table()
        .iter()
        .sorted_by(|(a, _), (b, _)| a.as_slice().cmp(b.as_slice()))
        .map(|(key, element)| {
            let codes = key.as_slice().iter();
            let weights = element.weights.iter();
            quote! { (&[#(#codes),*], &[#(#weights),*]) }
        });

    syn::parse2(quote! {
        pub static #ident: &[(&[u32], &[(u16, u16, u16, bool)])] = &[#(#entries),*];
    })
}

/// Source text for `file`, as one unformatted line.
pub fn render(file: &syn::File) -> String {
    file.to_token_stream().to_string()
}

#[cfg(test)]
use crate::loader::{load, load_collation, FieldLayout, PropertySpec, TableSizing};

#[cfg(test)]
fn static_entries(file: &syn::File) -> Vec<syn::Expr> {
    match &file.items[..] {
        [syn::Item::Static(item)] => match &*item.expr {
            syn::Expr::Reference(reference) => match &*reference.expr {
                syn::Expr::Array(array) => array.elems.iter().cloned().collect(),
                other => panic!("expected an array, got {}", other.to_token_stream()),
            },
            other => panic!("expected a reference, got {}", other.to_token_stream()),
        },
        items => panic!("expected one static, got {} items", items.len()),
    }
}

#[cfg(test)]
fn leading_int(expr: &syn::Expr) -> u32 {
    let syn::Expr::Tuple(tuple) = expr else {
        panic!("expected a tuple, got {}", expr.to_token_stream());
    };
    match &tuple.elems[0] {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(int),
            ..
        }) => int.base10_parse().expect("integer"),
        other => panic!("expected an integer, got {}", other.to_token_stream()),
    }
}

#[test]
fn property_table_is_sorted() {
    let spec = PropertySpec::new("combining class", FieldLayout::RANGE_VALUE, |value| {
        value.parse::<u8>().ok()
    });
    let input = "0334 ; 1\n0300..0302 ; 230\n0000 ; 0\n";
    let loaded = load(&spec, input.as_bytes(), "inline").expect("loads");

    let file = property_table_source("combining class", &loaded).expect("valid source");
    let syn::Item::Static(item) = &file.items[0] else {
        panic!("expected a static");
    };
    assert_eq!(item.ident, "COMBINING_CLASS");

    let codes = static_entries(&file).iter().map(leading_int).collect::<Vec<_>>();
    assert_eq!(codes, vec![0x0000, 0x0300, 0x0301, 0x0302, 0x0334]);
}

#[test]
fn flag_values_are_emitted_as_bits() {
    use crate::properties::{prop_list, PropList};

    let input = "0020 ; White_Space\n0020 ; Pattern_White_Space\n";
    let loaded = load(&prop_list(), input.as_bytes(), "inline").expect("loads");
    let file = property_table_source("prop_list", &loaded).expect("valid source");

    let entries = static_entries(&file);
    assert_eq!(entries.len(), 1);
    let expected = (PropList::WHITE_SPACE | PropList::PATTERN_WHITE_SPACE).bits();
    let syn::Expr::Tuple(tuple) = &entries[0] else {
        panic!("expected a tuple");
    };
    match &tuple.elems[1] {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(int),
            ..
        }) => assert_eq!(int.base10_parse::<u32>().expect("integer"), expected),
        other => panic!("expected bits, got {}", other.to_token_stream()),
    }
}

#[test]
fn collation_table_source_orders_sequences() {
    let input = "\
0062 ; [.2076.0020.0002]
0061 0062 ; [.06D9.0020.0002][.06EE.0020.0002]
0061 ; [.2075.0020.0002]
0020 ; [*0209.0020.0002]
";
    let loaded = load_collation(input.as_bytes(), "inline", TableSizing::Fixed(16)).expect("loads");
    let file = collation_table_source("allkeys", &loaded).expect("valid source");

    let entries = static_entries(&file);
    assert_eq!(entries.len(), 4);
    let firsts = entries
        .iter()
        .map(|entry| match entry {
            syn::Expr::Tuple(tuple) => tuple.elems[0].to_token_stream().to_string(),
            other => panic!("expected a tuple, got {}", other.to_token_stream()),
        })
        .collect::<Vec<_>>();
    assert!(firsts[0].contains("32u32"), "{}", firsts[0]);
    assert!(firsts[1].contains("97u32") && !firsts[1].contains("98u32"), "{}", firsts[1]);
    assert!(firsts[2].contains("97u32") && firsts[2].contains("98u32"), "{}", firsts[2]);
    assert!(firsts[3].contains("98u32"), "{}", firsts[3]);
}

#[test]
fn invalid_names_are_rejected() {
    let loaded = load(
        &PropertySpec::new("x", FieldLayout::RANGE_VALUE, |value| value.parse::<u8>().ok()),
        "0041 ; 1\n".as_bytes(),
        "inline",
    )
    .expect("loads");
    assert!(property_table_source("1st table", &loaded).is_err());
    assert!(render(&property_table_source("ok", &loaded).expect("valid")).starts_with("pub static OK"));
}

#[test]
fn non_finite_values_are_an_error() {
    let spec = PropertySpec::new("ratio", FieldLayout::RANGE_VALUE, |value| value.parse::<f64>().ok());
    let loaded = load(&spec, "0030 ; inf\n0031 ; 1.5\n".as_bytes(), "inline").expect("loads");
    let error = property_table_source("ratio", &loaded).expect_err("inf has no literal");
    assert!(error.to_string().contains("0030"), "{error}");

    let loaded = load(&spec, "0031 ; 1.5\n".as_bytes(), "inline").expect("loads");
    assert_eq!(static_entries(&property_table_source("ratio", &loaded).expect("valid")).len(), 1);
}
