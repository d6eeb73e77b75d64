//! Declarative helpers that implement [`Record`](crate::Record),
//! [`Schema`](crate::Schema) and [`EnvValue`](crate::EnvValue).

/// Implement [`Record`](crate::Record) for a struct by listing the fields the
/// environment may override. Unlisted fields are private to the overlay.
///
/// ```ignore
/// #[derive(Default, Clone)]
/// struct Server {
///     host: String,
///     port: u16,
///     allowed: Vec<String>,
///     cache: Option<u32>,
/// }
///
/// envoverlay::record!(Server { host, port, allowed as "allow-list" });
/// ```
///
/// Every listed field type must implement [`EnvValue`](crate::EnvValue).
#[macro_export]
macro_rules! record {
    ($name:ident { $( $field:ident $(as $rename:literal)? ),* $(,)? }) => {
        impl $crate::Record for $name {
            fn fields() -> ::std::vec::Vec<$crate::FieldDesc> {
                ::std::vec![$(
                    $crate::FieldDesc::new(
                        stringify!($field),
                        $crate::__rename!($($rename)?),
                        $crate::convert::type_desc_of(|r: &$name| &r.$field),
                    )
                ),*]
            }

            fn apply(
                &mut self,
                field: &str,
                value: $crate::Value,
            ) -> ::std::result::Result<(), $crate::ConversionError> {
                $(
                    if field == stringify!($field) {
                        return $crate::convert::overlay_value(&mut self.$field, value);
                    }
                )*
                let _ = value;
                ::std::result::Result::Ok(())
            }
        }
    };
}

/// Implement [`Schema`](crate::Schema) for the root configuration struct.
///
/// Each entry is `flat <field>` for a record-valued section or
/// `dynamic <field>` for a `HashMap<String, Box<R>>` section. Either may take
/// `as "name"` to override its environment name; dynamic sections may name a
/// sibling default record with `with <field>`.
///
/// ```ignore
/// envoverlay::schema!(AppConfig {
///     flat server,
///     dynamic remote with default_remote,
///     dynamic mirror as "mirrors",
/// });
/// ```
#[macro_export]
macro_rules! schema {
    ($name:ident {
        $( $kind:ident $field:ident $(as $rename:literal)? $(with $defaults:ident)? ),* $(,)?
    }) => {
        impl $crate::Schema for $name {
            fn layout() -> ::std::vec::Vec<$crate::SectionLayout> {
                ::std::vec![$(
                    $crate::SectionLayout {
                        name: stringify!($field),
                        rename: $crate::__rename!($($rename)?),
                        dynamic: $crate::__is_dynamic!($kind),
                        defaults: $crate::__rename!($(stringify!($defaults))?),
                    }
                ),*]
            }

            fn sections(&mut self) -> ::std::vec::Vec<$crate::Section<'_>> {
                ::std::vec![$(
                    $crate::__section!(
                        $kind,
                        self,
                        $field,
                        $crate::__rename!($($rename)?),
                        [$($defaults)?]
                    )
                ),*]
            }
        }
    };
}

/// Implement [`EnvValue`](crate::EnvValue) for types that implement
/// [`FromText`](crate::FromText).
#[macro_export]
macro_rules! impl_from_text {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::EnvValue for $ty {
            fn type_desc() -> $crate::TypeDesc {
                $crate::TypeDesc::Text($crate::TextType::of::<$ty>())
            }

            fn from_value(value: $crate::Value) -> ::std::option::Option<Self> {
                value.into_text::<$ty>()
            }
        }
    )+};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __rename {
    () => {
        ::std::option::Option::None
    };
    ($rename:expr) => {
        ::std::option::Option::Some($rename)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __is_dynamic {
    (flat) => {
        false
    };
    (dynamic) => {
        true
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __section {
    (flat, $this:tt, $field:ident, $rename:expr, []) => {
        $crate::Section::flat(stringify!($field), $rename, &mut $this.$field)
    };
    (dynamic, $this:tt, $field:ident, $rename:expr, []) => {
        $crate::Section::dynamic(stringify!($field), $rename, &mut $this.$field, ::std::option::Option::None)
    };
    (dynamic, $this:tt, $field:ident, $rename:expr, [$defaults:ident]) => {
        $crate::Section::dynamic(
            stringify!($field),
            $rename,
            &mut $this.$field,
            ::std::option::Option::Some(&$this.$defaults),
        )
    };
}
