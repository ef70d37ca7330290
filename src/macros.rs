//! Accessor generation macros
//!
//! All macros use `paste` internally for identifier concatenation.

// =============================================================================
// Enum accessor generation
// =============================================================================

/// Generate is_xxx, as_xxx, as_xxx_mut methods for a sum type whose variants
/// wrap a type of the same (camel-cased) name.
///
/// # Example
/// ```ignore
/// impl Node {
///     impl_enum_accessors!(element, text);
/// }
/// ```
#[macro_export]
macro_rules! impl_enum_accessors {
    ($($variant:ident),* $(,)?) => {
        ::paste::paste! {
            $(
                #[doc = "Check if this is a " [<$variant:camel>] " node"]
                pub fn [<is_ $variant>](&self) -> bool {
                    matches!(self, Self::[<$variant:camel>](_))
                }

                #[doc = "Try to get as " $variant " reference"]
                pub fn [<as_ $variant>](&self) -> Option<&[<$variant:camel>]> {
                    match self { Self::[<$variant:camel>](v) => Some(v), _ => None }
                }

                #[doc = "Try to get as mutable " $variant " reference"]
                pub fn [<as_ $variant _mut>](&mut self) -> Option<&mut [<$variant:camel>]> {
                    match self { Self::[<$variant:camel>](v) => Some(v), _ => None }
                }
            )*
        }
    };
}

/// Generate `with_xxx` builder setters for plain struct fields.
///
/// # Example
/// ```ignore
/// impl MindmapOptions {
///     impl_with_setters!(auto_fit: bool, max_width: u32);
/// }
/// ```
#[macro_export]
macro_rules! impl_with_setters {
    ($($field:ident: $ty:ty),* $(,)?) => {
        ::paste::paste! {
            $(
                #[doc = "Set `" $field "`."]
                pub fn [<with_ $field>](mut self, $field: $ty) -> Self {
                    self.$field = $field;
                    self
                }
            )*
        }
    };
}
