//! Closed OCPI enumerations
//!
//! OCPI enumerations travel as plain strings. `ocpi_enum!` generates a closed
//! enum together with its wire form, an explicit `try_parse` that reports
//! unknown values as `None`, `Display`/`FromStr`, and string-based serde impls.

/// Declare a closed OCPI enumeration with its wire strings.
///
/// ```ignore
/// ocpi_enum! {
///     /// Connector format
///     pub enum ConnectorFormat {
///         Socket => "SOCKET",
///         Cable => "CABLE",
///     }
/// }
/// ```
#[macro_export]
macro_rules! ocpi_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }

            /// Parse a wire value; unknown values yield `None`
            pub fn try_parse(text: &str) -> Option<Self> {
                match text {
                    $( $wire => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::types::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::try_parse(s).ok_or_else(|| $crate::types::UnknownVariant {
                    kind: stringify!($name),
                    value: s.to_string(),
                })
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = <String as serde::Deserialize>::deserialize(deserializer)?;
                Self::try_parse(&text)
                    .ok_or_else(|| serde::de::Error::unknown_variant(&text, &[$($wire),+]))
            }
        }
    };
}
