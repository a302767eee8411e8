/// Declares a status enum backed by the upstream's uppercase codes.
///
/// Codes the upstream adds later are preserved in `Other` instead of failing
/// the whole record, and a missing or null value becomes `Other("")`.
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => [$($code:literal),+], $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            Other(String),
        }

        impl $name {
            /// Canonical upstream code
            pub fn code(&self) -> &str {
                match self {
                    $( $name::$variant => first_code!($($code),+), )+
                    $name::Other(code) => code,
                }
            }

            /// Human readable label used in exported documents
            pub fn label(&self) -> &str {
                match self {
                    $( $name::$variant => $label, )+
                    $name::Other(code) if code.is_empty() => "Sin estado",
                    $name::Other(code) => code,
                }
            }
        }

        impl From<&str> for $name {
            fn from(code: &str) -> Self {
                match code.trim().to_uppercase().as_str() {
                    $( $($code)|+ => $name::$variant, )+
                    _ => $name::Other(code.trim().to_string()),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::Other(String::new())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.label())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.code())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let code = crate::types::de::string_or_empty(deserializer)?;
                Ok($name::from(code.as_str()))
            }
        }
    };
}

macro_rules! first_code {
    ($first:literal $(, $rest:literal)*) => {
        $first
    };
}
