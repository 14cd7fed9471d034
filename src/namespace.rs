//! Mapping between logical `(user, key)` pairs and object names
//!
//! Object names follow `KEY_PREFIX + (encoded user + "/")? + key`. The user
//! segment is percent-encoded; the key is used verbatim, so a key containing
//! `/` produces extra path components under the namespace.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left untouched when encoding a user, matching
/// `encodeURIComponent`.
const USER_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Object name prefix owned by one user, or the shared default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    prefix: String,
}

impl Namespace {
    /// Build the namespace for `user` under the configured key prefix.
    ///
    /// A missing or empty user maps to the key prefix alone.
    pub fn new(key_prefix: &str, user: Option<&str>) -> Self {
        let prefix = match user {
            Some(user) if !user.is_empty() => {
                format!("{}{}/", key_prefix, utf8_percent_encode(user, USER_SEGMENT))
            }
            _ => key_prefix.to_string(),
        };
        Self { prefix }
    }

    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// Full object name for `key`. Also used to scope listings.
    pub fn object_name(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Key shown to clients for `name`, or `None` when the name lies
    /// outside this namespace or is the bare prefix.
    pub fn strip<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(self.prefix.as_str())
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespace() {
        assert_eq!(Namespace::new("", None).object_name("a"), "a");
        assert_eq!(Namespace::new("kv/", None).object_name("a"), "kv/a");
        assert_eq!(Namespace::new("kv/", Some("")).object_name("a"), "kv/a");
    }

    #[test]
    fn test_user_namespace() {
        let ns = Namespace::new("kv/", Some("alice"));
        assert_eq!(ns.as_str(), "kv/alice/");
        assert_eq!(ns.object_name("notes/today"), "kv/alice/notes/today");
    }

    #[test]
    fn test_user_is_encoded_like_uri_component() {
        let ns = Namespace::new("", Some("a b/c@d.com"));
        assert_eq!(ns.as_str(), "a%20b%2Fc%40d.com/");

        let ns = Namespace::new("", Some("it's-(ok)_~*!"));
        assert_eq!(ns.as_str(), "it's-(ok)_~*!/");

        let ns = Namespace::new("", Some("zoë"));
        assert_eq!(ns.as_str(), "zo%C3%AB/");
    }

    #[test]
    fn test_key_is_not_encoded() {
        let ns = Namespace::new("", Some("bob"));
        assert_eq!(ns.object_name("a b%20"), "bob/a b%20");
    }

    #[test]
    fn test_distinct_users_distinct_names() {
        let alice = Namespace::new("", Some("alice"));
        let bob = Namespace::new("", Some("bob"));
        assert_ne!(alice.object_name("x"), bob.object_name("x"));
    }

    #[test]
    fn test_strip() {
        let ns = Namespace::new("kv/", Some("alice"));
        assert_eq!(ns.strip("kv/alice/x"), Some("x"));
        assert_eq!(ns.strip("kv/alice/dir/y"), Some("dir/y"));
        assert_eq!(ns.strip("kv/alice/"), None);
        assert_eq!(ns.strip("kv/bob/x"), None);
    }
}
