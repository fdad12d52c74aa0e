use std::fmt;

const MASK: &str = "****";

/// Holds a credential such as the Paystack secret key or the JWT signing key.
///
/// Formatting a `Secret` with `{}` or `{:?}` always prints `****`, so configuration structs that contain one can be
/// logged as a whole. Code that needs the credential itself calls [`Secret::reveal`].
#[derive(Clone, Default)]
pub struct Secret<T = String> {
    value: T,
}

impl<T> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl Secret<String> {
    /// True if no credential was configured.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
