//! Environment variable expansion for definition values

use std::borrow::Cow;

/// Expand `$VAR` and `${VAR}` against the process environment.
/// Unset variables are left as written.
pub fn expand_vars(value: &str) -> Cow<'_, str> {
    shellexpand::env_with_context_no_errors(value, |name| std::env::var(name).ok())
}
