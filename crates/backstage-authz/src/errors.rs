use thiserror::Error;

/// Denial raised by a [`crate::Policy`].
///
/// Deliberately opaque: callers learn that access was refused, never which
/// rule refused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("access denied")]
pub struct Unauthorized;

pub type AuthzResult<T> = Result<T, Unauthorized>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_display_is_opaque() {
        assert_eq!(Unauthorized.to_string(), "access denied");
        let result: AuthzResult<()> = Err(Unauthorized);
        assert_eq!(result, Err(Unauthorized));
    }
}
