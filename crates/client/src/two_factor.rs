//! Pluggable two-factor code supply for sensitive mutations.
//!
//! The client never verifies codes itself.  Before each mutation it asks
//! the injected [`TwoFactorProvider`] for a code and forwards whatever it
//! gets to the server in the [`TWO_FACTOR_HEADER`] header.

use async_trait::async_trait;

/// Request header carrying the 2FA code.
pub const TWO_FACTOR_HEADER: &str = "X-2FA-Code";

#[async_trait]
pub trait TwoFactorProvider: Send + Sync {
    /// Code to attach to the next sensitive request, if any.
    async fn code(&self) -> Option<String>;
}

/// Never supplies a code.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTwoFactor;

#[async_trait]
impl TwoFactorProvider for NoTwoFactor {
    async fn code(&self) -> Option<String> {
        None
    }
}

/// Supplies the same code every time (e.g. from configuration).
#[derive(Debug, Clone)]
pub struct StaticCode(String);

impl StaticCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

#[async_trait]
impl TwoFactorProvider for StaticCode {
    async fn code(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Wraps a getter callback.
pub struct FnProvider<F>(F);

/// Build a provider from a callback, e.g. one that reads an input field.
pub fn from_fn<F>(getter: F) -> FnProvider<F>
where
    F: Fn() -> Option<String> + Send + Sync,
{
    FnProvider(getter)
}

#[async_trait]
impl<F> TwoFactorProvider for FnProvider<F>
where
    F: Fn() -> Option<String> + Send + Sync,
{
    async fn code(&self) -> Option<String> {
        (self.0)().map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
    }
}
