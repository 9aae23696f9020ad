//! Boundary trait for the model-invocation collaborator.

use async_trait::async_trait;

use crate::error::TransportError;

/// A generative text service the engine can invoke.
///
/// The engine treats the returned text as untrusted and opaque: it never
/// inspects tokens, usage, or metadata beyond the single content string.
/// The handle is constructed once by the caller and passed into each
/// extraction call; the engine holds no ambient client state.
///
/// Cancellation and timeouts belong to the implementation. The engine's only
/// budget is its attempt count, and a failed invocation consumes one attempt.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends one system/user prompt pair to the model and returns its raw
    /// text response.
    async fn invoke(
        &self,
        model: &str,
        temperature: f32,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, TransportError>;
}
