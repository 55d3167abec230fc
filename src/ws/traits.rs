//! Core traits for generic WebSocket infrastructure.

/// Message parser trait for converting raw bytes to messages.
///
/// # Example
///
/// ```ignore
/// pub struct SimpleParser;
///
/// impl MessageParser<MyMessage> for SimpleParser {
///     fn parse(&self, bytes: &[u8]) -> crate::Result<Vec<MyMessage>> {
///         let msg: MyMessage = serde_json::from_slice(bytes)?;
///         Ok(vec![msg])
///     }
/// }
/// ```
pub trait MessageParser<M>: Send + Sync + 'static {
    /// Parse incoming bytes into messages.
    ///
    /// May return an empty vec if the frame is well-formed but carries nothing
    /// the caller dispatches on.
    fn parse(&self, bytes: &[u8]) -> crate::Result<Vec<M>>;
}

/// Builds the keep-alive frame sent on every heartbeat tick.
///
/// The frame is rebuilt on each tick so it can carry a fresh timestamp.
pub trait Heartbeat: Send + Sync + 'static {
    /// Text of the next keep-alive frame.
    fn ping(&self) -> crate::Result<String>;
}
