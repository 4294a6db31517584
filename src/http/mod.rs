//! HTTP transport: client construction and the invoker seam.
mod client;
mod invoker;

#[cfg(test)]
mod tests;

pub use client::{HttpSettings, build_client};
pub use invoker::{InvokeError, Invoker, ReqwestInvoker};
