// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! Process-wide ZeroMQ context.
//!
//! All senders and receivers in a process create their sockets from the same
//! context. The context is created on first use and lives until the process
//! exits; sockets themselves are never shared between threads.

use std::sync::OnceLock;

/// Identity attached to every socket this library opens.
pub const LIB_IDENTITY: &str = "mint Minimal Interoperation Lib";

static CONTEXT: OnceLock<zmq::Context> = OnceLock::new();

/// Shared context used for socket creation.
pub fn global_context() -> &'static zmq::Context {
    CONTEXT.get_or_init(|| {
        log::debug!("[CONTEXT] creating process-wide zmq context");
        zmq::Context::new()
    })
}

/// Create a socket of `kind` tagged with `identity`.
pub(crate) fn socket(kind: zmq::SocketType, identity: &str) -> zmq::Result<zmq::Socket> {
    let socket = global_context().socket(kind)?;
    socket.set_identity(identity.as_bytes())?;
    Ok(socket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_context_is_shared() {
        let a = global_context() as *const zmq::Context;
        let b = global_context() as *const zmq::Context;
        assert_eq!(a, b);
    }

    #[test]
    fn test_socket_creation() {
        assert!(socket(zmq::PUB, LIB_IDENTITY).is_ok());
        assert!(socket(zmq::SUB, LIB_IDENTITY).is_ok());
    }
}
