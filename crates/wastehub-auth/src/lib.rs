//! # wastehub-auth
//!
//! Verification of session tokens issued by the identity service.
//! Both the WebSocket handshake and REST bearer authentication go through
//! a [`SessionVerifier`]; the default implementation checks HS256 JWTs.

pub mod jwt;
pub mod verifier;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use verifier::{JwtSessionVerifier, SessionVerifier, VerifiedSession};
