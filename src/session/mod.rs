// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client-held GitHub sessions.
//!
//! The GitHub access token never lives on the server. It is encrypted with
//! AES-256-CBC and handed to the browser as the `session_token` cookie.
//!
//! - `cipher` - `ivHex:cipherHex` token cipher
//! - `cookie` - `Set-Cookie` construction and `Cookie` parsing

pub mod cipher;
pub mod cookie;

pub use cipher::{SessionKey, TokenCipher};
pub use cookie::{extract_cookie, SessionCookie, SESSION_COOKIE_NAME, SESSION_MAX_AGE_SECS};
