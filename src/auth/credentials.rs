// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ordered credential resolution.
//!
//! A [`CredentialChain`] is a list of resolvers, one per channel. They run in
//! order and the first one that yields a token wins; later channels are not
//! consulted. When every channel comes up empty the chain returns a
//! [`ChannelReport`] saying why each one failed.

use std::ops::ControlFlow;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::github::AccessToken;
use crate::session::{extract_cookie, TokenCipher, SESSION_COOKIE_NAME};

/// Where a credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialChannel {
    /// Encrypted `session_token` cookie.
    Cookie,
    /// `token` query parameter.
    Query,
    /// `Authorization: Bearer` header.
    Header,
}

impl CredentialChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialChannel::Cookie => "cookie",
            CredentialChannel::Query => "query",
            CredentialChannel::Header => "header",
        }
    }
}

/// Why a channel produced no credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Absent,
    Undecryptable,
    Empty,
    Malformed,
}

/// Result of a single resolver.
#[derive(Debug)]
pub enum ChannelOutcome {
    Found(AccessToken),
    Missing(ChannelStatus),
}

/// Everything a resolver may look at.
pub struct CredentialSources<'a> {
    pub headers: &'a HeaderMap,
    pub query_token: Option<&'a str>,
    pub cipher: &'a TokenCipher,
}

pub type Resolver = fn(&CredentialSources<'_>) -> ChannelOutcome;

/// Token plus the channel that supplied it.
#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    pub token: AccessToken,
    pub channel: CredentialChannel,
}

/// Per-channel diagnostics for a failed resolution. Only the channels that
/// were part of the chain are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChannelReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<ChannelStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<ChannelStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<ChannelStatus>,
}

impl ChannelReport {
    fn record(&mut self, channel: CredentialChannel, status: ChannelStatus) {
        let slot = match channel {
            CredentialChannel::Cookie => &mut self.cookie,
            CredentialChannel::Query => &mut self.query,
            CredentialChannel::Header => &mut self.header,
        };
        *slot = Some(status);
    }
}

/// Ordered list of credential resolvers.
#[derive(Clone)]
pub struct CredentialChain {
    resolvers: Vec<(CredentialChannel, Resolver)>,
}

impl CredentialChain {
    /// Cookie, then query parameter, then bearer header.
    pub fn standard() -> Self {
        Self {
            resolvers: vec![
                (CredentialChannel::Cookie, from_cookie as Resolver),
                (CredentialChannel::Query, from_query as Resolver),
                (CredentialChannel::Header, from_header as Resolver),
            ],
        }
    }

    /// Query parameter only (legacy resource route).
    pub fn query_only() -> Self {
        Self {
            resolvers: vec![(CredentialChannel::Query, from_query as Resolver)],
        }
    }

    /// Session cookie only.
    pub fn cookie_only() -> Self {
        Self {
            resolvers: vec![(CredentialChannel::Cookie, from_cookie as Resolver)],
        }
    }

    pub fn channels(&self) -> impl Iterator<Item = CredentialChannel> + '_ {
        self.resolvers.iter().map(|(channel, _)| *channel)
    }

    /// Run the resolvers in order, stopping at the first token.
    pub fn resolve(
        &self,
        sources: &CredentialSources<'_>,
    ) -> Result<ResolvedCredential, ChannelReport> {
        let outcome = self.resolvers.iter().try_fold(
            ChannelReport::default(),
            |mut report, (channel, resolver)| match resolver(sources) {
                ChannelOutcome::Found(token) => ControlFlow::Break(ResolvedCredential {
                    token,
                    channel: *channel,
                }),
                ChannelOutcome::Missing(status) => {
                    report.record(*channel, status);
                    ControlFlow::Continue(report)
                }
            },
        );

        match outcome {
            ControlFlow::Break(credential) => Ok(credential),
            ControlFlow::Continue(report) => Err(report),
        }
    }
}

fn from_cookie(sources: &CredentialSources<'_>) -> ChannelOutcome {
    let Some(packed) = extract_cookie(sources.headers, SESSION_COOKIE_NAME) else {
        return ChannelOutcome::Missing(ChannelStatus::Absent);
    };
    if packed.is_empty() {
        return ChannelOutcome::Missing(ChannelStatus::Absent);
    }
    match sources.cipher.decrypt(&packed) {
        Some(token) if !token.is_empty() => ChannelOutcome::Found(AccessToken::new(token)),
        _ => ChannelOutcome::Missing(ChannelStatus::Undecryptable),
    }
}

fn from_query(sources: &CredentialSources<'_>) -> ChannelOutcome {
    match sources.query_token.map(str::trim) {
        None => ChannelOutcome::Missing(ChannelStatus::Absent),
        Some("") => ChannelOutcome::Missing(ChannelStatus::Empty),
        Some(token) => ChannelOutcome::Found(AccessToken::new(token)),
    }
}

fn from_header(sources: &CredentialSources<'_>) -> ChannelOutcome {
    let Some(value) = sources.headers.get(AUTHORIZATION) else {
        return ChannelOutcome::Missing(ChannelStatus::Absent);
    };
    let bearer = value.to_str().ok().and_then(|value| {
        let (scheme, token) = value.trim().split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
    });
    match bearer {
        Some(token) => ChannelOutcome::Found(AccessToken::new(token)),
        None => ChannelOutcome::Missing(ChannelStatus::Malformed),
    }
}
