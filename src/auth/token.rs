// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Compact JWS token splitting and segment decoding.
//!
//! Nothing decoded here is trusted until the signature over
//! [`RawToken::signing_input`] has been verified.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::VerificationError;

/// A token split into its three base64url segments.
#[derive(Debug, Clone, Copy)]
pub struct RawToken<'a> {
    signing_input: &'a str,
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
}

/// Decoded JOSE header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub kid: String,
    #[serde(default)]
    pub typ: Option<String>,
}

impl<'a> RawToken<'a> {
    /// Split `token` into exactly three non-empty segments.
    pub fn parse(token: &'a str) -> Result<Self, VerificationError> {
        let (signing_input, signature) = token
            .rsplit_once('.')
            .ok_or(VerificationError::MalformedToken)?;
        let (header, payload) = signing_input
            .split_once('.')
            .ok_or(VerificationError::MalformedToken)?;

        if header.is_empty() || payload.is_empty() || signature.is_empty() || payload.contains('.')
        {
            return Err(VerificationError::MalformedToken);
        }

        Ok(Self {
            signing_input,
            header,
            payload,
            signature,
        })
    }

    /// The exact `header.payload` bytes the signature covers.
    pub fn signing_input(&self) -> &'a [u8] {
        self.signing_input.as_bytes()
    }

    pub fn header(&self) -> Result<TokenHeader, VerificationError> {
        decode_segment(self.header)
    }

    /// Decode the payload. Only call after the signature has been checked.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, VerificationError> {
        decode_segment(self.payload)
    }

    /// Raw signature bytes. Undecodable signatures count as invalid ones.
    pub fn signature(&self) -> Result<Vec<u8>, VerificationError> {
        Base64UrlUnpadded::decode_vec(self.signature)
            .map_err(|_| VerificationError::InvalidSignature)
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, VerificationError> {
    let bytes =
        Base64UrlUnpadded::decode_vec(segment).map_err(|_| VerificationError::MalformedToken)?;
    serde_json::from_slice(&bytes).map_err(|_| VerificationError::MalformedToken)
}
