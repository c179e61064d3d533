// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request authorization: client attestation and allowlisting

pub mod attestation;
pub mod gate;

pub use attestation::{
    AppCheckVerifier, AttestationError, AttestationVerifier, DisabledVerifier, APP_CHECK_HEADER,
};
pub use gate::{AccessConfig, AccessDecision, AccessError, AccessGate};
