// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - remote protocol and reconciliation.

pub mod mapping;
pub mod remote_auth;
pub mod sync;
pub mod token_codec;
pub mod transport;

pub use mapping::{
    DelegatedSerializer, DirectUpsert, MappingContext, MappingStrategy, ProfileSerializer,
    StrategyRegistry, UserSerializer,
};
pub use remote_auth::RemoteAuthClient;
pub use sync::{SyncOutcome, UserSynchronizer};
pub use token_codec::DecodedClaims;
pub use transport::Transport;
