//! Provider registry.
//!
//! # Responsibilities
//! - Store providers in registration order
//! - Reject a second provider for the same (type, name) identity
//! - Index every provider under its own key and each capability it binds
//!
//! # Design Decisions
//! - Offers for one key keep registration order; collections rely on it
//! - Nothing is constructed here, so registration order among providers
//!   does not matter for correctness

use std::collections::HashMap;

use crate::container::error::Error;
use crate::container::key::Key;
use crate::container::provider::{identity_cast, CastFn, Provider};

/// Index of a provider in the registry.
pub(crate) type ProviderId = usize;

/// A provider able to supply the value for a key.
pub(crate) struct Offer {
    pub provider: ProviderId,
    pub cast: CastFn,
}

#[derive(Default)]
pub(crate) struct Registry {
    providers: Vec<Provider>,
    identities: HashMap<Key, ProviderId>,
    offers: HashMap<Key, Vec<Offer>>,
}

impl Registry {
    /// Record a provider and its capability bindings.
    pub fn register(&mut self, provider: Provider) -> Result<ProviderId, Error> {
        if self.identities.contains_key(&provider.key) {
            return Err(Error::DuplicateProvider {
                key: provider.key.to_string(),
            });
        }

        let id = self.providers.len();
        self.identities.insert(provider.key, id);
        self.offers.entry(provider.key).or_default().push(Offer {
            provider: id,
            cast: identity_cast(),
        });
        for binding in &provider.bindings {
            let offers = self.offers.entry(binding.capability).or_default();
            // One offer per provider and key; the first binding wins.
            if offers.iter().any(|offer| offer.provider == id) {
                tracing::debug!(
                    provider = %provider.key,
                    capability = %binding.capability,
                    "Repeated capability binding ignored"
                );
                continue;
            }
            offers.push(Offer {
                provider: id,
                cast: binding.cast.clone(),
            });
        }

        tracing::debug!(
            provider = %provider.key,
            constructor = %provider.label,
            dependencies = provider.dependencies.len(),
            capabilities = provider.bindings.len(),
            "Provider registered"
        );

        self.providers.push(provider);
        Ok(id)
    }

    /// Every offer for `key`, in registration order. Empty when none.
    pub fn lookup(&self, key: &Key) -> &[Offer] {
        self.offers.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The provider registered under exactly `key`, if any.
    pub fn identity(&self, key: &Key) -> Option<ProviderId> {
        self.identities.get(key).copied()
    }

    pub fn provider(&self, id: ProviderId) -> &Provider {
        &self.providers[id]
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }
}
