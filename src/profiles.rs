//! Analysis profiles and their selection against the trace's network type.
//!
//! A profile describes the radio characteristics analysis is computed against.
//! Profiles and traces are loaded independently, so the variant/network-type
//! constraint is enforced at assignment time by the session controller, using
//! [`validate`] and [`ProfileSelector::select_for_network_type`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ProfileError;
use crate::model::NetworkType;

/// Variant tag for a [`Profile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileType {
    ThreeG,
    Lte,
}

impl ProfileType {
    /// The profile variant that serves a detected network type. `Unknown`
    /// carries no constraint; it maps to the 3G slot for selection purposes.
    pub fn for_network(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::Lte => ProfileType::Lte,
            NetworkType::ThreeG | NetworkType::Unknown => ProfileType::ThreeG,
        }
    }
}

impl std::fmt::Display for ProfileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileType::ThreeG => write!(f, "3G"),
            ProfileType::Lte => write!(f, "LTE"),
        }
    }
}

/// 3G (UMTS/HSPA) radio characteristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile3g {
    pub name: String,
    /// Promotion delay from idle to DCH, seconds.
    pub dch_promotion_secs: f64,
    /// DCH inactivity tail, seconds.
    pub dch_tail_secs: f64,
    /// FACH inactivity tail, seconds.
    pub fach_tail_secs: f64,
    /// Radio power while on DCH, milliwatts.
    pub power_dch_mw: f64,
}

impl Default for Profile3g {
    fn default() -> Self {
        Self {
            name: "3G default".to_string(),
            dch_promotion_secs: 2.0,
            dch_tail_secs: 5.0,
            fach_tail_secs: 12.0,
            power_dch_mw: 800.0,
        }
    }
}

/// LTE radio characteristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileLte {
    pub name: String,
    /// Promotion delay from idle to connected, seconds.
    pub promotion_secs: f64,
    /// Short DRX cycle length, seconds.
    pub drx_short_secs: f64,
    /// Long DRX cycle length, seconds.
    pub drx_long_secs: f64,
    /// Connected-state inactivity tail, seconds.
    pub inactivity_tail_secs: f64,
    /// Radio power while connected, milliwatts.
    pub power_active_mw: f64,
}

impl Default for ProfileLte {
    fn default() -> Self {
        Self {
            name: "LTE default".to_string(),
            promotion_secs: 0.26,
            drx_short_secs: 0.02,
            drx_long_secs: 0.04,
            inactivity_tail_secs: 10.0,
            power_active_mw: 1200.0,
        }
    }
}

/// An analysis profile, tagged by its [`ProfileType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Profile {
    ThreeG(Profile3g),
    Lte(ProfileLte),
}

impl Profile {
    pub fn profile_type(&self) -> ProfileType {
        match self {
            Profile::ThreeG(_) => ProfileType::ThreeG,
            Profile::Lte(_) => ProfileType::Lte,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Profile::ThreeG(p) => &p.name,
            Profile::Lte(p) => &p.name,
        }
    }

    /// Built-in default for a profile variant, used when no profile was ever
    /// persisted or the store is unreadable.
    pub fn default_for(profile_type: ProfileType) -> Self {
        match profile_type {
            ProfileType::ThreeG => Profile::ThreeG(Profile3g::default()),
            ProfileType::Lte => Profile::Lte(ProfileLte::default()),
        }
    }
}

/// True iff the profile variant serves the detected network type. An `Unknown`
/// classification carries no constraint.
pub fn validate(profile: &Profile, network_type: NetworkType) -> bool {
    match network_type {
        NetworkType::Unknown => true,
        other => profile.profile_type() == ProfileType::for_network(other),
    }
}

/// Persisted "last used profile per type" storage, injected so tests can
/// substitute an in-memory fake. Also remembers the default trace directory.
pub trait ProfileStore: Send + Sync {
    fn last_used(&self, profile_type: ProfileType) -> Result<Option<Profile>, ProfileError>;
    /// Overwrites the stored value for the profile's own type only. Idempotent.
    fn set_last_used(&self, profile: &Profile) -> Result<(), ProfileError>;
    fn last_trace_directory(&self) -> Option<PathBuf>;
    fn set_last_trace_directory(&self, dir: &Path) -> Result<(), ProfileError>;
}

impl<S: ProfileStore + ?Sized> ProfileStore for std::sync::Arc<S> {
    fn last_used(&self, profile_type: ProfileType) -> Result<Option<Profile>, ProfileError> {
        (**self).last_used(profile_type)
    }

    fn set_last_used(&self, profile: &Profile) -> Result<(), ProfileError> {
        (**self).set_last_used(profile)
    }

    fn last_trace_directory(&self) -> Option<PathBuf> {
        (**self).last_trace_directory()
    }

    fn set_last_trace_directory(&self, dir: &Path) -> Result<(), ProfileError> {
        (**self).set_last_trace_directory(dir)
    }
}

/// Outcome of a profile selection. `fallback` is present when the store had no
/// usable entry and the built-in default was substituted; the caller logs it.
pub struct ProfileSelection {
    pub profile: Profile,
    pub fallback: Option<ProfileError>,
}

/// Chooses the profile for a network type from the persisted store, falling
/// back to the built-in default. Lookup failures never abort a trace open.
pub struct ProfileSelector<S> {
    store: S,
}

impl<S: ProfileStore> ProfileSelector<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn select_for_network_type(&self, network_type: NetworkType) -> ProfileSelection {
        let profile_type = ProfileType::for_network(network_type);
        match self.store.last_used(profile_type) {
            Ok(Some(profile)) => ProfileSelection {
                profile,
                fallback: None,
            },
            Ok(None) => ProfileSelection {
                profile: Profile::default_for(profile_type),
                fallback: Some(ProfileError::FallbackUsed(profile_type)),
            },
            Err(e) => {
                log::debug!("profile store read failed: {e}");
                ProfileSelection {
                    profile: Profile::default_for(profile_type),
                    fallback: Some(ProfileError::FallbackUsed(profile_type)),
                }
            }
        }
    }

    pub fn persist_last_used(&self, profile: &Profile) -> Result<(), ProfileError> {
        self.store.set_last_used(profile)
    }
}
