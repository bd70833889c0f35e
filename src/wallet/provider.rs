// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet capability detection.
//!
//! A [`WalletRegistry`] holds one detector per supported wallet, in a fixed
//! order. Listing the wallets re-runs every detector, so `is_installed` always
//! reflects the environment at call time.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::extension::{ExtensionSlot, WalletExtension};

/// Supported wallet providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WalletProvider {
    HashPack,
    Blade,
}

impl WalletProvider {
    /// Registry order.
    pub const ALL: [WalletProvider; 2] = [WalletProvider::HashPack, WalletProvider::Blade];

    /// Provider key used in requests (`"hashpack"` / `"blade"`).
    pub fn key(&self) -> &'static str {
        match self {
            WalletProvider::HashPack => "hashpack",
            WalletProvider::Blade => "blade",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WalletProvider::HashPack => "HashPack",
            WalletProvider::Blade => "Blade",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            WalletProvider::HashPack => "🔷",
            WalletProvider::Blade => "⚔️",
        }
    }

    /// Match a display name or provider key, ignoring case.
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        name.eq_ignore_ascii_case(self.display_name()) || name.eq_ignore_ascii_case(self.key())
    }
}

impl fmt::Display for WalletProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for WalletProvider {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        WalletProvider::ALL
            .into_iter()
            .find(|provider| provider.matches(raw))
            .ok_or_else(|| format!("Unsupported wallet provider `{raw}`"))
    }
}

/// Descriptor of one wallet as seen right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WalletDescriptor {
    pub name: String,
    pub icon: String,
    pub is_installed: bool,
    pub provider: WalletProvider,
}

/// A named capability detector for one wallet provider.
pub trait WalletDetector: Send + Sync {
    fn provider(&self) -> WalletProvider;

    /// The extension handle, if the wallet is present.
    fn extension(&self) -> Option<Arc<dyn WalletExtension>>;

    fn is_installed(&self) -> bool {
        self.extension().is_some()
    }

    fn describe(&self) -> WalletDescriptor {
        let provider = self.provider();
        WalletDescriptor {
            name: provider.display_name().to_string(),
            icon: provider.icon().to_string(),
            is_installed: self.is_installed(),
            provider,
        }
    }
}

/// Detector that checks an injection slot.
#[derive(Debug, Clone)]
pub struct InjectedDetector {
    provider: WalletProvider,
    slot: ExtensionSlot,
}

impl InjectedDetector {
    pub fn new(provider: WalletProvider, slot: ExtensionSlot) -> Self {
        Self { provider, slot }
    }
}

impl WalletDetector for InjectedDetector {
    fn provider(&self) -> WalletProvider {
        self.provider
    }

    fn extension(&self) -> Option<Arc<dyn WalletExtension>> {
        self.slot.get()
    }

    fn is_installed(&self) -> bool {
        self.slot.is_present()
    }
}

/// Ordered set of wallet detectors.
#[derive(Default)]
pub struct WalletRegistry {
    detectors: Vec<Box<dyn WalletDetector>>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the two supported wallets probing the given slots.
    pub fn with_slots(hashpack: ExtensionSlot, blade: ExtensionSlot) -> Self {
        let mut registry = Self::new();
        registry.register(InjectedDetector::new(WalletProvider::HashPack, hashpack));
        registry.register(InjectedDetector::new(WalletProvider::Blade, blade));
        registry
    }

    /// Append a detector. A later detector for the same provider replaces the earlier one.
    pub fn register(&mut self, detector: impl WalletDetector + 'static) {
        let provider = detector.provider();
        match self.detectors.iter().position(|p| p.provider() == provider) {
            Some(index) => self.detectors[index] = Box::new(detector),
            None => self.detectors.push(Box::new(detector)),
        }
    }

    /// Descriptors for every registered wallet, checked now.
    pub fn list_wallets(&self) -> Vec<WalletDescriptor> {
        self.detectors.iter().map(|detector| detector.describe()).collect()
    }

    /// Look up a detector by display name or provider key.
    pub fn find(&self, name: &str) -> Option<&dyn WalletDetector> {
        self.detectors
            .iter()
            .find(|detector| detector.provider().matches(name))
            .map(|detector| detector.as_ref())
    }

    /// Detector for `name`, only if the wallet is installed.
    pub fn find_installed(&self, name: &str) -> Option<&dyn WalletDetector> {
        self.find(name).filter(|detector| detector.is_installed())
    }
}

impl fmt::Debug for WalletRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.list_wallets()).finish()
    }
}
