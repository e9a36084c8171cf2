//! Asset bundle arithmetic
//!
//! A bundle maps asset classes to signed amounts. Intermediate results may
//! go negative; only bundles attached to outputs must be strictly positive.
//! Zero entries are never stored, so structural equality is equality on
//! the non-zero entries.

use crate::constants::BASE_UNIT;
use crate::error::InvariantViolation;
use crate::utxo::{AssetName, PolicyId};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;

/// Identifier of a fungible asset
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetClass {
    /// The ledger's base asset
    Base,
    /// A native token (issuer + name)
    Token { policy: PolicyId, name: AssetName },
}

impl AssetClass {
    pub fn token(policy: PolicyId, name: AssetName) -> Self {
        AssetClass::Token { policy, name }
    }

    pub fn is_base(&self) -> bool {
        matches!(self, AssetClass::Base)
    }

    /// Unit string: `lovelace` or the policy hex followed by the name hex
    pub fn unit(&self) -> String {
        match self {
            AssetClass::Base => BASE_UNIT.to_string(),
            AssetClass::Token { policy, name } => format!("{}{}", policy, name),
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unit())
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(unit: &str) -> Result<Self, Self::Err> {
        if unit == BASE_UNIT || unit.is_empty() {
            return Ok(AssetClass::Base);
        }

        let policy_len = PolicyId::LENGTH * 2;
        if unit.len() < policy_len || !unit.is_char_boundary(policy_len) {
            return Err(format!("invalid asset unit: {}", unit));
        }

        let (policy, name) = unit.split_at(policy_len);
        let policy = PolicyId::from_hex(policy).map_err(|e| format!("invalid policy: {}", e))?;
        let name = AssetName::from_hex(name).map_err(|e| format!("invalid asset name: {}", e))?;
        Ok(AssetClass::Token { policy, name })
    }
}

/// Bundle of asset amounts
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AssetBundle {
    amounts: BTreeMap<AssetClass, i128>,
}

impl AssetBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle holding only the base asset
    pub fn from_base(amount: i128) -> Self {
        let mut bundle = Self::new();
        bundle.insert(AssetClass::Base, amount);
        bundle
    }

    /// Builder-style helper adding `amount` of `asset`
    pub fn with(mut self, asset: AssetClass, amount: i128) -> Self {
        self.insert(asset, amount);
        self
    }

    /// Add `amount` of `asset`, dropping the entry if it reaches zero
    pub fn insert(&mut self, asset: AssetClass, amount: i128) {
        if amount == 0 {
            return;
        }
        let entry = self.amounts.entry(asset.clone()).or_insert(0);
        *entry += amount;
        if *entry == 0 {
            self.amounts.remove(&asset);
        }
    }

    pub fn amount_of(&self, asset: &AssetClass) -> i128 {
        self.amounts.get(asset).copied().unwrap_or(0)
    }

    pub fn base_amount(&self) -> i128 {
        self.amount_of(&AssetClass::Base)
    }

    /// Union of asset classes with amounts summed
    pub fn merge(&self, other: &AssetBundle) -> AssetBundle {
        let mut merged = self.clone();
        for (asset, amount) in &other.amounts {
            merged.insert(asset.clone(), *amount);
        }
        merged
    }

    /// Every amount negated
    pub fn negate(&self) -> AssetBundle {
        AssetBundle {
            amounts: self
                .amounts
                .iter()
                .map(|(asset, amount)| (asset.clone(), -amount))
                .collect(),
        }
    }

    /// True iff there is no non-zero entry
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// True iff no amount is negative
    pub fn is_non_negative(&self) -> bool {
        self.amounts.values().all(|amount| *amount > 0)
    }

    /// True iff the bundle can sit on a transaction output
    pub fn is_valid_output(&self) -> bool {
        !self.is_empty() && self.is_non_negative()
    }

    /// True iff the bundle carries anything besides the base asset
    pub fn has_tokens(&self) -> bool {
        self.amounts.keys().any(|asset| !asset.is_base())
    }

    /// `self - consumed`, failing if any amount would go negative
    pub fn remainder(&self, consumed: &AssetBundle) -> Result<AssetBundle, InvariantViolation> {
        let remainder = self.merge(&consumed.negate());
        if !remainder.is_non_negative() {
            return Err(InvariantViolation::NegativeRemainder {
                available: self.clone(),
                consumed: consumed.clone(),
            });
        }
        Ok(remainder)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetClass, &i128)> {
        self.amounts.iter()
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }
}

impl Add for AssetBundle {
    type Output = AssetBundle;

    fn add(self, rhs: AssetBundle) -> AssetBundle {
        self.merge(&rhs)
    }
}

impl<'a> Add<&'a AssetBundle> for &'a AssetBundle {
    type Output = AssetBundle;

    fn add(self, rhs: &'a AssetBundle) -> AssetBundle {
        self.merge(rhs)
    }
}

impl AddAssign<&AssetBundle> for AssetBundle {
    fn add_assign(&mut self, rhs: &AssetBundle) {
        for (asset, amount) in &rhs.amounts {
            self.insert(asset.clone(), *amount);
        }
    }
}

impl Sub for AssetBundle {
    type Output = AssetBundle;

    fn sub(self, rhs: AssetBundle) -> AssetBundle {
        self.merge(&rhs.negate())
    }
}

impl<'a> Sub<&'a AssetBundle> for &'a AssetBundle {
    type Output = AssetBundle;

    fn sub(self, rhs: &'a AssetBundle) -> AssetBundle {
        self.merge(&rhs.negate())
    }
}

impl Neg for AssetBundle {
    type Output = AssetBundle;

    fn neg(self) -> AssetBundle {
        self.negate()
    }
}

impl Sum for AssetBundle {
    fn sum<I: Iterator<Item = AssetBundle>>(iter: I) -> Self {
        iter.fold(AssetBundle::new(), |acc, bundle| acc + bundle)
    }
}

impl<'a> Sum<&'a AssetBundle> for AssetBundle {
    fn sum<I: Iterator<Item = &'a AssetBundle>>(iter: I) -> Self {
        let mut total = AssetBundle::new();
        for bundle in iter {
            total += bundle;
        }
        total
    }
}

impl fmt::Display for AssetBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("{}");
        }
        let entries: Vec<String> = self
            .amounts
            .iter()
            .map(|(asset, amount)| format!("{}: {}", asset, amount))
            .collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}

// Serialized as a map of unit string to amount
impl Serialize for AssetBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.amounts.len()))?;
        for (asset, amount) in &self.amounts {
            map.serialize_entry(&asset.unit(), amount)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AssetBundle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, i128>::deserialize(deserializer)?;
        let mut bundle = AssetBundle::new();
        for (unit, amount) in raw {
            let asset = unit.parse::<AssetClass>().map_err(de::Error::custom)?;
            bundle.insert(asset, amount);
        }
        Ok(bundle)
    }
}
