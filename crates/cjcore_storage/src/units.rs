//! Energy units and conversion between them.
//!
//! Every [`Unit`] declares its worth in terms of a single canonical unit as an
//! exact [`Ratio`]. Conversions go `from -> canonical -> to` in one widened
//! integer expression and truncate toward zero, so fractional canonical
//! energy is never produced.
//!
//! A [`UnitTable`] is assembled once at startup through a [`UnitTableBuilder`]
//! and is immutable afterwards; share it behind an `Arc`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::UnitError;

/// The id of the canonical unit in [`UnitTable::standard`].
pub const FORGE_ENERGY: &str = "Forge Energy";

/// An exact, strictly positive conversion ratio to the canonical unit.
///
/// `numer / denom` canonical units make up one unit of this kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ratio {
    numer: u32,
    denom: u32,
}

impl Ratio {
    /// The identity ratio carried by the canonical unit.
    pub const ONE: Ratio = Ratio { numer: 1, denom: 1 };

    /// Create a ratio, reduced to lowest terms.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::InvalidRatio`] if either component is zero.
    pub fn new(numer: u32, denom: u32) -> Result<Self, UnitError> {
        if numer == 0 || denom == 0 {
            return Err(UnitError::InvalidRatio { numer, denom });
        }
        let g = gcd(numer, denom);
        Ok(Self {
            numer: numer / g,
            denom: denom / g,
        })
    }

    /// A whole-number ratio (`n` canonical units per unit).
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::InvalidRatio`] if `n` is zero.
    pub fn whole(n: u32) -> Result<Self, UnitError> {
        Self::new(n, 1)
    }

    /// Numerator in lowest terms.
    #[must_use]
    pub const fn numer(self) -> u32 {
        self.numer
    }

    /// Denominator in lowest terms.
    #[must_use]
    pub const fn denom(self) -> u32 {
        self.denom
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom == 1 {
            write!(f, "{}", self.numer)
        } else {
            write!(f, "{}/{}", self.numer, self.denom)
        }
    }
}

const fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// An RGB display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Build a color from a packed `0xRRGGBB` value.
    #[must_use]
    pub const fn from_hex(hex: u32) -> Self {
        Self((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Pack the color back into `0xRRGGBB`.
    #[must_use]
    pub const fn to_hex(self) -> u32 {
        ((self.0 as u32) << 16) | ((self.1 as u32) << 8) | self.2 as u32
    }
}

/// A named measurement unit for energy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    id: String,
    ratio: Ratio,
    suffix: String,
    color: Rgb,
}

impl Unit {
    /// Create a unit description.
    #[must_use]
    pub fn new(id: impl Into<String>, ratio: Ratio, suffix: impl Into<String>, color: Rgb) -> Self {
        Self {
            id: id.into(),
            ratio,
            suffix: suffix.into(),
            color,
        }
    }

    /// The unique unit id, also used on the wire.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Conversion ratio to the canonical unit.
    #[must_use]
    pub fn ratio(&self) -> Ratio {
        self.ratio
    }

    /// Short display suffix (e.g. `"FE"`).
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Display color used by overlays.
    #[must_use]
    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Render an amount with this unit's suffix, e.g. `"4000 FE"`.
    #[must_use]
    pub fn format(&self, amount: i64) -> String {
        format!("{amount} {}", self.suffix)
    }

    /// Convert `amount` of this unit into `to`, truncating toward zero.
    ///
    /// The intermediate product is computed in `i128` (ratio components are
    /// `u32`, so it cannot overflow) and the result saturates at the `i64`
    /// bounds.
    #[must_use]
    pub fn convert_to(&self, amount: i64, to: &Unit) -> i64 {
        if self.id == to.id {
            return amount;
        }
        let numer = i128::from(self.ratio.numer) * i128::from(to.ratio.denom);
        let denom = i128::from(self.ratio.denom) * i128::from(to.ratio.numer);
        let scaled = i128::from(amount) * numer / denom;
        scaled.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }
}

/// Collects units before freezing them into a [`UnitTable`].
#[derive(Debug)]
pub struct UnitTableBuilder {
    units: Vec<Unit>,
    index: HashMap<String, usize>,
}

impl UnitTableBuilder {
    /// Register another unit.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::DuplicateUnit`] if the id is already taken.
    pub fn register(&mut self, unit: Unit) -> Result<&mut Self, UnitError> {
        if self.index.contains_key(unit.id()) {
            return Err(UnitError::DuplicateUnit(unit.id().to_string()));
        }
        self.index.insert(unit.id().to_string(), self.units.len());
        self.units.push(unit);
        Ok(self)
    }

    /// Freeze the registered units into an immutable table.
    #[must_use]
    pub fn build(self) -> UnitTable {
        UnitTable {
            units: self.units,
            index: self.index,
        }
    }
}

/// Immutable registry of energy units. Index 0 is always the canonical unit.
#[derive(Debug, Clone)]
pub struct UnitTable {
    units: Vec<Unit>,
    index: HashMap<String, usize>,
}

impl UnitTable {
    /// Start a table whose canonical unit is `canonical`.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::CanonicalRatio`] unless the unit's ratio is exactly one.
    pub fn builder(canonical: Unit) -> Result<UnitTableBuilder, UnitError> {
        if canonical.ratio() != Ratio::ONE {
            return Err(UnitError::CanonicalRatio(canonical.id().to_string()));
        }
        let mut index = HashMap::new();
        index.insert(canonical.id().to_string(), 0);
        Ok(UnitTableBuilder {
            units: vec![canonical],
            index,
        })
    }

    /// The units commonly exposed by machines, with Forge Energy as canonical.
    #[must_use]
    pub fn standard() -> Self {
        let ratio = |numer, denom| Ratio { numer, denom };
        let units = vec![
            Unit::new(FORGE_ENERGY, Ratio::ONE, "FE", Rgb::from_hex(0xD4_2A_2A)),
            Unit::new("Redstone Flux", ratio(1, 1), "RF", Rgb::from_hex(0xB3_1E_1E)),
            Unit::new("Tesla", ratio(1, 1), "T", Rgb::from_hex(0x4A_9B_E0)),
            Unit::new("Energy Unit", ratio(4, 1), "EU", Rgb::from_hex(0xE8_C5_2A)),
            Unit::new("Minecraft Joule", ratio(10, 1), "MJ", Rgb::from_hex(0x2E_B8_4C)),
            Unit::new("Joule", ratio(2, 5), "J", Rgb::from_hex(0x6B_D6_E8)),
        ];
        let index = units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.id().to_string(), i))
            .collect();
        Self { units, index }
    }

    /// The canonical unit (ratio 1).
    #[must_use]
    pub fn canonical(&self) -> &Unit {
        &self.units[0]
    }

    /// Look up a unit by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Unit> {
        self.index.get(id).map(|&i| &self.units[i])
    }

    /// Look up a unit by id.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::NotFound`] if no such unit exists.
    pub fn lookup(&self, id: &str) -> Result<&Unit, UnitError> {
        self.get(id).ok_or_else(|| UnitError::NotFound(id.to_string()))
    }

    /// Convert `amount` between two registered units by id.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::NotFound`] if either unit is unknown.
    pub fn convert(&self, amount: i64, from: &str, to: &str) -> Result<i64, UnitError> {
        let from = self.lookup(from)?;
        let to = self.lookup(to)?;
        Ok(from.convert_to(amount, to))
    }

    /// Iterate the units in registration order, canonical first.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    /// Number of registered units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Always `false`: a table holds at least its canonical unit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_ratio_reduced() {
        let r = Ratio::new(4, 10).unwrap();
        assert_eq!((r.numer(), r.denom()), (2, 5));
        assert_eq!(r.to_string(), "2/5");
        assert_eq!(Ratio::whole(4).unwrap().to_string(), "4");
    }

    #[test]
    fn test_zero_ratio_rejected() {
        assert_eq!(
            Ratio::new(0, 3),
            Err(UnitError::InvalidRatio { numer: 0, denom: 3 })
        );
        assert!(Ratio::new(3, 0).is_err());
    }

    #[test]
    fn test_standard_table() {
        let table = UnitTable::standard();
        assert_eq!(table.canonical().id(), FORGE_ENERGY);
        assert_eq!(table.canonical().ratio(), Ratio::ONE);
        assert_eq!(table.len(), 6);
        assert_eq!(table.lookup("Energy Unit").unwrap().suffix(), "EU");
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let canonical = Unit::new("FE", Ratio::ONE, "FE", Rgb(255, 0, 0));
        let mut builder = UnitTable::builder(canonical).unwrap();
        builder
            .register(Unit::new("EU", Ratio::whole(4).unwrap(), "EU", Rgb(0, 0, 0)))
            .unwrap();
        let err = builder
            .register(Unit::new("EU", Ratio::ONE, "EU", Rgb(0, 0, 0)))
            .unwrap_err();
        assert_eq!(err, UnitError::DuplicateUnit("EU".to_string()));

        let err = builder
            .register(Unit::new("FE", Ratio::ONE, "FE", Rgb(0, 0, 0)))
            .unwrap_err();
        assert_eq!(err, UnitError::DuplicateUnit("FE".to_string()));
        assert_eq!(builder.build().len(), 2);
    }

    #[test]
    fn test_canonical_must_be_one() {
        let unit = Unit::new("EU", Ratio::whole(4).unwrap(), "EU", Rgb(0, 0, 0));
        assert_eq!(
            UnitTable::builder(unit).unwrap_err(),
            UnitError::CanonicalRatio("EU".to_string())
        );
    }

    #[test]
    fn test_lookup_not_found() {
        let table = UnitTable::standard();
        assert_eq!(
            table.lookup("Watts").unwrap_err(),
            UnitError::NotFound("Watts".to_string())
        );
        assert!(table.convert(1, "Watts", FORGE_ENERGY).is_err());
    }

    #[test]
    fn test_convert_known_ratios() {
        let table = UnitTable::standard();
        assert_eq!(table.convert(4000, FORGE_ENERGY, "Energy Unit").unwrap(), 1000);
        assert_eq!(table.convert(1000, "Energy Unit", FORGE_ENERGY).unwrap(), 4000);
        assert_eq!(table.convert(10, "Joule", FORGE_ENERGY).unwrap(), 4);
        assert_eq!(table.convert(4, FORGE_ENERGY, "Joule").unwrap(), 10);
        assert_eq!(table.convert(3, "Minecraft Joule", "Energy Unit").unwrap(), 7);
    }

    #[test]
    fn test_convert_truncates_toward_zero() {
        let table = UnitTable::standard();
        assert_eq!(table.convert(4001, FORGE_ENERGY, "Energy Unit").unwrap(), 1000);
        assert_eq!(table.convert(-5, FORGE_ENERGY, "Energy Unit").unwrap(), -1);
        assert_eq!(table.convert(-7, "Joule", FORGE_ENERGY).unwrap(), -2);
    }

    #[test]
    fn test_convert_saturates() {
        let table = UnitTable::standard();
        assert_eq!(
            table.convert(i64::MAX, "Minecraft Joule", FORGE_ENERGY).unwrap(),
            i64::MAX
        );
        assert_eq!(
            table.convert(i64::MIN, "Minecraft Joule", FORGE_ENERGY).unwrap(),
            i64::MIN
        );
    }

    #[test]
    fn test_format_and_color() {
        let table = UnitTable::standard();
        let eu = table.lookup("Energy Unit").unwrap();
        assert_eq!(eu.format(250), "250 EU");
        assert_eq!(eu.color().to_hex(), 0xE8_C5_2A);
    }

    fn unit_id() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec![
            FORGE_ENERGY,
            "Redstone Flux",
            "Tesla",
            "Energy Unit",
            "Minecraft Joule",
            "Joule",
        ])
    }

    proptest! {
        #[test]
        fn prop_identity_conversion(amount in any::<i64>(), id in unit_id()) {
            let table = UnitTable::standard();
            prop_assert_eq!(table.convert(amount, id, id).unwrap(), amount);
        }

        #[test]
        fn prop_round_trip_never_gains(amount in 0i64..1_000_000_000_000, from in unit_id(), to in unit_id()) {
            let table = UnitTable::standard();
            let there = table.convert(amount, from, to).unwrap();
            let back = table.convert(there, to, from).unwrap();
            prop_assert!(back <= amount);

            // The loss is bounded by one `to` unit expressed in `from`, plus one
            // for the second truncation.
            let from_unit = table.lookup(from).unwrap();
            let to_unit = table.lookup(to).unwrap();
            let one_to_in_from = to_unit.convert_to(1, from_unit).max(1);
            prop_assert!(amount - back <= one_to_in_from + 1);
        }

        #[test]
        fn prop_truncation_is_toward_zero(amount in -1_000_000i64..1_000_000, from in unit_id(), to in unit_id()) {
            let table = UnitTable::standard();
            let pos = table.convert(amount.abs(), from, to).unwrap();
            let neg = table.convert(-amount.abs(), from, to).unwrap();
            prop_assert_eq!(neg, -pos);
        }
    }
}
