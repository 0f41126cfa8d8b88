use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A chemical element supported by the editing and optimization pipeline.
///
/// The set covers the elements that occur in drug-like small molecules plus
/// the common counter-ions; anything else in an input file is rejected at
/// parse time rather than carried around half-supported.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Element {
    H,
    B,
    C,
    N,
    O,
    F,
    Na,
    Mg,
    Si,
    P,
    S,
    Cl,
    K,
    Ca,
    Fe,
    Zn,
    Se,
    Br,
    I,
}

static SYMBOL_TABLE: phf::Map<&'static str, Element> = phf_map! {
    "H" => Element::H,
    "B" => Element::B,
    "C" => Element::C,
    "N" => Element::N,
    "O" => Element::O,
    "F" => Element::F,
    "Na" => Element::Na,
    "Mg" => Element::Mg,
    "Si" => Element::Si,
    "P" => Element::P,
    "S" => Element::S,
    "Cl" => Element::Cl,
    "K" => Element::K,
    "Ca" => Element::Ca,
    "Fe" => Element::Fe,
    "Zn" => Element::Zn,
    "Se" => Element::Se,
    "Br" => Element::Br,
    "I" => Element::I,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown element symbol '{0}'")]
pub struct UnknownElementError(pub String);

impl Element {
    /// The atomic number (Z) of the element.
    pub fn atomic_number(&self) -> u8 {
        match self {
            Element::H => 1,
            Element::B => 5,
            Element::C => 6,
            Element::N => 7,
            Element::O => 8,
            Element::F => 9,
            Element::Na => 11,
            Element::Mg => 12,
            Element::Si => 14,
            Element::P => 15,
            Element::S => 16,
            Element::Cl => 17,
            Element::K => 19,
            Element::Ca => 20,
            Element::Fe => 26,
            Element::Zn => 30,
            Element::Se => 34,
            Element::Br => 35,
            Element::I => 53,
        }
    }

    /// The standard one- or two-letter symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::B => "B",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::Na => "Na",
            Element::Mg => "Mg",
            Element::Si => "Si",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::K => "K",
            Element::Ca => "Ca",
            Element::Fe => "Fe",
            Element::Zn => "Zn",
            Element::Se => "Se",
            Element::Br => "Br",
            Element::I => "I",
        }
    }

    /// Single-bond covalent radius in Angstroms, used to derive equilibrium
    /// bond lengths.
    pub fn covalent_radius(&self) -> f64 {
        match self {
            Element::H => 0.37,
            Element::B => 0.82,
            Element::C => 0.77,
            Element::N => 0.75,
            Element::O => 0.73,
            Element::F => 0.71,
            Element::Na => 1.54,
            Element::Mg => 1.30,
            Element::Si => 1.11,
            Element::P => 1.06,
            Element::S => 1.02,
            Element::Cl => 0.99,
            Element::K => 1.96,
            Element::Ca => 1.74,
            Element::Fe => 1.25,
            Element::Zn => 1.31,
            Element::Se => 1.16,
            Element::Br => 1.14,
            Element::I => 1.33,
        }
    }

    /// Van der Waals radius in Angstroms, used for nonbonded repulsion.
    pub fn vdw_radius(&self) -> f64 {
        match self {
            Element::H => 1.20,
            Element::B => 1.92,
            Element::C => 1.70,
            Element::N => 1.55,
            Element::O => 1.52,
            Element::F => 1.47,
            Element::Na => 2.27,
            Element::Mg => 1.73,
            Element::Si => 2.10,
            Element::P => 1.80,
            Element::S => 1.80,
            Element::Cl => 1.75,
            Element::K => 2.75,
            Element::Ca => 2.31,
            Element::Fe => 2.04,
            Element::Zn => 2.10,
            Element::Se => 1.90,
            Element::Br => 1.85,
            Element::I => 1.98,
        }
    }

    /// Standard atomic mass in Daltons.
    pub fn mass(&self) -> f64 {
        match self {
            Element::H => 1.008,
            Element::B => 10.811,
            Element::C => 12.011,
            Element::N => 14.007,
            Element::O => 15.999,
            Element::F => 18.998,
            Element::Na => 22.990,
            Element::Mg => 24.305,
            Element::Si => 28.086,
            Element::P => 30.974,
            Element::S => 32.065,
            Element::Cl => 35.453,
            Element::K => 39.098,
            Element::Ca => 40.078,
            Element::Fe => 55.845,
            Element::Zn => 65.380,
            Element::Se => 78.971,
            Element::Br => 79.904,
            Element::I => 126.904,
        }
    }

    /// The maximum connection valence tolerated for a neutral atom of this
    /// element. Hypervalent states of P, S and Se are included; formal charge
    /// adjustments are applied by the validity check, not here.
    pub fn max_valence(&self) -> u8 {
        match self {
            Element::H | Element::F | Element::Cl | Element::Br | Element::I => 1,
            Element::Na | Element::K => 1,
            Element::O => 2,
            Element::Mg | Element::Ca | Element::Zn => 2,
            Element::B | Element::N => 3,
            Element::Fe => 3,
            Element::C | Element::Si => 4,
            Element::P => 5,
            Element::S | Element::Se => 6,
        }
    }

    /// Whether this element is hydrogen. Heavy-atom bookkeeping throughout
    /// the crate hinges on this predicate.
    pub fn is_hydrogen(&self) -> bool {
        matches!(self, Element::H)
    }

    /// Looks up an element by symbol, accepting any letter casing
    /// (file formats disagree on "CL" vs "Cl").
    pub fn from_symbol(symbol: &str) -> Result<Self, UnknownElementError> {
        let mut normalized = String::with_capacity(2);
        let mut chars = symbol.trim().chars();
        if let Some(first) = chars.next() {
            normalized.push(first.to_ascii_uppercase());
            normalized.extend(chars.map(|c| c.to_ascii_lowercase()));
        }
        SYMBOL_TABLE
            .get(normalized.as_str())
            .copied()
            .ok_or_else(|| UnknownElementError(symbol.trim().to_string()))
    }
}

impl FromStr for Element {
    type Err = UnknownElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Element::from_symbol(s)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_symbol_parses_standard_symbols() {
        assert_eq!(Element::from_symbol("C").unwrap(), Element::C);
        assert_eq!(Element::from_symbol("N").unwrap(), Element::N);
        assert_eq!(Element::from_symbol("Cl").unwrap(), Element::Cl);
        assert_eq!(Element::from_symbol("Br").unwrap(), Element::Br);
    }

    #[test]
    fn from_symbol_is_case_insensitive() {
        assert_eq!(Element::from_symbol("CL").unwrap(), Element::Cl);
        assert_eq!(Element::from_symbol("cl").unwrap(), Element::Cl);
        assert_eq!(Element::from_symbol("c").unwrap(), Element::C);
        assert_eq!(Element::from_symbol("NA").unwrap(), Element::Na);
    }

    #[test]
    fn from_symbol_trims_padding() {
        assert_eq!(Element::from_symbol(" O ").unwrap(), Element::O);
    }

    #[test]
    fn from_symbol_rejects_unknown_symbols() {
        assert!(Element::from_symbol("Xx").is_err());
        assert!(Element::from_symbol("").is_err());
        assert_eq!(
            Element::from_symbol("Uup").unwrap_err(),
            UnknownElementError("Uup".to_string())
        );
    }

    #[test]
    fn atomic_numbers_match_the_periodic_table() {
        assert_eq!(Element::H.atomic_number(), 1);
        assert_eq!(Element::C.atomic_number(), 6);
        assert_eq!(Element::N.atomic_number(), 7);
        assert_eq!(Element::O.atomic_number(), 8);
        assert_eq!(Element::I.atomic_number(), 53);
    }

    #[test]
    fn max_valence_covers_common_organics() {
        assert_eq!(Element::H.max_valence(), 1);
        assert_eq!(Element::C.max_valence(), 4);
        assert_eq!(Element::N.max_valence(), 3);
        assert_eq!(Element::O.max_valence(), 2);
        assert_eq!(Element::S.max_valence(), 6);
    }

    #[test]
    fn only_hydrogen_is_hydrogen() {
        assert!(Element::H.is_hydrogen());
        assert!(!Element::C.is_hydrogen());
        assert!(!Element::Na.is_hydrogen());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for el in [Element::C, Element::Cl, Element::Fe, Element::H] {
            assert_eq!(el.to_string().parse::<Element>().unwrap(), el);
        }
    }
}
