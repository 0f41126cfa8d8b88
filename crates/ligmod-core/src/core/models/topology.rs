use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl Default for BondOrder {
    fn default() -> Self {
        BondOrder::Single
    }
}

impl BondOrder {
    /// Contribution of one bond of this order to an atom's valence.
    /// Aromatic bonds contribute 1.5 so that a two-bond ring atom sums
    /// to the Kekulé value of 3.
    pub fn valence_contribution(&self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }

    /// The numeric bond type used by the MDL ctab bond block.
    pub fn sdf_code(&self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 4,
        }
    }

    /// Inverse of [`BondOrder::sdf_code`].
    pub fn from_sdf_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(BondOrder::Single),
            2 => Some(BondOrder::Double),
            3 => Some(BondOrder::Triple),
            4 => Some(BondOrder::Aromatic),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "4" | "ar" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Aromatic => "Aromatic",
            }
        )
    }
}

/// A bond between two atoms, addressed by their zero-based indices in the
/// molecule's atom list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(atom1: usize, atom2: usize, order: BondOrder) -> Self {
        Self {
            atom1,
            atom2,
            order,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.atom1 == index || self.atom2 == index
    }

    /// Returns the bonded partner of `index`, or `None` if the bond does
    /// not involve that atom.
    pub fn other(&self, index: usize) -> Option<usize> {
        if self.atom1 == index {
            Some(self.atom2)
        } else if self.atom2 == index {
            Some(self.atom1)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bond_order_from_str_parses_valid_strings() {
        assert_eq!("1".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("single".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("S".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("2".parse::<BondOrder>().unwrap(), BondOrder::Double);
        assert_eq!("D".parse::<BondOrder>().unwrap(), BondOrder::Double);
        assert_eq!("3".parse::<BondOrder>().unwrap(), BondOrder::Triple);
        assert_eq!("ar".parse::<BondOrder>().unwrap(), BondOrder::Aromatic);
        assert_eq!("4".parse::<BondOrder>().unwrap(), BondOrder::Aromatic);
    }

    #[test]
    fn bond_order_from_str_rejects_invalid_strings() {
        assert!("".parse::<BondOrder>().is_err());
        assert!("quadruple".parse::<BondOrder>().is_err());
        assert!("0".parse::<BondOrder>().is_err());
    }

    #[test]
    fn bond_order_default_is_single() {
        assert_eq!(BondOrder::default(), BondOrder::Single);
    }

    #[test]
    fn sdf_codes_round_trip() {
        for order in [
            BondOrder::Single,
            BondOrder::Double,
            BondOrder::Triple,
            BondOrder::Aromatic,
        ] {
            assert_eq!(BondOrder::from_sdf_code(order.sdf_code()), Some(order));
        }
        assert_eq!(BondOrder::from_sdf_code(0), None);
        assert_eq!(BondOrder::from_sdf_code(9), None);
    }

    #[test]
    fn valence_contributions_match_bond_orders() {
        assert_eq!(BondOrder::Single.valence_contribution(), 1.0);
        assert_eq!(BondOrder::Double.valence_contribution(), 2.0);
        assert_eq!(BondOrder::Triple.valence_contribution(), 3.0);
        assert_eq!(BondOrder::Aromatic.valence_contribution(), 1.5);
    }

    #[test]
    fn bond_contains_returns_true_for_both_endpoints() {
        let bond = Bond::new(3, 7, BondOrder::Single);
        assert!(bond.contains(3));
        assert!(bond.contains(7));
        assert!(!bond.contains(5));
    }

    #[test]
    fn bond_other_returns_the_partner_index() {
        let bond = Bond::new(3, 7, BondOrder::Double);
        assert_eq!(bond.other(3), Some(7));
        assert_eq!(bond.other(7), Some(3));
        assert_eq!(bond.other(1), None);
    }
}
