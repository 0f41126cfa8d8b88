use crate::core::io::traits::ChemicalFile;
use crate::core::models::atom::Atom;
use crate::core::models::conformer::Conformer;
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// One `>  <NAME>` data item trailing an SDF record. The header line is
/// kept verbatim; the value may span multiple lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdfDataItem {
    pub header: String,
    pub value: String,
}

/// Side-band content of an SDF record that is not part of the structure
/// graph, preserved for round-tripping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdfMetadata {
    pub title: String,
    pub program_line: String,
    pub comment: String,
    /// Ctab property lines other than `M  CHG`/`M  END`, written back verbatim.
    pub extra_ctab_lines: Vec<String>,
    pub data_items: Vec<SdfDataItem>,
}

impl Default for SdfMetadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            program_line: "  ligmod            3D".to_string(),
            comment: String::new(),
            extra_ctab_lines: Vec::new(),
            data_items: Vec::new(),
        }
    }
}

impl SdfMetadata {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum SdfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: SdfParseErrorKind,
    },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum SdfParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Line is too short for its record type")]
    LineTooShort,
    #[error("Unknown element symbol '{symbol}'")]
    UnknownElement { symbol: String },
    #[error("Invalid bond type '{value}'")]
    InvalidBondType { value: String },
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_usize(line: &str, line_num: usize, start: usize, end: usize) -> Result<usize, SdfError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| SdfError::Parse {
        line: line_num,
        kind: SdfParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_f64(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, SdfError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| SdfError::Parse {
        line: line_num,
        kind: SdfParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

/// MDL molfile / SD file (V2000), the ligand interchange format of the
/// pipeline. A single structure record per file is supported; data items
/// after `M  END` are carried through untouched.
pub struct SdfFile;

impl ChemicalFile for SdfFile {
    type Metadata = SdfMetadata;
    type Error = SdfError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Molecule, Self::Metadata), Self::Error> {
        let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
        if lines.len() < 4 {
            return Err(SdfError::MissingRecord("molfile header".into()));
        }

        let mut metadata = SdfMetadata {
            title: lines[0].trim_end().to_string(),
            program_line: lines[1].trim_end().to_string(),
            comment: lines[2].trim_end().to_string(),
            extra_ctab_lines: Vec::new(),
            data_items: Vec::new(),
        };

        let counts_line = &lines[3];
        if counts_line.len() < 6 {
            return Err(SdfError::Parse {
                line: 4,
                kind: SdfParseErrorKind::LineTooShort,
            });
        }
        let atom_count = parse_usize(counts_line, 4, 0, 3)?;
        let bond_count = parse_usize(counts_line, 4, 3, 6)?;

        let atoms_end = 4 + atom_count;
        let bonds_end = atoms_end + bond_count;
        if lines.len() < bonds_end {
            return Err(SdfError::MissingRecord(format!(
                "{} atom and {} bond lines",
                atom_count, bond_count
            )));
        }

        let mut molecule = Molecule::new();
        let mut positions = Vec::with_capacity(atom_count);

        for (offset, line) in lines[4..atoms_end].iter().enumerate() {
            let line_num = 5 + offset;
            if line.len() < 34 {
                return Err(SdfError::Parse {
                    line: line_num,
                    kind: SdfParseErrorKind::LineTooShort,
                });
            }
            let x = parse_f64(line, line_num, 0, 10)?;
            let y = parse_f64(line, line_num, 10, 20)?;
            let z = parse_f64(line, line_num, 20, 30)?;
            let symbol = slice_and_trim(line, 31, 34);
            let element = Element::from_symbol(symbol).map_err(|e| SdfError::Parse {
                line: line_num,
                kind: SdfParseErrorKind::UnknownElement { symbol: e.0 },
            })?;
            molecule.add_atom(Atom::new(element));
            positions.push(Point3::new(x, y, z));
        }

        for (offset, line) in lines[atoms_end..bonds_end].iter().enumerate() {
            let line_num = atoms_end + offset + 1;
            let atom1 = parse_usize(line, line_num, 0, 3)?;
            let atom2 = parse_usize(line, line_num, 3, 6)?;
            let type_str = slice_and_trim(line, 6, 9);
            let code: u8 = type_str.parse().map_err(|_| SdfError::Parse {
                line: line_num,
                kind: SdfParseErrorKind::InvalidBondType {
                    value: type_str.into(),
                },
            })?;
            let order = BondOrder::from_sdf_code(code).ok_or(SdfError::Parse {
                line: line_num,
                kind: SdfParseErrorKind::InvalidBondType {
                    value: type_str.into(),
                },
            })?;
            if atom1 == 0 || atom2 == 0 || atom1 > atom_count || atom2 > atom_count {
                return Err(SdfError::Inconsistency(format!(
                    "bond on line {} references atom outside 1..={}",
                    line_num, atom_count
                )));
            }
            molecule
                .add_bond(atom1 - 1, atom2 - 1, order)
                .map_err(|e| SdfError::Inconsistency(e.to_string()))?;
        }

        let mut cursor = bonds_end;
        let mut saw_end = false;
        while cursor < lines.len() {
            let line = &lines[cursor];
            cursor += 1;
            if line.starts_with("M  END") {
                saw_end = true;
                break;
            }
            if line.starts_with("M  CHG") {
                apply_charge_line(&mut molecule, line, cursor)?;
            } else if !line.trim().is_empty() {
                metadata.extra_ctab_lines.push(line.clone());
            }
        }
        if !saw_end {
            return Err(SdfError::MissingRecord("M  END".into()));
        }

        while cursor < lines.len() {
            let line = &lines[cursor];
            cursor += 1;
            if line.starts_with("$$$$") {
                break;
            }
            if line.starts_with('>') {
                let header = line.trim_end().to_string();
                let mut value_lines = Vec::new();
                while cursor < lines.len() {
                    let value_line = &lines[cursor];
                    if value_line.trim().is_empty() || value_line.starts_with("$$$$") {
                        break;
                    }
                    value_lines.push(value_line.trim_end().to_string());
                    cursor += 1;
                }
                metadata.data_items.push(SdfDataItem {
                    header,
                    value: value_lines.join("\n"),
                });
            }
        }

        molecule
            .set_conformer(Conformer::new(positions))
            .map_err(|e| SdfError::Inconsistency(e.to_string()))?;
        Ok((molecule, metadata))
    }

    fn write_to(
        molecule: &Molecule,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let conformer = molecule.conformer().ok_or_else(|| {
            SdfError::Inconsistency("cannot serialize a molecule without a conformation".into())
        })?;

        writeln!(writer, "{}", metadata.title)?;
        writeln!(writer, "{}", metadata.program_line)?;
        writeln!(writer, "{}", metadata.comment)?;
        writeln!(
            writer,
            "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
            molecule.atom_count(),
            molecule.bond_count()
        )?;

        for (index, atom) in molecule.atoms().iter().enumerate() {
            let position = conformer.position(index).expect("conformer covers atoms");
            writeln!(
                writer,
                "{:>10.4}{:>10.4}{:>10.4} {:<3} 0  0  0  0  0  0  0  0  0  0  0  0",
                position.x,
                position.y,
                position.z,
                atom.element.symbol()
            )?;
        }

        for bond in molecule.bonds() {
            writeln!(
                writer,
                "{:>3}{:>3}{:>3}  0",
                bond.atom1 + 1,
                bond.atom2 + 1,
                bond.order.sdf_code()
            )?;
        }

        let charged: Vec<(usize, i8)> = molecule
            .atoms()
            .iter()
            .enumerate()
            .filter(|(_, a)| a.formal_charge != 0)
            .map(|(i, a)| (i, a.formal_charge))
            .collect();
        // M CHG lines hold at most eight (atom, charge) pairs each.
        for chunk in charged.chunks(8) {
            write!(writer, "M  CHG{:>3}", chunk.len())?;
            for (index, charge) in chunk {
                write!(writer, "{:>4}{:>4}", index + 1, charge)?;
            }
            writeln!(writer)?;
        }

        for line in &metadata.extra_ctab_lines {
            writeln!(writer, "{}", line)?;
        }
        writeln!(writer, "M  END")?;

        for item in &metadata.data_items {
            writeln!(writer, "{}", item.header)?;
            writeln!(writer, "{}", item.value)?;
            writeln!(writer)?;
        }
        writeln!(writer, "$$$$")?;
        Ok(())
    }
}

fn apply_charge_line(
    molecule: &mut Molecule,
    line: &str,
    line_num: usize,
) -> Result<(), SdfError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    // "M CHG n idx chg idx chg ..."
    if parts.len() < 3 {
        return Err(SdfError::Parse {
            line: line_num,
            kind: SdfParseErrorKind::LineTooShort,
        });
    }
    for pair in parts[3..].chunks(2) {
        if pair.len() != 2 {
            return Err(SdfError::Inconsistency(format!(
                "odd charge list on line {}",
                line_num
            )));
        }
        let index: usize = pair[0].parse().map_err(|_| SdfError::Parse {
            line: line_num,
            kind: SdfParseErrorKind::InvalidInt {
                columns: "charge atom index".into(),
                value: pair[0].into(),
            },
        })?;
        let charge: i8 = pair[1].parse().map_err(|_| SdfError::Parse {
            line: line_num,
            kind: SdfParseErrorKind::InvalidInt {
                columns: "charge value".into(),
                value: pair[1].into(),
            },
        })?;
        if index == 0 || index > molecule.atom_count() {
            return Err(SdfError::Inconsistency(format!(
                "charge on line {} references atom {} outside 1..={}",
                line_num,
                index,
                molecule.atom_count()
            )));
        }
        molecule
            .set_formal_charge(index - 1, charge)
            .map_err(|e| SdfError::Inconsistency(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    const GLYCINE_ISH: &str = "\
glycine fragment
  ligmod            3D
test record
  6  4  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 N   0  0  0  0  0  0  0  0  0  0  0  0
    1.4500    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.0500    1.3700    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.4200    2.4100    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
    3.3200    1.4800    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
    4.5000    3.0000    0.0000 Na  0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  1  0
  3  4  2  0
  3  5  1  0
M  CHG  2   5  -1   6   1
M  END
>  <source>
unit test

$$$$
";

    fn parse(text: &str) -> (Molecule, SdfMetadata) {
        let mut reader = BufReader::new(text.as_bytes());
        SdfFile::read_from(&mut reader).unwrap()
    }

    #[test]
    fn parses_counts_atoms_and_bonds() {
        let (mol, meta) = parse(GLYCINE_ISH);
        assert_eq!(mol.atom_count(), 6);
        assert_eq!(mol.bond_count(), 4);
        assert_eq!(meta.title, "glycine fragment");
        assert_eq!(mol.atom(0).unwrap().element, Element::N);
        assert_eq!(mol.atom(5).unwrap().element, Element::Na);
        let bond = mol.bond_between(2, 3).unwrap();
        assert_eq!(bond.order, BondOrder::Double);
    }

    #[test]
    fn parses_coordinates_into_a_conformer() {
        let (mol, _) = parse(GLYCINE_ISH);
        let conformer = mol.conformer().unwrap();
        assert_eq!(conformer.len(), 6);
        assert_eq!(conformer.position(1), Some(&Point3::new(1.45, 0.0, 0.0)));
    }

    #[test]
    fn parses_charge_properties() {
        let (mol, _) = parse(GLYCINE_ISH);
        assert_eq!(mol.atom(4).unwrap().formal_charge, -1);
        assert_eq!(mol.atom(5).unwrap().formal_charge, 1);
        assert_eq!(mol.atom(0).unwrap().formal_charge, 0);
    }

    #[test]
    fn preserves_data_items() {
        let (_, meta) = parse(GLYCINE_ISH);
        assert_eq!(meta.data_items.len(), 1);
        assert_eq!(meta.data_items[0].header, ">  <source>");
        assert_eq!(meta.data_items[0].value, "unit test");
    }

    #[test]
    fn round_trip_preserves_structure_and_coordinates() {
        let (mol, meta) = parse(GLYCINE_ISH);
        let mut buffer = Vec::new();
        SdfFile::write_to(&mol, &meta, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let (mol2, meta2) = parse(&text);
        assert_eq!(mol, mol2);
        assert_eq!(meta, meta2);
    }

    #[test]
    fn missing_m_end_is_an_error() {
        let truncated: String = GLYCINE_ISH
            .lines()
            .take_while(|l| !l.starts_with("M  END"))
            .map(|l| format!("{}\n", l))
            .collect();
        let mut reader = BufReader::new(truncated.as_bytes());
        assert!(matches!(
            SdfFile::read_from(&mut reader),
            Err(SdfError::MissingRecord(_))
        ));
    }

    #[test]
    fn bad_coordinate_reports_its_line_number() {
        let broken = GLYCINE_ISH.replace("    1.4500", "    xx.450");
        let mut reader = BufReader::new(broken.as_bytes());
        match SdfFile::read_from(&mut reader) {
            Err(SdfError::Parse { line, kind }) => {
                assert_eq!(line, 6);
                assert!(matches!(kind, SdfParseErrorKind::InvalidFloat { .. }));
            }
            other => panic!("expected a parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn unknown_element_is_rejected() {
        let broken = GLYCINE_ISH.replace(" Na ", " Xx ");
        let mut reader = BufReader::new(broken.as_bytes());
        assert!(matches!(
            SdfFile::read_from(&mut reader),
            Err(SdfError::Parse {
                kind: SdfParseErrorKind::UnknownElement { .. },
                ..
            })
        ));
    }

    #[test]
    fn bond_referencing_a_missing_atom_is_rejected() {
        let broken = GLYCINE_ISH.replace("  1  2  1  0", "  1  9  1  0");
        let mut reader = BufReader::new(broken.as_bytes());
        assert!(matches!(
            SdfFile::read_from(&mut reader),
            Err(SdfError::Inconsistency(_))
        ));
    }

    #[test]
    fn writing_without_a_conformer_is_rejected() {
        let mut mol = Molecule::new();
        mol.add_atom(Atom::new(Element::C));
        let mut buffer = Vec::new();
        assert!(matches!(
            SdfFile::write_to(&mol, &SdfMetadata::default(), &mut buffer),
            Err(SdfError::Inconsistency(_))
        ));
    }

    #[test]
    fn truncated_atom_block_is_an_error() {
        let mut text: Vec<&str> = GLYCINE_ISH.lines().collect();
        text.truncate(7);
        let joined = text.join("\n");
        let mut reader = BufReader::new(joined.as_bytes());
        assert!(matches!(
            SdfFile::read_from(&mut reader),
            Err(SdfError::MissingRecord(_))
        ));
    }
}
