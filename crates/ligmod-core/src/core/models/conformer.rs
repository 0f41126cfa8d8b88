use nalgebra::Point3;

/// A single 3D conformation of a molecule: one coordinate per atom, in
/// atom-list order. The owning molecule guarantees the length matches its
/// atom count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Conformer {
    positions: Vec<Point3<f64>>,
}

impl Conformer {
    pub fn new(positions: Vec<Point3<f64>>) -> Self {
        Self { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, index: usize) -> Option<&Point3<f64>> {
        self.positions.get(index)
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn set_position(&mut self, index: usize, position: Point3<f64>) -> bool {
        match self.positions.get_mut(index) {
            Some(slot) => {
                *slot = position;
                true
            }
            None => false,
        }
    }

    pub(crate) fn push(&mut self, position: Point3<f64>) {
        self.positions.push(position);
    }

    pub(crate) fn retain_indices(&mut self, keep: &[bool]) {
        let mut index = 0;
        self.positions.retain(|_| {
            let kept = keep[index];
            index += 1;
            kept
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_lookup_is_index_based() {
        let conformer = Conformer::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
        ]);
        assert_eq!(conformer.len(), 2);
        assert_eq!(conformer.position(1), Some(&Point3::new(1.5, 0.0, 0.0)));
        assert_eq!(conformer.position(2), None);
    }

    #[test]
    fn set_position_rejects_out_of_range_indices() {
        let mut conformer = Conformer::new(vec![Point3::origin()]);
        assert!(conformer.set_position(0, Point3::new(1.0, 2.0, 3.0)));
        assert!(!conformer.set_position(5, Point3::origin()));
        assert_eq!(conformer.position(0), Some(&Point3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn retain_indices_compacts_positions() {
        let mut conformer = Conformer::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ]);
        conformer.retain_indices(&[true, false, true]);
        assert_eq!(conformer.len(), 2);
        assert_eq!(conformer.position(1), Some(&Point3::new(2.0, 0.0, 0.0)));
    }
}
